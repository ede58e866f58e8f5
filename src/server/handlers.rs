use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, header};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use crate::hero::HeroQuery;

use super::hero::{ServerError, render_request};
use super::models::ErrorResponse;
use super::state::ServerState;

const HELP_HTML: &str = include_str!("../assets/help.html");

pub async fn run_server(state: ServerState, addr: String) -> Result<()> {
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("server is running on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(help))
        .route("/health", get(health))
        .route("/hero", get(hero))
        .route("/hero-experemental", get(hero_experimental))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn help() -> Html<&'static str> {
    Html(HELP_HTML)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

async fn hero(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<HeroQuery>, QueryRejection>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let Query(query) = query.map_err(|rejection| {
        warn!("malformed hero query: {}", rejection.body_text());
        error_response(ServerError::bad_request(rejection.body_text()))
    })?;

    tokio::task::spawn_blocking(move || render_request(state.as_ref(), query))
        .await
        .map_err(|err| ServerError::internal(format!("server task failed: {}", err)))
        .and_then(|result| result)
        .map(|png| ([(header::CONTENT_TYPE, "image/png")], png))
        .map_err(error_response)
}

fn error_response(err: ServerError) -> (StatusCode, Json<ErrorResponse>) {
    (err.status, Json(ErrorResponse { error: err.message }))
}

async fn hero_experimental() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: "Access to the experimental endpoint is not authorized".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::HeroFonts;
    use crate::hero::HeroDefaults;
    use tower::ServiceExt;

    fn router() -> Router {
        build_router(Arc::new(ServerState {
            defaults: HeroDefaults::default(),
            fonts: HeroFonts::estimated(),
        }))
    }

    async fn get_uri(uri: &str) -> Response<Body> {
        router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec()
    }

    #[tokio::test]
    async fn serves_help_page() {
        let response = get_uri("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_bytes(response).await;
        assert!(String::from_utf8_lossy(&body).contains("/hero"));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = get_uri("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).expect("json");
        assert_eq!(value["status"], "ok");
    }

    #[tokio::test]
    async fn hero_returns_png() {
        let response = get_uri("/hero?title=Hello%20World&subTitle=Sub&shape=1:1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).expect("type"),
            "image/png"
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .expect("cors"),
            "*"
        );
        let body = body_bytes(response).await;
        let decoded = image::load_from_memory(&body).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (540, 540));
    }

    #[tokio::test]
    async fn hero_rejects_invalid_color() {
        let response = get_uri("/hero?fontColor=%23ZZZZZZ").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).expect("json");
        assert_eq!(value["error"], "Invalid font color: #ZZZZZZ");
    }

    #[tokio::test]
    async fn repeated_query_key_is_a_json_error() {
        let response = get_uri("/hero?title=a&title=b").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).expect("json");
        let message = value["error"].as_str().expect("message");
        assert!(message.contains("title"), "{message}");
    }

    #[tokio::test]
    async fn hero_rejects_invalid_font_size() {
        let response = get_uri("/hero?fontSize=big").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_style_still_renders() {
        let response = get_uri("/hero?style=unknown").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn experimental_endpoint_is_forbidden() {
        let response = get_uri("/hero-experemental").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn options_preflight_is_answered() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/hero")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
