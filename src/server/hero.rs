use axum::http::StatusCode;
use tracing::{error, info, warn};

use crate::hero::{HeroError, HeroQuery};
use crate::render::render_hero;

use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<HeroError> for ServerError {
    fn from(err: HeroError) -> Self {
        ServerError::bad_request(err.to_string())
    }
}

/// Validates the query and renders it to PNG bytes.
pub(crate) fn render_request(state: &ServerState, query: HeroQuery) -> Result<Vec<u8>, ServerError> {
    info!(
        title = ?query.title,
        sub_title = ?query.sub_title,
        style = ?query.style,
        shape = ?query.shape,
        font_size = ?query.font_size,
        sub_font_size = ?query.sub_font_size,
        font_color = ?query.font_color,
        "hero request"
    );

    let params = query.resolve(&state.defaults).map_err(|err| {
        warn!("rejected hero request: {}", err);
        ServerError::from(err)
    })?;

    let rendered = render_hero(&params, &state.fonts).map_err(|err| {
        error!("failed to render hero image: {:#}", err);
        ServerError::internal("Unexpected error")
    })?;
    info!(
        "rendered {}x{} hero ({} title line(s), {} subtitle line(s), {} bytes)",
        params.width(),
        params.height(),
        rendered.composed.title.as_ref().map_or(0, |block| block.lines.len()),
        rendered
            .composed
            .subtitle
            .as_ref()
            .map_or(0, |block| block.lines.len()),
        rendered.png.len()
    );
    Ok(rendered.png)
}
