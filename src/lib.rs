use anyhow::{Context, Result};
use std::path::Path;

pub mod font;
pub mod hero;
pub mod layout;
pub mod logging;
pub mod render;
pub mod server;
pub mod settings;
pub mod text;

pub use font::{HeroFonts, ResolvedFont};
pub use hero::{HeroError, HeroQuery, HeroParams, Shape, Style};
pub use layout::{BlockMetrics, Layout, layout_blocks};
pub use render::{RenderedHero, render_hero};
pub use text::{MeasureText, break_lines};

/// Resolves the fonts configured in `settings` against the system font set.
pub fn load_fonts(settings: &settings::Settings) -> Result<HeroFonts> {
    font::load_hero_fonts(
        settings.font_path.as_deref().map(Path::new),
        settings.font_family.as_deref(),
        &settings.fallback_fonts,
    )
    .with_context(|| "failed to load fonts")
}

pub async fn serve(settings: settings::Settings, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| settings.listen_addr());
    let fonts = tokio::task::spawn_blocking({
        let settings = settings.clone();
        move || load_fonts(&settings)
    })
    .await
    .with_context(|| "font loading task failed")??;
    let state = server::ServerState {
        defaults: settings.hero_defaults(),
        fonts,
    };
    server::run_server(state, addr).await
}

/// Renders one hero image to `output`, as PNG or as the composed SVG.
pub fn render_to_file(
    settings: &settings::Settings,
    query: &HeroQuery,
    output: &Path,
    as_svg: bool,
) -> Result<RenderedHero> {
    let params = query.resolve(&settings.hero_defaults())?;
    let fonts = load_fonts(settings)?;
    let rendered = render_hero(&params, &fonts)?;
    let bytes = if as_svg {
        rendered.svg.as_bytes()
    } else {
        rendered.png.as_slice()
    };
    std::fs::write(output, bytes)
        .with_context(|| format!("failed to write output: {}", output.display()))?;
    Ok(rendered)
}

/// Wraps `text` with the configured title or subtitle font.
pub fn wrap_with_fonts(
    fonts: &HeroFonts,
    text: &str,
    max_width: f32,
    font_size: f32,
    bold: bool,
) -> Vec<String> {
    let font = if bold { &fonts.title } else { &fonts.subtitle };
    break_lines(text, max_width, &font.measurer(font_size))
}
