use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_TITLE: &str = "NEED A TITLE";
pub const DEFAULT_FONT_SIZE: f32 = 96.0;
pub const DEFAULT_FONT_COLOR: &str = "#FFFFFF";

pub const TEXT_WIDTH_RATIO: f32 = 0.9;
pub const LINE_HEIGHT_RATIO: f32 = 1.1;
pub const TITLE_ALPHA: f32 = 1.0;
pub const SUBTITLE_ALPHA: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Wide,
    Standard,
    Square,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Wide, Shape::Standard, Shape::Square];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|shape| shape.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Wide => "16:9",
            Shape::Standard => "4:3",
            Shape::Square => "1:1",
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Shape::Wide => (960, 540),
            Shape::Standard => (720, 540),
            Shape::Square => (540, 540),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Blob,
    Wave,
    BlurryGradient,
    BlobScene,
    LayeredWaves,
    LayeredPeaks,
}

impl Style {
    pub const ALL: [Style; 6] = [
        Style::Blob,
        Style::Wave,
        Style::BlurryGradient,
        Style::BlobScene,
        Style::LayeredWaves,
        Style::LayeredPeaks,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Style::Blob => "blob",
            Style::Wave => "wave",
            Style::BlurryGradient => "blurry-gradient",
            Style::BlobScene => "blob-scene",
            Style::LayeredWaves => "layered-waves",
            Style::LayeredPeaks => "layered-peaks",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HeroError {
    #[error("Invalid font color: {0}")]
    InvalidFontColor(String),
    #[error("Invalid headline font size: {0}")]
    InvalidFontSize(String),
    #[error("Invalid subtitle font size: {0}")]
    InvalidSubFontSize(String),
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

/// Request parameters exactly as received; every field is optional and an
/// empty string counts as missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroQuery {
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub style: Option<String>,
    pub shape: Option<String>,
    pub font_size: Option<String>,
    pub sub_font_size: Option<String>,
    pub font_color: Option<String>,
}

/// Fallbacks applied to missing request parameters.
#[derive(Debug, Clone)]
pub struct HeroDefaults {
    pub title: String,
    pub style: Style,
    pub shape: Shape,
    pub font_color: String,
}

impl Default for HeroDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            style: Style::BlurryGradient,
            shape: Shape::Wide,
            font_color: DEFAULT_FONT_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeroParams {
    pub title: String,
    pub subtitle: Option<String>,
    pub style: Style,
    pub shape: Shape,
    pub font_size: f32,
    pub sub_font_size: f32,
    pub font_color: String,
}

impl HeroQuery {
    pub fn resolve(&self, defaults: &HeroDefaults) -> Result<HeroParams, HeroError> {
        let title = non_empty(&self.title).unwrap_or(defaults.title.as_str()).to_string();
        let subtitle = non_empty(&self.sub_title).map(str::to_string);

        let font_color = non_empty(&self.font_color)
            .unwrap_or(defaults.font_color.as_str())
            .to_string();
        if !is_hex_color(&font_color) {
            return Err(HeroError::InvalidFontColor(font_color));
        }

        let font_size = match non_empty(&self.font_size) {
            Some(raw) => {
                parse_font_size(raw).ok_or_else(|| HeroError::InvalidFontSize(raw.to_string()))?
            }
            None => DEFAULT_FONT_SIZE,
        };
        let sub_font_size = match non_empty(&self.sub_font_size) {
            Some(raw) => parse_font_size(raw)
                .ok_or_else(|| HeroError::InvalidSubFontSize(raw.to_string()))?,
            None => font_size / 2.0,
        };

        let shape = match non_empty(&self.shape) {
            Some(raw) => {
                Shape::parse(raw).ok_or_else(|| HeroError::InvalidShape(raw.to_string()))?
            }
            None => defaults.shape,
        };

        let style = match non_empty(&self.style) {
            Some(raw) => Style::parse(raw).unwrap_or_else(|| {
                warn!(
                    "invalid style '{}', falling back to {}",
                    raw,
                    Style::BlurryGradient.as_str()
                );
                Style::BlurryGradient
            }),
            None => defaults.style,
        };

        Ok(HeroParams {
            title,
            subtitle,
            style,
            shape,
            font_size,
            sub_font_size,
            font_color,
        })
    }
}

impl HeroParams {
    pub fn width(&self) -> u32 {
        self.shape.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.shape.dimensions().1
    }

    pub fn max_text_width(&self) -> f32 {
        self.width() as f32 * TEXT_WIDTH_RATIO
    }

    pub fn title_line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_RATIO
    }

    pub fn subtitle_line_height(&self) -> f32 {
        self.sub_font_size * LINE_HEIGHT_RATIO
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn parse_font_size(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|size| size.is_finite() && *size >= 0.0)
}

pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.chars().all(|ch| ch.is_ascii_hexdigit()),
        None => false,
    }
}
