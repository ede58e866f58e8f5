use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

use crate::text::MeasureText;

pub const DEFAULT_FALLBACK_FONTS: &[&str] = &[
    "sans-serif",
    "Noto Sans CJK JP",
    "Noto Sans JP",
    "Hiragino Sans",
    "Yu Gothic",
    "DejaVu Sans",
    "Arial",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

impl FontWeight {
    pub fn as_css(self) -> &'static str {
        match self {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        }
    }

    fn to_fontdb(self) -> fontdb::Weight {
        match self {
            FontWeight::Normal => fontdb::Weight::NORMAL,
            FontWeight::Bold => fontdb::Weight::BOLD,
        }
    }
}

#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
    face_index: u32,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl std::fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetrics")
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

pub fn load_font_metrics(path: &Path) -> Result<FontMetrics> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read font: {}", path.display()))?;
    load_font_metrics_from_data(Arc::new(data), 0)
        .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
}

/// A font bound to the family name the renderer should ask for, plus the
/// faces consulted for characters it has no glyph for.
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub metrics: Option<FontMetrics>,
    pub family: String,
    pub fallbacks: Vec<FontMetrics>,
}

impl ResolvedFont {
    /// Placeholder used when no font could be found; widths are estimated.
    pub fn estimated() -> Self {
        Self {
            metrics: None,
            family: "sans-serif".to_string(),
            fallbacks: Vec::new(),
        }
    }

    pub fn measurer(&self, font_size: f32) -> FontMeasurer<'_> {
        FontMeasurer {
            metrics: self.metrics.as_ref(),
            fallbacks: &self.fallbacks,
            font_size,
        }
    }
}

/// Fonts shared by every render: one face per block plus the database the
/// rasterizer resolves `font-family` against.
#[derive(Clone)]
pub struct HeroFonts {
    pub title: ResolvedFont,
    pub subtitle: ResolvedFont,
    pub database: Arc<fontdb::Database>,
}

impl HeroFonts {
    /// Fonts without any face loaded. Text is measured with estimates and
    /// nothing is drawn for it.
    pub fn estimated() -> Self {
        Self {
            title: ResolvedFont::estimated(),
            subtitle: ResolvedFont::estimated(),
            database: Arc::new(fontdb::Database::new()),
        }
    }
}

pub fn load_hero_fonts(
    font_path: Option<&Path>,
    font_family: Option<&str>,
    fallback: &[String],
) -> Result<HeroFonts> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    if let Some(path) = font_path {
        let metrics = load_font_metrics(path)?;
        db.load_font_data(metrics.data().to_vec());
        let family = metrics
            .family()
            .map(|name| name.to_string())
            .or_else(|| font_family.map(|name| name.to_string()))
            .unwrap_or_else(|| "sans-serif".to_string());
        info!("using font file {} ({})", path.display(), family);
        let title = ResolvedFont {
            metrics: Some(metrics.clone()),
            family: family.clone(),
            fallbacks: candidate_faces(&db, None, fallback, FontWeight::Bold),
        };
        let subtitle = ResolvedFont {
            metrics: Some(metrics),
            family,
            fallbacks: candidate_faces(&db, None, fallback, FontWeight::Normal),
        };
        return Ok(HeroFonts {
            title,
            subtitle,
            database: Arc::new(db),
        });
    }

    let title = resolve_font(&db, font_family, fallback, FontWeight::Bold);
    let subtitle = resolve_font(&db, font_family, fallback, FontWeight::Normal);
    Ok(HeroFonts {
        title,
        subtitle,
        database: Arc::new(db),
    })
}

fn resolve_font(
    db: &fontdb::Database,
    font_family: Option<&str>,
    fallback: &[String],
    weight: FontWeight,
) -> ResolvedFont {
    let mut faces = candidate_faces(db, font_family, fallback, weight).into_iter();
    let Some(primary) = faces.next() else {
        warn!(
            "no {} font available; text widths will be estimated",
            weight.as_css()
        );
        return ResolvedFont::estimated();
    };
    let family = primary
        .family()
        .map(|name| name.to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    let fallbacks: Vec<FontMetrics> = faces.collect();
    info!(
        "resolved {} font '{}' with {} fallback face(s)",
        weight.as_css(),
        family,
        fallbacks.len()
    );
    ResolvedFont {
        metrics: Some(primary),
        family,
        fallbacks,
    }
}

/// Every distinct face the candidate families resolve to, in preference order.
fn candidate_faces(
    db: &fontdb::Database,
    font_family: Option<&str>,
    fallback: &[String],
    weight: FontWeight,
) -> Vec<FontMetrics> {
    let candidates = font_family
        .into_iter()
        .chain(fallback.iter().map(String::as_str))
        .chain(DEFAULT_FALLBACK_FONTS.iter().copied());
    let mut seen = Vec::new();
    let mut faces = Vec::new();
    for candidate in candidates {
        match query_face(db, candidate, weight) {
            Ok((id, metrics)) => {
                if seen.contains(&id) {
                    continue;
                }
                debug!(
                    "font candidate '{}' resolved to {:?}",
                    candidate,
                    metrics.family()
                );
                seen.push(id);
                faces.push(metrics);
            }
            Err(err) => debug!("{}", err),
        }
    }
    faces
}

fn query_face(
    db: &fontdb::Database,
    family: &str,
    weight: FontWeight,
) -> Result<(fontdb::ID, FontMetrics)> {
    let is_sans =
        family.eq_ignore_ascii_case("sans-serif") || family.eq_ignore_ascii_case("sans serif");
    let families = if is_sans {
        vec![fontdb::Family::SansSerif]
    } else {
        vec![fontdb::Family::Name(family)]
    };
    let query = fontdb::Query {
        families: &families,
        weight: weight.to_fontdb(),
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let (data, face_index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    let metrics = load_font_metrics_from_data(Arc::new(data), face_index)?;
    Ok((id, metrics))
}

fn load_font_metrics_from_data(data: Arc<Vec<u8>>, face_index: u32) -> Result<FontMetrics> {
    let face = Face::parse(&data, face_index)
        .map_err(|err| anyhow!("failed to parse font data: {}", err))?;
    let family = extract_family_name(&face);
    let units_per_em = face.units_per_em().max(1);
    let space_advance = face
        .glyph_index(' ')
        .and_then(|id| face.glyph_hor_advance(id))
        .unwrap_or(units_per_em / 2);
    Ok(FontMetrics {
        data,
        units_per_em,
        space_advance,
        family,
        face_index,
    })
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

/// Measures text at a fixed size with one font face, borrowing glyphs from
/// the fallback faces the way the rasterizer does.
#[derive(Debug, Clone, Copy)]
pub struct FontMeasurer<'a> {
    metrics: Option<&'a FontMetrics>,
    fallbacks: &'a [FontMetrics],
    font_size: f32,
}

impl MeasureText for FontMeasurer<'_> {
    fn measure(&self, text: &str) -> f32 {
        measure_with_fallbacks(text, self.font_size, self.metrics, self.fallbacks)
    }
}

pub fn measure_text_width_px(text: &str, font_size: f32, font: Option<&FontMetrics>) -> f32 {
    measure_with_fallbacks(text, font_size, font, &[])
}

fn measure_with_fallbacks(
    text: &str,
    font_size: f32,
    font: Option<&FontMetrics>,
    fallbacks: &[FontMetrics],
) -> f32 {
    let Some(font) = font else {
        return estimate_text_width_units(text) * font_size;
    };
    let Ok(face) = Face::parse(&font.data, font.face_index) else {
        return estimate_text_width_units(text) * font_size;
    };
    let units = font.units_per_em.max(1) as f32;
    let space_em = font.space_advance as f32 / units;
    let extra: Vec<(Face<'_>, f32)> = fallbacks
        .iter()
        .filter_map(|metrics| {
            Face::parse(&metrics.data, metrics.face_index)
                .ok()
                .map(|face| (face, metrics.units_per_em.max(1) as f32))
        })
        .collect();
    let em = sum_advances_em(text, |ch| {
        if ch == ' ' {
            return Some(space_em);
        }
        glyph_advance_em(&face, units, ch).or_else(|| {
            extra
                .iter()
                .find_map(|(face, units)| glyph_advance_em(face, *units, ch))
        })
    });
    em * font_size
}

fn glyph_advance_em(face: &Face<'_>, units_per_em: f32, ch: char) -> Option<f32> {
    face.glyph_index(ch)
        .and_then(|glyph| face.glyph_hor_advance(glyph))
        .map(|advance| advance as f32 / units_per_em)
}

/// Sums per-character advances in em. Characters no face covers are charged
/// the estimated width so CJK text keeps a full em per glyph.
fn sum_advances_em(text: &str, advance_em: impl Fn(char) -> Option<f32>) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(|ch| advance_em(ch).unwrap_or_else(|| estimate_char_units_for_width(ch)))
        .sum()
}

fn estimate_char_units_for_width(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_alphanumeric() {
        0.55
    } else if ch.is_ascii() {
        0.35
    } else if matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF | 0xAC00..=0xD7AF
    ) {
        1.0
    } else {
        0.9
    }
}

fn estimate_text_width_units(text: &str) -> f32 {
    text.chars().map(estimate_char_units_for_width).sum()
}
