use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use tracing::debug;
use usvg::{Options, Tree, fontdb};

use crate::font::{FontWeight, HeroFonts, ResolvedFont};
use crate::hero::{HeroParams, SUBTITLE_ALPHA, TITLE_ALPHA};
use crate::layout::{BlockMetrics, Layout, layout_blocks, line_y};
use crate::text::break_lines;

include!(concat!(env!("OUT_DIR"), "/embedded_backgrounds.rs"));

/// One wrapped block of text, painted with a single font and opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font_size: f32,
    pub line_height: f32,
    pub alpha: f32,
    pub weight: FontWeight,
    pub family: String,
}

impl TextBlock {
    fn metrics(block: Option<&TextBlock>) -> BlockMetrics {
        match block {
            Some(block) => BlockMetrics::new(block.lines.len(), block.line_height, true),
            None => BlockMetrics::absent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedHero {
    pub title: Option<TextBlock>,
    pub subtitle: Option<TextBlock>,
    pub layout: Layout,
}

pub struct RenderedHero {
    pub svg: String,
    pub png: Vec<u8>,
    pub composed: ComposedHero,
}

pub fn compose(params: &HeroParams, fonts: &HeroFonts) -> ComposedHero {
    let max_width = params.max_text_width();
    let title = Some(params.title.as_str())
        .filter(|text| !text.is_empty())
        .map(|text| {
            wrap_block(
                text,
                max_width,
                params.font_size,
                params.title_line_height(),
                TITLE_ALPHA,
                FontWeight::Bold,
                &fonts.title,
            )
        });
    let subtitle = params
        .subtitle
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(|text| {
            wrap_block(
                text,
                max_width,
                params.sub_font_size,
                params.subtitle_line_height(),
                SUBTITLE_ALPHA,
                FontWeight::Normal,
                &fonts.subtitle,
            )
        });
    let layout = layout_blocks(
        TextBlock::metrics(title.as_ref()),
        TextBlock::metrics(subtitle.as_ref()),
        params.height() as f32,
    );
    ComposedHero {
        title,
        subtitle,
        layout,
    }
}

fn wrap_block(
    text: &str,
    max_width: f32,
    font_size: f32,
    line_height: f32,
    alpha: f32,
    weight: FontWeight,
    font: &ResolvedFont,
) -> TextBlock {
    let lines = break_lines(text, max_width, &font.measurer(font_size));
    debug!(
        "wrapped {} text into {} line(s) at {}px",
        weight.as_css(),
        lines.len(),
        font_size
    );
    TextBlock {
        lines,
        font_size,
        line_height,
        alpha,
        weight,
        family: font.family.clone(),
    }
}

pub fn render_svg(params: &HeroParams, composed: &ComposedHero) -> Result<String> {
    let background = embedded_background(params.style.as_str())
        .ok_or_else(|| anyhow!("background not found: {}", params.style.as_str()))?;
    let (bg_width, bg_height) = svg_size(background)?;
    let data_uri = format!("data:image/svg+xml;base64,{}", BASE64.encode(background));

    let width = params.width() as f32;
    let height = params.height() as f32;
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    ));
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="{x}" y="{y}" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = data_uri,
        x = (width - bg_width) / 2.0,
        y = (height - bg_height) / 2.0,
        w = bg_width,
        h = bg_height
    ));

    if let Some(block) = &composed.title {
        push_text_block(&mut svg, block, composed.layout.title_start_y, width, &params.font_color);
    }
    if let Some(block) = &composed.subtitle {
        push_text_block(
            &mut svg,
            block,
            composed.layout.subtitle_start_y,
            width,
            &params.font_color,
        );
    }

    svg.push_str("</svg>");
    Ok(svg)
}

fn push_text_block(svg: &mut String, block: &TextBlock, start_y: f32, width: f32, color: &str) {
    let family = escape_xml(&block.family);
    for (idx, line) in block.lines.iter().enumerate() {
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" fill="{color}" fill-opacity="{alpha}" text-anchor="middle" xml:space="preserve">{text}</text>"#,
            x = width / 2.0,
            y = line_y(start_y, block.line_height, idx),
            family = family,
            size = block.font_size,
            weight = block.weight.as_css(),
            color = color,
            alpha = block.alpha,
            text = escape_xml(line)
        ));
    }
}

fn svg_size(svg: &str) -> Result<(f32, f32)> {
    let tree = Tree::from_str(svg, &Options::default())
        .with_context(|| "failed to parse background SVG")?;
    let size = tree.size();
    Ok((size.width(), size.height()))
}

pub fn render_png(svg: &str, fontdb: Arc<fontdb::Database>) -> Result<Vec<u8>> {
    let options = Options {
        fontdb,
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect::<Vec<u8>>();
    let image = image::RgbaImage::from_raw(size.width(), size.height(), rgba)
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .with_context(|| "failed to encode PNG")?;
    Ok(bytes)
}

pub fn render_hero(params: &HeroParams, fonts: &HeroFonts) -> Result<RenderedHero> {
    let composed = compose(params, fonts);
    let svg = render_svg(params, &composed)?;
    let png = render_png(&svg, fonts.database.clone())?;
    Ok(RenderedHero { svg, png, composed })
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
