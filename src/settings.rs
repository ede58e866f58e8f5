use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::hero::{self, HeroDefaults, Shape, Style};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub font_path: Option<String>,
    pub font_family: Option<String>,
    pub fallback_fonts: Vec<String>,
    pub default_title: String,
    pub default_style: Style,
    pub default_shape: Shape,
    pub default_font_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            font_path: None,
            font_family: None,
            fallback_fonts: Vec::new(),
            default_title: hero::DEFAULT_TITLE.to_string(),
            default_style: Style::BlurryGradient,
            default_shape: Shape::Wide,
            default_font_color: hero::DEFAULT_FONT_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    render: Option<RenderSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    font_path: Option<String>,
    font_family: Option<String>,
    fallback_fonts: Option<Vec<String>>,
    default_title: Option<String>,
    default_style: Option<String>,
    default_shape: Option<String>,
    default_font_color: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    load_settings_from(&ordered_paths)
}

/// Builds settings from the embedded defaults, then merges each existing
/// file in `paths` in order. Missing files are skipped.
pub fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(host) = server.host {
                if !host.trim().is_empty() {
                    self.host = host;
                }
            }
            if let Some(port) = server.port {
                self.port = port;
            }
        }
        if let Some(render) = incoming.render {
            if let Some(path) = render.font_path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(family) = render.font_family {
                if !family.trim().is_empty() {
                    self.font_family = Some(family);
                }
            }
            if let Some(fonts) = render.fallback_fonts {
                self.fallback_fonts = fonts
                    .into_iter()
                    .filter(|name| !name.trim().is_empty())
                    .collect();
            }
            if let Some(title) = render.default_title {
                if !title.is_empty() {
                    self.default_title = title;
                }
            }
            if let Some(style) = render.default_style {
                match Style::parse(style.trim()) {
                    Some(style) => self.default_style = style,
                    None if style.trim().is_empty() => {}
                    None => warn!("ignoring unknown default_style '{}'", style),
                }
            }
            if let Some(shape) = render.default_shape {
                match Shape::parse(shape.trim()) {
                    Some(shape) => self.default_shape = shape,
                    None if shape.trim().is_empty() => {}
                    None => warn!("ignoring unknown default_shape '{}'", shape),
                }
            }
            if let Some(color) = render.default_font_color {
                if hero::is_hex_color(color.trim()) {
                    self.default_font_color = color.trim().to_string();
                } else if !color.trim().is_empty() {
                    warn!("ignoring invalid default_font_color '{}'", color);
                }
            }
        }
    }

    /// Overrides the listening port from a `PORT` style value.
    pub fn apply_port_override(&mut self, value: Option<&str>) -> Result<()> {
        let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(());
        };
        self.port = value
            .parse()
            .with_context(|| format!("invalid PORT value: {}", value))?;
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn hero_defaults(&self) -> HeroDefaults {
        HeroDefaults {
            title: self.default_title.clone(),
            style: self.default_style,
            shape: self.default_shape,
            font_color: self.default_font_color.clone(),
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".hero-image"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let settings = load_settings_from(&[]).expect("settings");
        assert_eq!(settings.listen_addr(), "0.0.0.0:3000");
        assert_eq!(settings.default_style, Style::BlurryGradient);
        assert_eq!(settings.default_shape, Shape::Wide);
        assert_eq!(settings.default_font_color, "#FFFFFF");
        assert_eq!(settings.default_title, "NEED A TITLE");
        assert!(settings.fallback_fonts.contains(&"sans-serif".to_string()));
        assert!(settings.font_path.is_none());
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("settings.toml");
        let second = dir.path().join("settings.local.toml");
        fs::write(
            &first,
            "[server]\nport = 8080\n[render]\ndefault_style = \"wave\"\nfont_family = \"Inter\"\n",
        )
        .expect("write");
        fs::write(
            &second,
            "[server]\nhost = \"127.0.0.1\"\n[render]\ndefault_shape = \"1:1\"\nfont_family = \"\"\n",
        )
        .expect("write");
        let missing = dir.path().join("missing.toml");

        let settings = load_settings_from(&[first, missing, second]).expect("settings");
        assert_eq!(settings.listen_addr(), "127.0.0.1:8080");
        assert_eq!(settings.default_style, Style::Wave);
        assert_eq!(settings.default_shape, Shape::Square);
        assert_eq!(settings.font_family.as_deref(), Some("Inter"));

        let defaults = settings.hero_defaults();
        assert_eq!(defaults.style, Style::Wave);
        assert_eq!(defaults.shape, Shape::Square);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "[render]\ndefault_style = \"plaid\"\ndefault_shape = \"2:1\"\ndefault_font_color = \"white\"\n",
        )
        .expect("write");
        let settings = load_settings_from(&[path]).expect("settings");
        assert_eq!(settings.default_style, Style::BlurryGradient);
        assert_eq!(settings.default_shape, Shape::Wide);
        assert_eq!(settings.default_font_color, "#FFFFFF");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[server\nport = ").expect("write");
        let err = load_settings_from(&[path]).unwrap_err();
        assert!(err.to_string().contains("failed to parse settings"));
    }

    #[test]
    fn port_override() {
        let mut settings = Settings::default();
        settings.apply_port_override(None).expect("none");
        assert_eq!(settings.port, 3000);
        settings.apply_port_override(Some(" 8081 ")).expect("port");
        assert_eq!(settings.port, 8081);
        assert!(settings.apply_port_override(Some("http")).is_err());
        assert_eq!(settings.port, 8081);
    }
}
