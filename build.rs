use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Styles the request model accepts; each needs `<style>.svg` in the assets.
const STYLES: &[&str] = &[
    "blob",
    "wave",
    "blurry-gradient",
    "blob-scene",
    "layered-waves",
    "layered-peaks",
];

fn main() {
    let manifest_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is not set by cargo"),
    );
    let backgrounds_dir = manifest_dir.join("src").join("assets").join("backgrounds");
    println!("cargo:rerun-if-changed={}", backgrounds_dir.display());

    let mut arms = String::new();
    for style in STYLES {
        let path = backgrounds_dir.join(format!("{style}.svg"));
        println!("cargo:rerun-if-changed={}", path.display());
        let svg = fs::read_to_string(&path).unwrap_or_else(|err| {
            panic!("background for style '{style}' is missing at {}: {err}", path.display())
        });
        check_root_size(style, &svg);
        arms.push_str(&format!(
            "        \"{style}\" => Some(include_str!(concat!(env!(\"CARGO_MANIFEST_DIR\"), \"/src/assets/backgrounds/{style}.svg\"))),\n"
        ));
    }
    warn_unused(&backgrounds_dir);

    let generated = format!(
        "pub(crate) fn embedded_background(name: &str) -> Option<&'static str> {{\n    match name {{\n{arms}        _ => None,\n    }}\n}}\n"
    );
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is not set by cargo"));
    fs::write(out_dir.join("embedded_backgrounds.rs"), generated)
        .expect("failed to write embedded background index");
}

/// The renderer centre-crops by the root element's size, so both attributes
/// must be present as plain numbers.
fn check_root_size(style: &str, svg: &str) {
    let root = svg
        .find("<svg")
        .and_then(|start| svg[start..].find('>').map(|end| &svg[start..start + end]))
        .unwrap_or_else(|| panic!("background '{style}' has no <svg> root element"));
    for attr in ["width", "height"] {
        let needle = format!(" {attr}=\"");
        let value = root
            .find(&needle)
            .map(|at| &root[at + needle.len()..])
            .and_then(|tail| tail.split('"').next())
            .unwrap_or_else(|| panic!("background '{style}' has no {attr} attribute"));
        if value.parse::<f32>().map_or(true, |size| size <= 0.0) {
            panic!("background '{style}' has an unusable {attr}: {value}");
        }
    }
}

fn warn_unused(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let stem = path.file_stem().and_then(|value| value.to_str());
        if let Some(stem) = stem {
            if !STYLES.contains(&stem) {
                println!(
                    "cargo:warning=background {} matches no style and is not embedded",
                    path.display()
                );
            }
        }
    }
}
