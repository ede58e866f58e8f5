use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use hero_image::hero::HeroQuery;
use hero_image::{logging, settings};

#[derive(Parser, Debug)]
#[command(
    name = "hero-image",
    version,
    about = "Render hero images with wrapped titles"
)]
struct Cli {
    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen address (default: settings [server], PORT overrides the port)
        #[arg(short = 'a', long = "addr")]
        addr: Option<String>,
    },
    /// Render a single hero image to a file
    Render {
        /// Title text
        #[arg(short = 't', long = "title")]
        title: Option<String>,

        /// Subtitle text
        #[arg(short = 's', long = "sub-title")]
        sub_title: Option<String>,

        /// Background style (blob, wave, blurry-gradient, blob-scene, layered-waves, layered-peaks)
        #[arg(long = "style")]
        style: Option<String>,

        /// Canvas shape (16:9, 4:3, 1:1)
        #[arg(long = "shape")]
        shape: Option<String>,

        /// Title font size in pixels
        #[arg(long = "font-size")]
        font_size: Option<String>,

        /// Subtitle font size in pixels (default: half the title size)
        #[arg(long = "sub-font-size")]
        sub_font_size: Option<String>,

        /// Text color as #RRGGBB
        #[arg(long = "font-color")]
        font_color: Option<String>,

        /// Output file
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Write the composed SVG instead of a PNG
        #[arg(long = "svg")]
        svg: bool,
    },
    /// Print how a text wraps at a given width
    Wrap {
        /// Maximum line width in pixels
        #[arg(short = 'w', long = "max-width")]
        max_width: f32,

        /// Font size in pixels
        #[arg(long = "font-size", default_value_t = 96.0)]
        font_size: f32,

        /// Measure with the normal weight instead of bold
        #[arg(long = "normal")]
        normal: bool,

        /// Text to wrap
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let serving = matches!(cli.command, Command::Serve { .. });
    let level = if serving && !cli.verbose {
        Level::INFO
    } else {
        logging::cli_level(cli.verbose)
    };
    logging::init(level)?;

    let mut settings = settings::load_settings(cli.read_settings.as_deref())?;

    match cli.command {
        Command::Serve { addr } => {
            settings.apply_port_override(std::env::var("PORT").ok().as_deref())?;
            hero_image::serve(settings, addr).await
        }
        Command::Render {
            title,
            sub_title,
            style,
            shape,
            font_size,
            sub_font_size,
            font_color,
            output,
            svg,
        } => {
            let query = HeroQuery {
                title,
                sub_title,
                style,
                shape,
                font_size,
                sub_font_size,
                font_color,
            };
            let rendered = hero_image::render_to_file(&settings, &query, &output, svg)?;
            print_summary(&output, &rendered);
            Ok(())
        }
        Command::Wrap {
            max_width,
            font_size,
            normal,
            text,
        } => {
            let fonts = hero_image::load_fonts(&settings)?;
            for line in hero_image::wrap_with_fonts(&fonts, &text, max_width, font_size, !normal) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

fn print_summary(output: &Path, rendered: &hero_image::RenderedHero) {
    let title_lines = rendered
        .composed
        .title
        .as_ref()
        .map_or(0, |block| block.lines.len());
    let subtitle_lines = rendered
        .composed
        .subtitle
        .as_ref()
        .map_or(0, |block| block.lines.len());
    println!(
        "{} (title: {} line(s), subtitle: {} line(s))",
        output.display(),
        title_lines,
        subtitle_lines
    );
}
