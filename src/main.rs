use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use datemark::{Config, DatemarkError, run};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder containing the photos to stamp
    input_folder: PathBuf,

    /// TrueType/OpenType font for the timestamp text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads (1 = sequential, 0 = all cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Fixed font size in pixels instead of sizing to the photo
    #[arg(long)]
    font_size: Option<f32>,

    /// Fixed margin in pixels instead of sizing to the photo
    #[arg(long)]
    margin: Option<u32>,

    /// Skip the system font search and use the built-in font as fallback
    #[arg(long)]
    no_system_fonts: bool,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    match run(&cli.input_folder, &config) {
        Ok(report) => {
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            error!("Aborting: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, DatemarkError> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load_from_file(path)?;
            info!("Configuration loaded from: {:?}", path);
            config
        }
        None => Config::default(),
    };

    // Command line flags win over the config file
    if let Some(font) = &cli.font {
        config.watermark.font_path = Some(font.clone());
    }
    if let Some(jobs) = cli.jobs {
        config.processing.jobs = jobs;
    }
    if let Some(font_size) = cli.font_size {
        config.watermark.font_size = Some(font_size);
    }
    if let Some(margin) = cli.margin {
        config.watermark.margin = Some(margin);
    }
    if cli.no_system_fonts {
        config.watermark.system_fonts = false;
    }

    Ok(config)
}
