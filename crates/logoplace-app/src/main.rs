//! Main application entry point.

use clap::Parser;
use logoplace_app::{AppError, load_script, load_settings, run_script};
use logoplace_core::Settings;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "logoplace", version, about = "Replay a logo configuration script")]
struct Cli {
    /// Script to replay (JSON).
    script: PathBuf,
    /// Engine settings (JSON); defaults apply to omitted fields.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Log gesture and history details.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
    log::info!("Starting LogoPlace");

    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let script = load_script(&cli.script)?;
    let base_dir = cli.script.parent().unwrap_or(Path::new("."));

    let report = run_script(&script, settings, base_dir)?;
    println!("{}", report.to_json()?);
    Ok(())
}
