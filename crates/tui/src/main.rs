mod app;
mod input;
mod theme;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{bail, Context, Result};
use gamelist_core::{
    backend::{Backend, LocalBackend, MemoryBackend},
    config::{self, AppConfig},
    preferences::Preferences,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Default)]
struct CliArgs {
    demo: bool,
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let args = parse_args(std::env::args().skip(1))?;
    config::ensure_default_config()?;
    let mut config = AppConfig::load()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    let backend: Arc<dyn Backend> = if args.demo {
        info!("Starting with the in-memory demo backend");
        Arc::new(MemoryBackend::demo())
    } else {
        info!(data_dir = %config.data_dir.display(), "Starting with the local backend");
        Arc::new(LocalBackend::new(&config.data_dir))
    };

    let prefs = Preferences::load(&config.preferences_path)?;
    let mut app = app::GameListApp::new(backend, config, prefs);
    app.run().await
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => parsed.demo = true,
            "--data-dir" => {
                let dir = args.next().context("--data-dir expects a path")?;
                parsed.data_dir = Some(PathBuf::from(dir));
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(parsed)
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("gamelist.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the terminal UI, so logs only go to the file
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_known_flags() -> Result<()> {
        let parsed = parse_args(args(&["--demo", "--data-dir", "/tmp/games"]))?;
        assert!(parsed.demo);
        assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/games")));
        Ok(())
    }

    #[test]
    fn rejects_unknown_or_incomplete_flags() {
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--data-dir"])).is_err());
    }
}
