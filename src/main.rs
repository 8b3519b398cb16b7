use anyhow::{Context, Result};
use clap::Parser;
use splitmap::cli::{render_json, render_table, Cli};
use splitmap::config::{load_config, FilterRule};
use splitmap::core::CancellationToken;
use splitmap::pipeline::analyze;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_directive().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let search_from = config_search_root(&cli.workspaces)?;
    let mut config = load_config(cli.config.as_deref(), &search_from)?;
    if cli.framework_defaults {
        config
            .filter
            .block_patterns
            .extend(FilterRule::framework_defaults().block_patterns);
    }
    let config = config.validate().context("Invalid configuration")?;

    let cancel = CancellationToken::new();
    let report = analyze(&cli.workspaces, &config, &cancel).map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("Analysis failed during {stage}"))
    })?;

    if report.has_warnings() {
        warn!("Completed with warnings; see the summary for counts");
    }

    let rendered = if cli.json {
        render_json(&report, cli.top)?
    } else {
        render_table(&report, cli.top)
    };
    println!("{rendered}");
    Ok(())
}

/// Directory of the first solution, where config discovery starts.
fn config_search_root(workspaces: &[PathBuf]) -> Result<PathBuf> {
    match workspaces
        .first()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
    {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("Failed to read the current directory"),
    }
}
