//! Kiln CLI
//!
//! Usage:
//!   kiln                      Build, serve and watch (the `default` task)
//!   kiln build                One-off build
//!   kiln eslint concat        Run several tasks in order
//!   kiln --list               Show every task and its prerequisites
//!   kiln --root ./site --config ./site/kiln.dev.toml

use anyhow::{Context, Result};
use clap::Parser;
use kiln_pipeline::{BuildContext, Config, Runner, TaskGraph};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Front-end asset build pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Tasks to run, in order
    #[arg(default_value = "default")]
    tasks: Vec<String>,

    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file (default: <root>/kiln.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// List tasks and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.root, cli.config.as_deref())?;
    let graph = TaskGraph::from_config(&config)?;

    if cli.list {
        print_tasks(&graph);
        return Ok(());
    }

    let ctx = Arc::new(BuildContext::new(&cli.root, config)?);
    let runner = Runner::new(graph, ctx.clone());

    for task in &cli.tasks {
        let started = Instant::now();
        runner
            .run(task)
            .await
            .with_context(|| format!("'{}' failed", task))?;
        tracing::info!("'{}' done in {:?}", task, started.elapsed());
    }

    if ctx.has_services() {
        tracing::info!("Watching for changes. Press Ctrl-C to stop.");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        for service in ctx.take_services() {
            service.abort();
        }
        tracing::info!("Stopped");
    }

    Ok(())
}

fn print_tasks(graph: &TaskGraph) {
    let width = graph.tasks().map(|t| t.name.len()).max().unwrap_or(0);
    for task in graph.tasks() {
        if task.deps.is_empty() {
            println!("{}", task.name);
        } else {
            let separator = if task.series { " -> " } else { ", " };
            println!(
                "{:width$}  [{}]",
                task.name,
                task.deps.join(separator),
                width = width
            );
        }
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok(); // Ignore error if already initialized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_task() {
        let cli = Cli::try_parse_from(["kiln"]).unwrap();
        assert_eq!(cli.tasks, vec!["default"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(cli.config.is_none());
        assert!(!cli.list);
    }

    #[test]
    fn test_tasks_and_flags() {
        let cli = Cli::try_parse_from([
            "kiln",
            "eslint",
            "concat",
            "--root",
            "site",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.tasks, vec!["eslint", "concat"]);
        assert_eq!(cli.root, PathBuf::from("site"));
        assert_eq!(cli.log_level, "debug");
    }
}
