// src/lib.rs

//! Start a set of interdependent units so that every unit starts only after
//! all of its dependencies have started, with as much concurrency as the
//! dependency graph allows.
//!
//! The scheduling core is [`dag`] + [`engine`]; what "starting" means is
//! injected through [`exec::StartAction`]. [`config`], [`cli`] and [`run`]
//! form the thin shell used by the `startorder` binary.

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, parse_duration, ConfigFile};
use crate::engine::{RunOptions, Runner};
use crate::exec::ShellAction;

pub use crate::dag::{CyclePath, DependencyGraph};
pub use crate::engine::in_dependency_order;
pub use crate::errors::StartOrderError;
pub use crate::types::{Unit, UnitSpec, UnitStatus};
pub use tokio_util::sync::CancellationToken;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the dependency graph and runner
/// - the shell start action
/// - Ctrl-C handling (cancels the run)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let timeout = match args.timeout.as_deref() {
        Some(s) => Some(parse_duration(s).map_err(|e| anyhow!("invalid --timeout: {e}"))?),
        None => cfg.timeout,
    };

    if args.dry_run {
        print_dry_run(&cfg, timeout)?;
        return Ok(());
    }

    let graph = Arc::new(cfg.graph()?);
    let ctx = CancellationToken::new();

    // Ctrl-C → stop launching units and interrupt running start commands.
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling run");
            ctx.cancel();
        });
    }

    let runner = Runner::new(Arc::clone(&graph)).with_options(RunOptions { timeout });
    let result = runner.run(&ctx, ShellAction::new()).await;

    for (name, status) in graph.statuses() {
        debug!(unit = %name, %status, "final unit status");
    }

    result.map_err(Into::into)
}

/// Simple dry-run output: print units in a valid start order.
fn print_dry_run(cfg: &ConfigFile, timeout: Option<std::time::Duration>) -> Result<()> {
    let graph = cfg.graph()?;
    let order = graph.topological_order()?;

    println!("startorder dry-run");
    match timeout {
        Some(t) => println!("  timeout = {t:?}"),
        None => println!("  timeout = none"),
    }
    println!();

    println!("units ({}), in a valid start order:", order.len());
    for name in &order {
        println!("  - {name}");
        if let Some(unit) = cfg.unit(name) {
            println!("      cmd: {}", unit.cmd);
        }
        let deps = graph.dependencies_of(name)?;
        if !deps.is_empty() {
            println!("      depends_on: {:?}", deps);
        }
    }

    println!();
    println!("initial frontier: {:?}", graph.leaves());

    debug!("dry-run complete (no execution)");
    Ok(())
}
