// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Odd Jobs Daemon (ojd)
//!
//! Background process that owns the task queue, the working-copy pool,
//! and the scheduler's dispatch loop. Runs until SIGTERM/SIGINT.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use oj_adapters::{ClaudeAgentProcess, NoopProgressRecorder};
use oj_core::SystemClock;
use oj_daemon::{Config, DaemonLock, LockError};
use oj_engine::Supervisor;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("ojd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("ojd {}", env!("CARGO_PKG_VERSION"));
                println!("Odd Jobs Daemon - owns the task queue and dispatches agent runs");
                println!();
                println!("USAGE:");
                println!("    ojd");
                println!();
                println!("Configuration is read from the environment: OJ_POOL_SIZE,");
                println!("OJ_MAX_CONCURRENT, OJ_DB_PATH, OJ_WORKTREE_BASE, OJ_AGENT_BIN,");
                println!("OJ_REPO_ROOT. See the project README for defaults.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: ojd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::from_env();

    let lock_path = config.db_path.join("ojd.lock");
    let lock = match DaemonLock::acquire(&lock_path) {
        Ok(lock) => lock,
        Err(LockError::AlreadyLocked { path, .. }) => {
            eprintln!("ojd is already running (lock held at {})", path.display());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let _log_guard = setup_logging(&config)?;
    info!(pool_size = config.pool_size, max_concurrent = config.max_concurrent, "starting ojd");

    let agent = Arc::new(ClaudeAgentProcess::new(config.agent_bin.clone()));
    let progress = Arc::new(NoopProgressRecorder);
    let clock = Arc::new(SystemClock);

    let supervisor = Arc::new(
        Supervisor::init(
            &config.db_path,
            config.repo_root.clone(),
            config.branch_prefix(),
            config.worktree_base.clone(),
            config.pool_size,
            config.max_concurrent,
            agent,
            progress,
            clock,
        )
        .await?,
    );
    supervisor.start();

    info!("ojd ready");
    println!("READY");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }

    info!("shutting down");
    supervisor.stop().await;
    if let Err(e) = supervisor.checkpoint() {
        error!("final checkpoint failed: {e}");
    }
    drop(lock);
    info!("ojd shutdown complete");
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config.db_path.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "ojd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
