//! Media worker binary.
//!
//! Runs recorded jobs (see `JobReplay`) through a pool of reference worker
//! instances and prints one JSON report per job.
//!
//! Usage: `media-worker <replay.json>...`

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use mworker_sdk::logging::build_dispatch;
use mworker_sdk::{JobReplay, WorkerConfig, WorkerPool};
use mworker_worker::ExampleMediaWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env();

    // Launcher logs use the same settings as the instances
    let dispatch = build_dispatch(&config.logging)?;
    tracing::dispatcher::set_global_default(dispatch)
        .context("Failed to install the global log dispatcher")?;

    info!("Starting media-worker");
    info!("Worker config: {:?}", config);

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: media-worker <replay.json>...");
    }

    let replays = paths
        .iter()
        .map(|path| {
            JobReplay::from_file(path).with_context(|| format!("Failed to load replay {}", path))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let pool = Arc::new(WorkerPool::new(config, ExampleMediaWorker::new));

    // Setup signal handler
    let signal_pool = Arc::clone(&pool);
    let shutdown_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_pool.shutdown();
        }
    });

    let outcomes = pool.run(replays).await?;
    shutdown_handle.abort();

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.report {
            Ok(report) => println!("{}", report.to_json()),
            Err(e) => {
                failed += 1;
                error!(job_id = %outcome.job_id, "Job failed: {}", e);
                println!(
                    "{}",
                    serde_json::json!({
                        "job_id": outcome.job_id,
                        "status": "error",
                        "message": e.to_string(),
                    })
                );
            }
        }
    }

    info!(
        "Worker shutdown complete: {} job(s), {} rejected",
        outcomes.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
