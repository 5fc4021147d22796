// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clean up pods in evicted, failed or succeeded states.
//!
//! Meant to run as a periodic job inside the cluster. Individual delete
//! failures are logged and do not change the exit status.

use clap::Parser;

use fabric_gate::cleanup::{cleanup, KubeClient};
use fabric_gate::config::LOG_FORMAT_ENV;
use fabric_gate::logging::{init_tracing, LogFormat};

#[derive(Parser)]
#[command(name = "pods-cleaner")]
#[command(about = "Clean up k8s pods in evicted/failed/succeeded states.", long_about = None)]
struct Cli {
    /// Namespace
    #[arg(long, default_value = "default")]
    namespace: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(LogFormat::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref()));

    tracing::info!("Loading Kubernetes configuration");
    let client = KubeClient::in_cluster()?;

    let report = cleanup(&client, &cli.namespace).await?;
    tracing::info!(
        namespace = %cli.namespace,
        inspected = report.inspected,
        deleted = report.deleted,
        failed = report.failed,
        "Pod cleanup finished"
    );
    Ok(())
}
