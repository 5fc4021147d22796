// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};

use fabric_gate::{
    api::router,
    auth::{bootstrap_app_permissions, AuthGate},
    config::{SecurityConfig, ServerConfig},
    directory::{Directory, InMemoryDirectory},
    logging::init_tracing,
    state::AppState,
    storage::{FileDirectory, StoragePaths},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server = ServerConfig::from_env()?;
    init_tracing(server.log_format);
    let security = SecurityConfig::from_env()?;

    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let mut directory: Box<dyn Directory> = match &server.data_dir {
        Some(dir) => Box::new(FileDirectory::open(StoragePaths::new(dir))?),
        None => {
            tracing::warn!("DATA_DIR not set, users are kept in memory only");
            Box::new(InMemoryDirectory::new())
        }
    };
    bootstrap_app_permissions(&mut *directory)?;

    let gate = AuthGate::from_config(&security, directory)?
        .with_secure_cookies(server.tls.is_some());
    let mut state = AppState::new(Arc::new(gate));
    if let Some(dir) = &server.static_dir {
        state = state.with_static_dir(dir);
    }
    let app = router(state);

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    let addr = server.bind_addr();
    match &server.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            tracing::info!(%addr, "Fabric Gate listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "Fabric Gate listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: Handle<std::net::SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
