/*
 * Copyright (C) 2025 Jakub Žitník
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 */

//! Development server that serves a static site and forwards `/api/` to a backend.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod upstream;
pub mod utils;

use axum::{Router, middleware};
use std::net::SocketAddr;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::error::StartupError;
use crate::state::AppState;

/// The dev server app: the proxy middleware in front of the static files.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(&state.serve_dir))
        .layer(middleware::from_fn_with_state(
            state,
            handlers::proxy_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Binds and runs the dev server until Ctrl-C or SIGTERM.
pub async fn serve(config: Config) -> Result<(), StartupError> {
    match &config.upstream {
        Ok(target) => tracing::info!(
            "Forwarding {} to {}{} (port {})",
            utils::API_PREFIX,
            target,
            target.base_path,
            target.effective_port()
        ),
        Err(e) => tracing::warn!("{}; requests under {} will fail", e, utils::API_PREFIX),
    }

    let client = state::build_client()?;
    let state = AppState::new(client, config.upstream, &config.serve_dir);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    tracing::info!("Dev server listening on http://{}", addr);
    tracing::info!("Serving static files from {}", config.serve_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down dev server");
}
