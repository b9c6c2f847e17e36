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

use crate::upstream::{ProxyTarget, UpstreamError};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The HTTP client used to forward requests to the upstream server.
    pub client: Client,
    /// The upstream resolved at startup. Never mutated afterwards.
    pub upstream: Arc<Result<ProxyTarget, UpstreamError>>,
    /// Static root for requests outside `/api/`.
    pub serve_dir: PathBuf,
}

impl AppState {
    pub fn new(
        client: Client,
        upstream: Result<ProxyTarget, UpstreamError>,
        serve_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            upstream: Arc::new(upstream),
            serve_dir: serve_dir.into(),
        }
    }
}

/// Builds the outbound client: no redirect following, no idle connection reuse,
/// no system proxy.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
}
