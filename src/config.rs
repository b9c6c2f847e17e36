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

use std::env;
use std::path::PathBuf;

use crate::upstream::{ProxyTarget, UpstreamError};

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_SERVE_DIR: &str = ".";

/// Configuration for the dev server.
#[derive(Debug, Clone)]
pub struct Config {
    /// The port to listen on.
    pub port: u16,
    /// Directory served for every request the proxy does not claim.
    pub serve_dir: PathBuf,
    /// The upstream backend, parsed once at startup.
    pub upstream: Result<ProxyTarget, UpstreamError>,
}

impl Config {
    /// # Environment Variables
    /// * `PORT` - Port to listen on (default: 9000).
    /// * `API_URL` - Upstream backend, `scheme://host[:port][/basePath]`.
    /// * `SERVE_DIR` - Static root (default: current directory).
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let serve_dir = env::var("SERVE_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVE_DIR));

        let upstream = ProxyTarget::from_config(env::var("API_URL").ok().as_deref());

        Self {
            port,
            serve_dir,
            upstream,
        }
    }
}
