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

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Failures of a single proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to read upstream response body: {0}")]
    ResponseBody(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Transport(_) | ProxyError::ResponseBody(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        (self.status(), format!("Proxy Error: {}", self)).into_response()
    }
}

/// Failures that keep the dev server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_server_errors() {
        let err = ProxyError::from(UpstreamError::Missing);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ProxyError::from(UpstreamError::UnsupportedScheme("ftp:".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "unsupported protocol ftp:");
    }

    #[test]
    fn test_error_response_status() {
        let response = ProxyError::from(UpstreamError::Missing).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
