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

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static UPSTREAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?:)//([^/:]+)(?::(\d+))?(/.*)?$").expect("upstream pattern is valid")
});

// Any `scheme://` prefix, used to tell an unsupported scheme apart from garbage.
static SCHEME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*:)//").expect("scheme pattern is valid")
});

/// Why the configured upstream cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("missing API_URL environment variable pointing to the backend")]
    Missing,
    #[error("API_URL `{0}` is not of the form scheme://host[:port][/basePath]")]
    Malformed(String),
    #[error("unsupported protocol {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http:",
            Scheme::Https => "https:",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// The upstream backend requests under `/api/` are forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub scheme: Scheme,
    pub host: String,
    /// Only set when the configured value names a port explicitly.
    pub port: Option<u16>,
    /// Possibly empty.
    pub base_path: String,
}

impl ProxyTarget {
    /// Resolves the configured upstream value, `None` meaning it is unset.
    pub fn from_config(value: Option<&str>) -> Result<Self, UpstreamError> {
        match value {
            Some(v) if !v.is_empty() => v.parse(),
            _ => Err(UpstreamError::Missing),
        }
    }

    /// Joins the base path and the sub-path with a single `/` between them.
    ///
    /// An empty sub-path (or a bare query string) leaves the base path as
    /// configured, `/v1` stays `/v1`.
    pub fn destination(&self, sub_path: &str) -> String {
        let rest = sub_path.trim_start_matches('/');
        if rest.is_empty() || rest.starts_with('?') {
            let base = if self.base_path.is_empty() {
                "/"
            } else {
                self.base_path.as_str()
            };
            return format!("{}{}", base, rest);
        }

        let base = self.base_path.trim_end_matches('/');
        format!("{}/{}", base, rest)
    }

    /// Full outbound URL for a sub-path.
    pub fn url(&self, sub_path: &str) -> String {
        format!("{}{}", self, self.destination(sub_path))
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme.default_port())
    }
}

impl std::str::FromStr for ProxyTarget {
    type Err = UpstreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(caps) = UPSTREAM_PATTERN.captures(s) else {
            return Err(match SCHEME_PATTERN.captures(s) {
                Some(scheme) if !matches!(&scheme[1], "http:" | "https:") => {
                    UpstreamError::UnsupportedScheme(scheme[1].to_string())
                }
                _ => UpstreamError::Malformed(s.to_string()),
            });
        };

        let scheme = if &caps[1] == "https:" {
            Scheme::Https
        } else {
            Scheme::Http
        };

        let port = match caps.get(3) {
            Some(p) => Some(
                p.as_str()
                    .parse::<u16>()
                    .map_err(|_| UpstreamError::Malformed(s.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            scheme,
            host: caps[2].to_string(),
            port,
            base_path: caps.get(4).map_or_else(String::new, |m| m.as_str().to_string()),
        })
    }
}

/// Origin form, `scheme//host[:port]`, without the base path.
impl fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}//{}", self.scheme.as_str(), self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}
