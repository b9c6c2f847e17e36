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

use axum::http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE},
};

/// Requests under this prefix are proxied.
pub const API_PREFIX: &str = "/api/";

const DEFAULT_ACCEPT: &str = "application/json";

/// Returns the sub-path (query string included) when the request belongs to the proxy.
///
/// `/api/users/5?x=1` yields `users/5?x=1`, `/api/` yields an empty sub-path,
/// and `/api` or `/apiary/` are not proxied.
pub fn match_api_path(path_and_query: &str) -> Option<&str> {
    path_and_query.strip_prefix(API_PREFIX)
}

/// Copies every value of `name` from `from` into `to`, or the default when `from` has none.
fn copy_header(
    from: &HeaderMap,
    to: &mut HeaderMap,
    name: HeaderName,
    default: Option<&'static str>,
) {
    let mut values = from.get_all(&name).iter().peekable();
    if values.peek().is_none() {
        if let Some(default) = default {
            to.insert(name, HeaderValue::from_static(default));
        }
        return;
    }
    for value in values {
        to.append(name.clone(), value.clone());
    }
}

/// Headers forwarded to the upstream. Everything else is dropped.
pub fn project_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    copy_header(inbound, &mut headers, CONTENT_TYPE, None);
    copy_header(inbound, &mut headers, ACCEPT, Some(DEFAULT_ACCEPT));
    headers
}

/// Headers relayed back to the caller. Everything else is dropped.
pub fn project_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    copy_header(upstream, &mut headers, CONTENT_TYPE, None);
    copy_header(upstream, &mut headers, CONTENT_DISPOSITION, None);
    headers
}
