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

use crate::{error::ProxyError, state::AppState, upstream::ProxyTarget, utils};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use reqwest::Client;

/// An inbound request claimed by the proxy, body fully buffered.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    pub sub_path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    async fn read(req: Request, sub_path: String) -> Result<Self, ProxyError> {
        let method = req.method().clone();
        let headers = utils::project_request_headers(req.headers());
        let body = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .map_err(ProxyError::RequestBody)?;

        Ok(Self {
            method,
            sub_path,
            headers,
            body,
        })
    }
}

/// The upstream answer, body fully buffered.
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Middleware placed in front of the dev server.
///
/// Requests under `/api/` are forwarded to the configured upstream and the
/// upstream answer is relayed back. Anything else goes to `next` untouched.
pub async fn proxy_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path_query = req
        .uri()
        .path_and_query()
        .map(|v| v.as_str())
        .unwrap_or("/");

    let Some(sub_path) = utils::match_api_path(path_query).map(str::to_string) else {
        return next.run(req).await;
    };

    match proxy(&state, req, sub_path).await {
        Ok(resp) => resp.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn proxy(state: &AppState, req: Request, sub_path: String) -> Result<ProxyResponse, ProxyError> {
    let original = req.uri().to_string();
    let request = ProxyRequest::read(req, sub_path).await?;

    let target = match state.upstream.as_ref() {
        Ok(target) => target,
        Err(e) => return Err(e.clone().into()),
    };

    tracing::info!(
        "Proxy request from [{} {}] to [{} {}]",
        request.method,
        original,
        request.method,
        target.url(&request.sub_path)
    );

    dispatch(&state.client, target, request).await
}

/// Single outbound attempt, no retries.
async fn dispatch(
    client: &Client,
    target: &ProxyTarget,
    request: ProxyRequest,
) -> Result<ProxyResponse, ProxyError> {
    let ProxyRequest {
        method,
        sub_path,
        headers,
        body,
    } = request;

    let resp = client
        .request(method, target.url(&sub_path))
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(ProxyError::Transport)?;

    let status = resp.status();
    let headers = utils::project_response_headers(resp.headers());
    let body = resp.bytes().await.map_err(ProxyError::ResponseBody)?;

    Ok(ProxyResponse {
        status,
        headers,
        body,
    })
}
