use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use common_api::Envelope;
use reqwest::multipart;
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::{debug, warn};

use crate::app_state::AppState;

/// Wildcard relay: mirror the inbound request against the upstream base and
/// normalize whatever comes back. Every failure inside the relay collapses
/// to a `500` envelope rather than propagating.
pub async fn relay(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    match relay_upstream(&state, &method, &path, query.as_deref(), &headers, body).await {
        Ok(response) => {
            state
                .metrics
                .record_relay(method.as_str(), response.status().as_u16(), started.elapsed());
            response
        }
        Err(err) => {
            warn!(error = %err, %path, "relay failed");
            state.metrics.record_upstream_failure();
            state
                .metrics
                .record_relay(method.as_str(), 500, started.elapsed());
            server_error(&err)
        }
    }
}

/// Dedicated login relay: the one upstream call a visitor makes before
/// holding any credential.
pub async fn login_relay(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    match forward_login(&state, &body).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "login relay failed");
            state.metrics.record_upstream_failure();
            server_error(&err)
        }
    }
}

/// Bare preflight answer; the CORS layer decorates it.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn server_error(err: &anyhow::Error) -> Response {
    let body = Envelope::failure(format!("Server error: {err}"));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

async fn relay_upstream(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let mut url = format!("{}/{}", state.config.upstream_base, path);
    if let Some(query) = query {
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
    }

    let mut builder = state.http.request(method.clone(), &url);

    // Relay the caller's credential untouched; never require one.
    if let Some(authorization) = headers.get(header::AUTHORIZATION) {
        builder = builder.header(header::AUTHORIZATION, authorization.clone());
    }

    if matches!(*method, Method::POST | Method::PUT) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        builder = attach_body(builder, content_type, body).await?;
    }

    let upstream = builder
        .send()
        .await
        .with_context(|| format!("upstream request to {url} failed"))?;

    normalize_response(upstream).await
}

async fn forward_login(state: &AppState, body: &Value) -> Result<Response> {
    let url = format!("{}/User/Login", state.config.upstream_base);
    let upstream = state
        .http
        .post(&url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("upstream request to {url} failed"))?;

    let status = upstream.status();
    let payload: Value = upstream
        .json()
        .await
        .context("upstream login response was not JSON")?;
    Ok((status, Json(payload)).into_response())
}

/// Pick the outbound body encoding from the inbound content-type.
///
/// An absent content-type is treated as an implicit file upload: try the
/// multipart path first (it fails without a boundary) and fall back to raw
/// text, same as a multipart header whose body will not parse.
async fn attach_body(
    builder: RequestBuilder,
    content_type: Option<&str>,
    body: Bytes,
) -> Result<RequestBuilder> {
    match content_type {
        Some(ct) if ct.contains("application/json") => {
            let value: Value =
                serde_json::from_slice(&body).context("invalid JSON request body")?;
            Ok(builder.json(&value))
        }
        Some(ct) if ct.contains("multipart/form-data") => {
            match rebuild_multipart(content_type, &body).await {
                // No content-type is set here: the transport computes the
                // new multipart boundary itself.
                Ok(form) => Ok(builder.multipart(form)),
                Err(err) => {
                    debug!(error = %err, "multipart parse failed, relaying raw text");
                    Ok(raw_text(builder, Some(ct), body))
                }
            }
        }
        None => match rebuild_multipart(None, &body).await {
            Ok(form) => Ok(builder.multipart(form)),
            Err(_) => Ok(raw_text(builder, None, body)),
        },
        Some(ct) => Ok(raw_text(builder, Some(ct), body)),
    }
}

fn raw_text(builder: RequestBuilder, content_type: Option<&str>, body: Bytes) -> RequestBuilder {
    let text = String::from_utf8_lossy(&body).into_owned();
    let builder = builder.body(text);
    match content_type {
        Some(ct) => builder.header(header::CONTENT_TYPE, ct),
        None => builder,
    }
}

/// Re-parse the inbound multipart body and rebuild it as a fresh outbound
/// form, preserving field names, file names, and part content-types.
async fn rebuild_multipart(content_type: Option<&str>, body: &Bytes) -> Result<multipart::Form> {
    let boundary = content_type
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| anyhow!("no multipart boundary"))?;

    let stream =
        futures::stream::iter([Ok::<Bytes, std::convert::Infallible>(body.clone())]);
    let mut inbound = multer::Multipart::new(stream, boundary);

    let mut form = multipart::Form::new();
    let mut parts = 0usize;
    while let Some(field) = inbound
        .next_field()
        .await
        .context("malformed multipart field")?
    {
        let name = field.name().map(str::to_owned).unwrap_or_default();
        let file_name = field.file_name().map(str::to_owned);
        let part_type = field.content_type().map(|mime| mime.to_string());
        let data = field
            .bytes()
            .await
            .context("failed to read multipart field")?;

        let mut part = multipart::Part::bytes(data.to_vec());
        if let Some(file_name) = file_name {
            part = part.file_name(file_name);
        }
        if let Some(part_type) = part_type {
            part = part
                .mime_str(&part_type)
                .context("invalid part content-type")?;
        }
        form = form.part(name, part);
        parts += 1;
    }

    if parts == 0 {
        return Err(anyhow!("multipart body contained no fields"));
    }
    Ok(form)
}

/// Normalize the upstream response.
///
/// Declared JSON is parsed and passed through. Anything else is first
/// parsed as JSON anyway (an upstream that mislabels its content-type) and
/// only then wrapped in the standard envelope around the raw text. The
/// upstream status is echoed outward either way.
async fn normalize_response(upstream: reqwest::Response) -> Result<Response> {
    let status = upstream.status();
    let declared_json = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let text = upstream
        .text()
        .await
        .context("failed to read upstream response body")?;

    let payload: Value = if declared_json {
        serde_json::from_str(&text).context("upstream declared JSON but body failed to parse")?
    } else {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) => {
                let message = if status.is_success() {
                    "Success".to_string()
                } else {
                    format!("Upstream error ({})", status.as_u16())
                };
                serde_json::to_value(Envelope {
                    status: status.is_success(),
                    message,
                    data: Value::String(text),
                })?
            }
        }
    };

    Ok((status, Json(payload)).into_response())
}
