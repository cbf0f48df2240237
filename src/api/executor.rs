//! Single request/response exchanges.

use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use super::classify::{classify, error_message};
use super::client::{ClientConfig, Credential};
use super::pool::ConnectionPool;
use super::{Error, Params};

/// The parameter the credential is sent under.
pub(crate) const KEY_PARAM: &'static str = "key";

const FORM_CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

fn normalized_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// `path?key=<credential>&name=value...`, skipping empty values. A `key`
/// among `params` is dropped so the credential is the only one sent.
pub(crate) fn get_target(credential: &Credential, path: &str, params: &Params) -> String {
    let mut target = normalized_path(path);

    target.push('?');
    target.push_str(KEY_PARAM);
    target.push('=');
    target.extend(form_urlencoded::byte_serialize(credential.expose().as_bytes()));

    let mut params = params.clone();
    params.remove(KEY_PARAM);
    params.append_to_query(&mut target);

    target
}

/// `path?<form-encoded params>`, with the credential injected into the params.
pub(crate) fn post_target(credential: &Credential, path: &str, mut params: Params) -> String {
    params.insert(KEY_PARAM, credential.expose());

    format!("{}?{}", normalized_path(path), params.form_encode())
}

// Request targets are logged without the credential
pub(crate) fn redacted(target: &str) -> String {
    let Some((path, query)) = target.split_once('?') else {
        return target.to_string();
    };

    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((KEY_PARAM, _)) => format!("{}=<redacted>", KEY_PARAM),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", path, pairs.join("&"))
}

/// Fails with [`Error::HttpStatus`] unless the response has a success status.
/// The body of a failed response is read to recover the service's message.
pub(crate) async fn check_status(res: Response) -> Result<Response, Error> {
    let status = res.status();

    if status.is_success() {
        return Ok(res);
    }

    let message = match res.bytes().await {
        Ok(body) => serde_json::from_slice::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(error_message),
        Err(_) => None,
    };

    Err(Error::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

async fn exchange(request: RequestBuilder) -> Result<Value, Error> {
    let res = request
        .send()
        .await
        .map_err(|e| Error::Transport(e.into()))?;

    let res = check_status(res).await?;

    let body = res.bytes().await.map_err(|e| Error::Transport(e.into()))?;

    let envelope: Value = serde_json::from_slice(&body).map_err(Error::InvalidJson)?;

    classify(envelope)
}

pub(crate) async fn get(
    config: &ClientConfig,
    pool: &ConnectionPool,
    path: &str,
    params: &Params,
) -> Result<Value, Error> {
    let target = get_target(config.credential(), path, params);

    let lease = pool.acquire()?;

    let mut request = lease.http().get(config.url_for(&target));

    if let Some(timeout) = pool.settings().timeout {
        request = request.timeout(timeout);
    }

    debug!(target = %redacted(&target), "GET");

    let result = exchange(request).await;

    lease.release();

    debug!(ok = result.is_ok(), "GET finished");

    result
}

pub(crate) async fn post(
    config: &ClientConfig,
    pool: &ConnectionPool,
    path: &str,
    body: Option<&Params>,
    params: Params,
) -> Result<Value, Error> {
    let target = post_target(config.credential(), path, params);

    let lease = pool.acquire()?;

    let mut request = lease.http().post(config.url_for(&target));

    if let Some(body) = body {
        request = request
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body.form_encode());
    }

    if let Some(timeout) = pool.settings().timeout {
        request = request.timeout(timeout);
    }

    debug!(target = %redacted(&target), "POST");

    let result = exchange(request).await;

    lease.release();

    debug!(ok = result.is_ok(), "POST finished");

    result
}
