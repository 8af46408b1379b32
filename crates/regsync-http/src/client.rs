//! Plumbing shared by the scheduler and registry clients.
use reqwest::{Client, Response, StatusCode, Url};

use regsync_core::{SyncError, SyncResult};

use crate::config::HttpConfig;

/// Longest response body kept in an error.
const ERROR_BODY_LIMIT: usize = 512;

/// Client with the connect timeout applied; request timeouts are set per call.
pub(crate) fn build(cfg: &HttpConfig) -> SyncResult<Client> {
    Client::builder()
        .connect_timeout(cfg.timeout)
        .build()
        .map_err(transport)
}

pub(crate) fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// `base` with `segments` appended, each one percent-encoded as a single path segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> SyncResult<Url> {
    let mut url = Url::parse(base).map_err(|e| SyncError::Transport(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| SyncError::Transport(format!("{base}: not a base url")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn transport(e: reqwest::Error) -> SyncError {
    if e.is_decode() {
        SyncError::Decode(e.to_string())
    } else {
        SyncError::Transport(e.to_string())
    }
}

/// Pass 2xx responses through; turn everything else into an error.
pub(crate) async fn check(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound(response.url().path().to_string()));
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    Err(SyncError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    })
}

/// Decode a JSON body into `T`.
pub(crate) async fn json<T: serde::de::DeserializeOwned>(response: Response) -> SyncResult<T> {
    let bytes = response.bytes().await.map_err(transport)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_each_segment() {
        let url = endpoint("http://127.0.0.1:8500", &["v1", "deregister", "a/b c?#"]).unwrap();
        assert_eq!(url.path(), "/v1/deregister/a%2Fb%20c%3F%23");

        let nested = endpoint("http://consul:8500/proxy/", &["v1", "x"]).unwrap();
        assert_eq!(nested.as_str(), "http://consul:8500/proxy/v1/x");
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(matches!(
            endpoint("not a url", &["v1"]),
            Err(SyncError::Transport(_))
        ));
    }
}
