//! `reqwest::blocking::Client`-backed [`TransportPort`], with optional
//! SOCKS5/HTTP proxy configuration and a fixed per-request header set.

use super::{RawResponse, TransportError, TransportPort};
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

pub struct ReqwestTransport {
    client: Client,
    api_key: Option<String>,
}

impl ReqwestTransport {
    /// `proxy_url` may be a `socks5h://` or `http://` URL; `None` means a
    /// direct connection.
    pub fn new(proxy_url: Option<&str>, api_key: Option<String>) -> Self {
        let mut builder = Client::builder();
        if let Some(proxy_url) = proxy_url {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(err) => warn!(marker = "TRANSPORT_CONFIG", %err, proxy_url, "invalid proxy URL, continuing without proxy"),
            }
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());
        ReqwestTransport { client, api_key }
    }
}

impl TransportPort for ReqwestTransport {
    fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.client.get(url).query(params).timeout(timeout);

        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let mut header_map = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                header_map.insert(name.as_str().to_lowercase(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .map_err(|err| TransportError::Network(err.to_string()))?
            .to_vec();

        Ok(RawResponse {
            status,
            headers: header_map,
            body,
        })
    }
}
