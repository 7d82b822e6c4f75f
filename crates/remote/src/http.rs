//! HTTP/JSON implementation of [`RemoteApi`].

use std::sync::Arc;

use tracing::debug;

use rustplex_core::{ContentList, MediaServer, ServerRegistry, TransportError, url};

use crate::provider::{RawResponse, RemoteApi};
use crate::wire::{Envelope, Origin};

const PRODUCT: &str = "rustplex";

pub struct HttpRemoteApi {
    servers: Arc<ServerRegistry>,
    client: reqwest::Client,
}

impl HttpRemoteApi {
    pub fn new(servers: Arc<ServerRegistry>) -> Self {
        Self {
            servers,
            client: reqwest::Client::new(),
        }
    }

    /// Map a client reference onto an HTTP address and the server behind it.
    fn locate(&self, reference: &str) -> Result<(String, Option<Arc<MediaServer>>), TransportError> {
        if reference.starts_with(url::SERVER_SCHEME) {
            let uuid = url::host_of(reference)
                .ok_or_else(|| TransportError::InvalidUrl(reference.to_string()))?;
            let server = self
                .servers
                .find_by_uuid(&uuid)
                .ok_or(TransportError::UnknownServer(uuid))?;
            let http = server.http_url(&url::path_and_query(reference)?);
            return Ok((http, Some(server)));
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok((reference.to_string(), None));
        }
        Err(TransportError::InvalidUrl(reference.to_string()))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, TransportError> {
        let resp = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TransportError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn fetch_directory(
        &self,
        url: &str,
        body: Option<&str>,
    ) -> Result<ContentList, TransportError> {
        let (http, server) = self.locate(url)?;
        debug!(url = %url, http = %http, post = body.is_some(), "directory request");

        let mut request = match body {
            Some(body) => self.client.post(&http).body(body.to_string()),
            None => self.client.get(&http),
        };
        request = request
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-Plex-Product", PRODUCT);
        if let Some(token) = server.as_ref().and_then(|s| s.token.as_deref()) {
            request = request.header("X-Plex-Token", token);
        }

        let envelope: Envelope = self
            .send(request, url)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        let origin = Origin {
            server: server.as_deref(),
            request_url: url,
        };
        Ok(envelope.media_container.into_list(&origin))
    }

    async fn fetch_raw(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        let (http, _) = self.locate(url)?;
        debug!(url = %http, "raw request");

        let mut request = self.client.get(&http);
        if let Some(ua) = user_agent {
            request = request.header(reqwest::header::USER_AGENT, ua);
        }
        let resp = self.send(request, url).await?;

        let mut headers = String::new();
        for (name, value) in resp.headers() {
            if let Ok(value) = value.to_str() {
                headers.push_str(&format!("{name}: {value}\r\n"));
            }
        }
        headers.push_str("\r\n");

        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(RawResponse { headers, body })
    }
}
