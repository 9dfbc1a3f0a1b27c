//! Core HTTP operations against the DTS
//!
//! Every request is authorized, sent exactly once, and checked for a success
//! status. Failures are logged here with enough detail to diagnose them (method,
//! URL, status and response body) and returned as [`ServiceError`]s. There is
//! no retry; that policy belongs to the caller.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::app::client::auth::Authenticator;
use crate::app::models::ParamMap;
use crate::constants::http;
use crate::errors::{Result, ServiceError};

/// HTTP operations handler bound to one API key
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
    auth: Authenticator,
}

impl HttpHandler {
    /// Creates a handler from a configured client and an authenticator
    pub fn new(client: Client, auth: Authenticator) -> Self {
        Self { client, auth }
    }

    /// `GET` with query parameters, decoding a JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(String, String)],
    ) -> Result<T> {
        let request = self.client.get(url.as_str()).query(query);
        let response = self.send(Method::GET, url, request).await?;
        Self::decode(url, response).await
    }

    /// `POST` a JSON body, decoding a JSON reply
    ///
    /// `timeout` replaces the client-wide request timeout for this call only.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        body: &ParamMap,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut request = self.client.post(url.as_str()).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = self.send(Method::POST, url, request).await?;
        Self::decode(url, response).await
    }

    /// `DELETE`, discarding any reply body
    pub async fn delete(&self, url: &Url) -> Result<()> {
        let request = self.client.delete(url.as_str());
        self.send(Method::DELETE, url, request).await?;
        Ok(())
    }

    /// Sends one authorized request and rejects non-success statuses
    async fn send(&self, method: Method, url: &Url, request: RequestBuilder) -> Result<Response> {
        tracing::debug!("{} {}", method, url);

        let response = match self.auth.authorize(request).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(%method, %url, "Request failed: {}", e);
                return Err(ServiceError::Transport(e).into());
            }
        };

        let status = response.status();
        if status.is_success() {
            tracing::debug!(%method, %url, status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(text) => truncate(text),
            Err(e) => format!("<unreadable body: {}>", e),
        };
        tracing::error!(
            %method,
            %url,
            status = status.as_u16(),
            "HTTP error occurred: {}",
            body
        );
        Err(ServiceError::Http {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T> {
        let bytes = response.bytes().await.map_err(ServiceError::Transport)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(%url, "Unexpected response body: {}", e);
            ServiceError::Decode {
                endpoint: url.path().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Sends the unversioned handshake request
    pub(crate) async fn handshake<T: DeserializeOwned>(&self, root: &Url) -> Result<T> {
        let request = self.client.get(root.as_str());
        let response = self.send(Method::GET, root, request).await?;
        Self::decode(root, response).await
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > http::MAX_LOGGED_BODY {
        let mut cut = http::MAX_LOGGED_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::auth::ApiKey;
    use crate::app::client::config::ClientConfig;

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(http::MAX_LOGGED_BODY + 10);
        let cut = truncate(body);
        assert_eq!(cut.len(), http::MAX_LOGGED_BODY + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(http::MAX_LOGGED_BODY);
        let cut = truncate(body);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= http::MAX_LOGGED_BODY + 3);
    }

    #[test]
    fn test_short_body_untouched() {
        assert_eq!(truncate("not found".to_string()), "not found");
    }

    #[tokio::test]
    async fn test_transport_failure_is_service_error() {
        let client = ClientConfig {
            connect_timeout: Duration::from_millis(200),
            request_timeout: Duration::from_millis(500),
            ..Default::default()
        }
        .build_http_client()
        .unwrap();
        let auth = Authenticator::new(&ApiKey::new("key").unwrap()).unwrap();
        let handler = HttpHandler::new(client, auth);

        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/api/v1/databases", port)).unwrap();
        let result: Result<serde_json::Value> = handler.get_json(&url, &[]).await;
        let err = result.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "service");
    }
}
