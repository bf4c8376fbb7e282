//! HTTP key-value adapter for the revocation store.
//!
//! Contract:
//!
//! - `GET {base}/v1/kv/{key}` → `200 {"value": "<reason>"}` or `404`.
//! - `PUT {base}/v1/kv/{key}` with `{"value": "<reason>"}` → any 2xx.
//!
//! An optional bearer token is sent on every request.
//!
//! The contract has no conditional write, so `set_if_absent` is the trait's
//! `get` then `set`. Two registries racing through the same remote store can
//! both report a new revocation; the first reason may be overwritten.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::revocation::{RevocationError, RevocationStore};

#[derive(Serialize, Deserialize)]
struct KvValue {
    value: String,
}

#[derive(Clone)]
pub struct HttpRevocationStore {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpRevocationStore {
    pub fn new(base_url: Url, token: Option<String>, timeout: Duration) -> Result<Self, RevocationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| RevocationError::Http {
                endpoint: "client_init".into(),
                source,
            })?;
        Ok(Self { http, base_url, token })
    }

    fn key_url(&self, key: &str) -> Result<Url, RevocationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RevocationError::Api {
                endpoint: self.base_url.to_string(),
                status: 0,
                body: "base URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(["v1", "kv", key]);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl std::fmt::Debug for HttpRevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRevocationStore")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[async_trait]
impl RevocationStore for HttpRevocationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RevocationError> {
        let url = self.key_url(key)?;
        let endpoint = url.to_string();
        let resp = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|source| RevocationError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RevocationError::Api { endpoint, status, body });
        }
        let kv: KvValue = resp
            .json()
            .await
            .map_err(|source| RevocationError::Http { endpoint, source })?;
        Ok(Some(kv.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RevocationError> {
        let url = self.key_url(key)?;
        let endpoint = url.to_string();
        let resp = self
            .authorize(self.http.put(url))
            .json(&KvValue { value: value.to_string() })
            .send()
            .await
            .map_err(|source| RevocationError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RevocationError::Api { endpoint, status, body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::RevocationRegistry;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ID: &str = "urn:uuid:9b2f1c3e-7d4a-4e8b-a1c2-3f4e5d6a7b8c";

    fn store(server: &MockServer, token: Option<&str>) -> HttpRevocationStore {
        HttpRevocationStore::new(
            Url::parse(&server.uri()).unwrap(),
            token.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_revoked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v1/kv/revoked:{ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "FRAUD"})))
            .expect(1)
            .mount(&server)
            .await;

        let registry = RevocationRegistry::new(Arc::new(store(&server, None)));
        assert_eq!(registry.reason(ID).await.unwrap().as_deref(), Some("FRAUD"));
        // Second lookup is served from the positive cache.
        assert!(registry.is_revoked(ID).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let s = store(&server, None);
        assert_eq!(s.get(&format!("revoked:{ID}")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_error_not_clean() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let registry = RevocationRegistry::new(Arc::new(store(&server, None)));
        match registry.is_revoked(ID).await {
            Err(RevocationError::Api { status, body, .. }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);
        let s = HttpRevocationStore::new(Url::parse(&uri).unwrap(), None, Duration::from_secs(2)).unwrap();
        assert!(matches!(s.get("revoked:x").await, Err(RevocationError::Http { .. })));
    }

    #[tokio::test]
    async fn test_set_puts_value_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("/v1/kv/revoked:{ID}")))
            .and(header("authorization", "Bearer kv-secret"))
            .and(body_json(json!({"value": "COMPROMISED"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let registry = RevocationRegistry::new(Arc::new(store(&server, Some("kv-secret"))));
        let outcome = registry.revoke(ID, Some("COMPROMISED")).await.unwrap();
        assert!(outcome.newly_revoked);
        assert!(registry.is_revoked(ID).await.unwrap());
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kv-proxy/v1/kv/revoked:abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "X"})))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/kv-proxy/", server.uri())).unwrap();
        let s = HttpRevocationStore::new(base, None, Duration::from_secs(5)).unwrap();
        assert_eq!(s.get("revoked:abc").await.unwrap().as_deref(), Some("X"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let s = HttpRevocationStore::new(
            Url::parse("http://127.0.0.1:1").unwrap(),
            Some("kv-secret".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!format!("{s:?}").contains("kv-secret"));
    }
}
