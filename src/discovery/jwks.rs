//! JSON Web Key Set 缓存

use std::sync::Arc;

use dashmap::DashMap;
use jsonwebtoken::jwk::JwkSet;
use tracing::{debug, instrument};

use super::well_known::DiscoveryCache;
use crate::error::{Result, TransportError};
use crate::transport::{HttpRequest, Transport};

/// 按 issuer 缓存的 key set
///
/// key set 的地址来自 [`DiscoveryCache`]；与 discovery 文档相同，
/// 条目一经写入便不再失效
#[derive(Debug, Default)]
pub struct KeySetCache {
    entries: DashMap<String, Arc<JwkSet>>,
}

impl KeySetCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取 issuer 的 key set，未缓存时先经 discovery 取得 `jwks_uri` 再请求
    #[instrument(skip(self, transport, discovery), level = "debug")]
    pub async fn get(
        &self,
        transport: &dyn Transport,
        discovery: &DiscoveryCache,
        issuer: &str,
    ) -> Result<Arc<JwkSet>> {
        let cached = self.entries.get(issuer).map(|entry| entry.value().clone());
        if let Some(keys) = cached {
            debug!("key set cache hit");
            return Ok(keys);
        }

        let well_known = discovery.get(transport, issuer).await?;
        let url = well_known.jwks_uri.clone();
        debug!(jwks_uri = %url, "key set cache miss, fetching");

        let response = transport.send(HttpRequest::get(&url)).await?;
        if !response.is_success() {
            return Err(TransportError::Status {
                url,
                status: response.status,
            }
            .into());
        }

        let keys: JwkSet = response.json().map_err(|e| TransportError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        debug!(keys = keys.keys.len(), "key set fetched");

        let keys = Arc::new(keys);
        self.entries.insert(issuer.to_string(), keys.clone());
        Ok(keys)
    }

    /// 是否已缓存该 issuer
    pub fn contains(&self, issuer: &str) -> bool {
        self.entries.contains_key(issuer)
    }

    /// 已缓存的 issuer 数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::WELL_KNOWN_PATH;
    use crate::error::Error;
    use crate::transport::{HttpResponse, MockTransport};
    use serde_json::json;

    const ISSUER: &str = "https://auth.example.com";
    const JWKS_URI: &str = "https://auth.example.com/.well-known/jwks.json";

    fn mock_with_keys(keys_response: HttpResponse) -> MockTransport {
        let mock = MockTransport::new();
        mock.insert_response(
            format!("{}{}", ISSUER, WELL_KNOWN_PATH),
            HttpResponse::json_body(
                200,
                &json!({
                    "jwks_uri": JWKS_URI,
                    "token_endpoint": "https://auth.example.com/token",
                    "authorization_endpoint": "https://auth.example.com/authorize"
                }),
            ),
        );
        mock.insert_response(JWKS_URI, keys_response);
        mock
    }

    fn key_set() -> serde_json::Value {
        json!({
            "keys": [{
                "kty": "oct",
                "kid": "k1",
                "alg": "HS256",
                "k": "YXV0aHJzLWNsaWVudC10ZXN0LXNpZ25pbmcta2V5LTAxMjM0NTY3"
            }]
        })
    }

    #[tokio::test]
    async fn test_fetches_once_then_hits_cache() {
        let mock = mock_with_keys(HttpResponse::json_body(200, &key_set()));
        let discovery = DiscoveryCache::new();
        let cache = KeySetCache::new();

        for _ in 0..3 {
            let keys = cache.get(&mock, &discovery, ISSUER).await.unwrap();
            assert!(keys.find("k1").is_some());
        }

        assert_eq!(mock.call_count(JWKS_URI), 1);
        assert_eq!(mock.call_count(&format!("{}{}", ISSUER, WELL_KNOWN_PATH)), 1);
        assert!(cache.contains(ISSUER));
        assert!(discovery.contains(ISSUER));
    }

    #[tokio::test]
    async fn test_key_set_failure_propagates() {
        let mock = mock_with_keys(HttpResponse::new(500, "boom"));
        let discovery = DiscoveryCache::new();
        let cache = KeySetCache::new();

        let err = cache.get(&mock, &discovery, ISSUER).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Status { status: 500, .. })
        ));
        assert!(cache.is_empty());
        // discovery 已成功，仍然保留
        assert!(discovery.contains(ISSUER));
    }

    #[tokio::test]
    async fn test_malformed_key_set() {
        let mock = mock_with_keys(HttpResponse::json_body(200, &json!({ "keys": "nope" })));
        let discovery = DiscoveryCache::new();
        let cache = KeySetCache::new();

        let err = cache.get(&mock, &discovery, ISSUER).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Decode { .. })
        ));
    }
}
