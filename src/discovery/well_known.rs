//! issuer discovery 文档

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Result, TransportError};
use crate::transport::{HttpRequest, Transport};

/// discovery 文档相对 issuer 的路径
pub const WELL_KNOWN_PATH: &str = "/.well-known/oauth-authorization-server";

/// 授权服务器的 discovery 文档
///
/// 线上格式为 snake_case，这里只保留客户端用到的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnown {
    /// key set 地址
    pub jwks_uri: String,
    /// token 端点
    pub token_endpoint: String,
    /// 授权端点
    pub authorization_endpoint: String,
}

/// 按 issuer 缓存的 discovery 文档
///
/// 条目一经写入便不再失效，见 [`crate::discovery`] 的缓存策略说明
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: DashMap<String, Arc<WellKnown>>,
}

impl DiscoveryCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取 issuer 的 discovery 文档，未缓存时通过 transport 请求
    #[instrument(skip(self, transport), level = "debug")]
    pub async fn get(&self, transport: &dyn Transport, issuer: &str) -> Result<Arc<WellKnown>> {
        let cached = self.entries.get(issuer).map(|entry| entry.value().clone());
        if let Some(document) = cached {
            debug!("discovery cache hit");
            return Ok(document);
        }

        debug!("discovery cache miss, fetching");
        let url = format!("{}{}", issuer, WELL_KNOWN_PATH);
        let response = transport.send(HttpRequest::get(&url)).await?;

        if !response.is_success() {
            return Err(TransportError::Status {
                url,
                status: response.status,
            }
            .into());
        }

        let document: WellKnown = response.json().map_err(|e| TransportError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let document = Arc::new(document);
        // 并发首次访问时后写入者覆盖，数据等价
        self.entries.insert(issuer.to_string(), document.clone());
        Ok(document)
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
