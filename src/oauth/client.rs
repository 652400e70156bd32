//! relying-party 客户端
//!
//! [`Client`] 在构造时绑定一个 issuer，整个生命周期内不会改变。
//! 它持有注入的 [`Transport`]、JWT 验证器，以及按 issuer 缓存的
//! discovery 文档与 key set。客户端可以在多个任务间共享（`Send + Sync`），
//! 所有操作都只需要 `&self`。

use std::sync::Arc;

use jsonwebtoken::Algorithm;

use crate::config::{ClientConfig, normalize_issuer};
use crate::discovery::{DiscoveryCache, KeySetCache};
use crate::error::Result;
use crate::token::jwt::JwtVerifier;
use crate::transport::Transport;

/// token 端点相对 issuer 的路径
pub const TOKEN_PATH: &str = "/token";

/// 授权端点相对 issuer 的路径
pub const AUTHORIZE_PATH: &str = "/authorize";

/// OAuth 2.0 / OIDC relying-party 客户端
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) verifier: JwtVerifier,
    pub(crate) discovery: DiscoveryCache,
    pub(crate) key_sets: KeySetCache,
}

impl Client {
    /// 创建 builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// 使用配置和 transport 创建客户端
    pub fn new<T>(config: ClientConfig, transport: T) -> Result<Self>
    where
        T: Transport + 'static,
    {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    /// 使用共享的 transport 创建客户端
    pub fn with_shared_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        let verifier = JwtVerifier::new(config.issuer.clone(), config.algorithms.clone())
            .with_leeway(config.leeway_secs);

        Ok(Self {
            config,
            transport,
            verifier,
            discovery: DiscoveryCache::new(),
            key_sets: KeySetCache::new(),
        })
    }

    /// 绑定的 issuer
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// client id
    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    /// 客户端配置
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// discovery 缓存
    pub fn discovery(&self) -> &DiscoveryCache {
        &self.discovery
    }

    /// key set 缓存
    pub fn key_sets(&self) -> &KeySetCache {
        &self.key_sets
    }

    pub(crate) fn token_url(&self) -> String {
        format!("{}{}", self.config.issuer, TOKEN_PATH)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.config.client_id)
            .field("issuer", &self.config.issuer)
            .field("discovery", &self.discovery)
            .field("key_sets", &self.key_sets)
            .finish_non_exhaustive()
    }
}

/// [`Client`] 构建器
#[derive(Default)]
pub struct ClientBuilder {
    client_id: Option<String>,
    issuer: Option<String>,
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    refresh_skew_secs: Option<i64>,
    leeway_secs: Option<u64>,
    algorithms: Option<Vec<Algorithm>>,
}

impl ClientBuilder {
    /// 设置 client id
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// 设置 issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// 以完整配置为基础（之后设置的字段会覆盖它）
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 设置 transport
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// 设置共享的 transport
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 设置 refresh 短路窗口（秒）
    pub fn refresh_skew_secs(mut self, secs: i64) -> Self {
        self.refresh_skew_secs = Some(secs);
        self
    }

    /// 设置验证时的时钟偏差容忍度（秒）
    pub fn leeway_secs(mut self, secs: u64) -> Self {
        self.leeway_secs = Some(secs);
        self
    }

    /// 设置接受的签名算法
    pub fn algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = Some(algorithms);
        self
    }

    /// 构建客户端
    ///
    /// 未设置 transport 时，启用 `reqwest` feature 则使用 [`crate::transport::ReqwestTransport`]，
    /// 否则返回配置错误
    pub fn build(self) -> Result<Client> {
        let mut config = self
            .config
            .unwrap_or_else(|| ClientConfig::new(String::new(), String::new()));

        if let Some(client_id) = self.client_id {
            config.client_id = client_id;
        }
        if let Some(issuer) = self.issuer {
            config.issuer = normalize_issuer(issuer);
        }
        if let Some(secs) = self.refresh_skew_secs {
            config.refresh_skew_secs = secs;
        }
        if let Some(secs) = self.leeway_secs {
            config.leeway_secs = secs;
        }
        if let Some(algorithms) = self.algorithms {
            config.algorithms = algorithms;
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        Client::with_shared_transport(config, transport)
    }
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::transport::ReqwestTransport::new()))
}

#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Err(crate::error::Error::Config(
        crate::error::ConfigError::MissingRequired("transport".to_string()),
    ))
}
