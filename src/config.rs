//! 客户端配置
//!
//! [`ClientConfig`] 描述一个绑定到单一 issuer 的 relying-party 客户端。
//! 配置可以用 builder 方法逐项设置，也可以从环境变量读取：
//!
//! | 环境变量 | 字段 |
//! |---|---|
//! | `AUTHRS_CLIENT_ID` | `client_id` |
//! | `AUTHRS_ISSUER` | `issuer` |
//! | `AUTHRS_REFRESH_SKEW_SECS` | `refresh_skew_secs`（可选） |
//! | `AUTHRS_LEEWAY_SECS` | `leeway_secs`（可选） |
//!
//! ## 示例
//!
//! ```rust
//! use authrs_client::config::ClientConfig;
//!
//! let config = ClientConfig::new("my-client", "https://auth.example.com/")
//!     .with_refresh_skew_secs(60);
//! config.validate().unwrap();
//!
//! // 末尾的 '/' 会被去掉
//! assert_eq!(config.issuer, "https://auth.example.com");
//! ```

use jsonwebtoken::Algorithm;

use crate::error::{ConfigError, Error, Result};

/// 环境变量：client id
pub const ENV_CLIENT_ID: &str = "AUTHRS_CLIENT_ID";
/// 环境变量：issuer
pub const ENV_ISSUER: &str = "AUTHRS_ISSUER";
/// 环境变量：refresh 短路窗口（秒）
pub const ENV_REFRESH_SKEW_SECS: &str = "AUTHRS_REFRESH_SKEW_SECS";
/// 环境变量：验证时允许的时钟偏差（秒）
pub const ENV_LEEWAY_SECS: &str = "AUTHRS_LEEWAY_SECS";

/// 默认的 refresh 短路窗口：access token 剩余有效期超过该值时不刷新
pub const DEFAULT_REFRESH_SKEW_SECS: i64 = 30;

/// refresh 短路窗口的上限（一天）
pub const MAX_REFRESH_SKEW_SECS: i64 = 86_400;

/// relying-party 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 在授权服务器注册的 client id
    pub client_id: String,

    /// 绑定的 issuer（不含末尾的 '/'）
    pub issuer: String,

    /// `refresh` 携带 access token 时的短路窗口（秒）
    pub refresh_skew_secs: i64,

    /// 验证 `exp` / `nbf` 时允许的时钟偏差（秒）
    pub leeway_secs: u64,

    /// 接受的 JWS 签名算法
    pub algorithms: Vec<Algorithm>,

    /// PKCE code_verifier 的随机字节数
    ///
    /// RFC 7636 要求 verifier 长度在 43-128 字符之间，
    /// 默认 32 字节，Base64 编码后为 43 字符
    pub verifier_length: usize,

    /// state 的随机字节数
    pub state_length: usize,
}

impl ClientConfig {
    /// 使用 client id 和 issuer 创建配置，其余字段取默认值
    pub fn new(client_id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            issuer: normalize_issuer(issuer.into()),
            refresh_skew_secs: DEFAULT_REFRESH_SKEW_SECS,
            leeway_secs: 0,
            algorithms: vec![Algorithm::RS256, Algorithm::ES256],
            verifier_length: 32,
            state_length: 32,
        }
    }

    /// 从环境变量读取配置
    pub fn from_env() -> Result<Self> {
        let client_id = require_env(ENV_CLIENT_ID)?;
        let issuer = require_env(ENV_ISSUER)?;
        let mut config = Self::new(client_id, issuer);

        if let Some(skew) = parse_env::<i64>(ENV_REFRESH_SKEW_SECS)? {
            config.refresh_skew_secs = skew;
        }
        if let Some(leeway) = parse_env::<u64>(ENV_LEEWAY_SECS)? {
            config.leeway_secs = leeway;
        }

        config.validate()?;
        Ok(config)
    }

    /// 设置 refresh 短路窗口
    pub fn with_refresh_skew_secs(mut self, secs: i64) -> Self {
        self.refresh_skew_secs = secs;
        self
    }

    /// 设置时钟偏差容忍度
    pub fn with_leeway_secs(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// 设置接受的签名算法
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// 设置 PKCE verifier 长度（字节数）
    pub fn with_verifier_length(mut self, length: usize) -> Self {
        self.verifier_length = length;
        self
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config(ConfigError::MissingRequired(
                "client_id".to_string(),
            )));
        }

        if self.issuer.trim().is_empty() {
            return Err(Error::Config(ConfigError::MissingRequired(
                "issuer".to_string(),
            )));
        }

        url::Url::parse(&self.issuer).map_err(|e| {
            Error::Config(ConfigError::InvalidValue {
                key: "issuer".to_string(),
                message: e.to_string(),
            })
        })?;

        if self.algorithms.is_empty() {
            return Err(Error::Config(ConfigError::InvalidValue {
                key: "algorithms".to_string(),
                message: "at least one algorithm is required".to_string(),
            }));
        }

        // 32..=96 字节经 Base64 编码后恰为 43..=128 字符
        if !(32..=96).contains(&self.verifier_length) {
            return Err(Error::Config(ConfigError::InvalidValue {
                key: "verifier_length".to_string(),
                message: format!(
                    "verifier length must be 32-96 bytes, got {}",
                    self.verifier_length
                ),
            }));
        }

        if !(0..=MAX_REFRESH_SKEW_SECS).contains(&self.refresh_skew_secs) {
            return Err(Error::Config(ConfigError::InvalidValue {
                key: "refresh_skew_secs".to_string(),
                message: format!(
                    "refresh skew must be 0-{} seconds, got {}",
                    MAX_REFRESH_SKEW_SECS, self.refresh_skew_secs
                ),
            }));
        }

        if self.state_length == 0 {
            return Err(Error::Config(ConfigError::InvalidValue {
                key: "state_length".to_string(),
                message: "state length must be positive".to_string(),
            }));
        }

        Ok(())
    }
}

pub(crate) fn normalize_issuer(issuer: String) -> String {
    issuer.trim().trim_end_matches('/').to_string()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(ConfigError::MissingRequired(key.to_string())))
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::Config(ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        }),
        Err(_) => Ok(None),
    }
}
