//! PKCE (Proof Key for Code Exchange) 与授权请求的 challenge
//!
//! PKCE 是 OAuth 2.0 授权码流程的安全扩展，用于防止授权码拦截攻击。
//! 本模块只实现 `S256` 方法：
//!
//! 1. 客户端生成一个随机的 `code_verifier`
//! 2. 客户端计算 `code_challenge = BASE64URL(SHA256(code_verifier))`
//! 3. 授权请求携带 `code_challenge` 和 `code_challenge_method=S256`
//! 4. 换取 token 时携带原始的 `code_verifier`
//!
//! 每次授权请求还会生成一个随机的 `state`，用于防止 CSRF。
//!
//! ## 示例
//!
//! ```rust
//! use authrs_client::oauth::pkce::{ChallengeBuilder, PkceChallenge};
//!
//! let (challenge, pkce) = ChallengeBuilder::new().pkce(true).build().unwrap();
//! let pkce = pkce.unwrap();
//!
//! // verifier 由调用方保存，换取 token 时交回
//! assert_eq!(challenge.verifier.as_deref(), Some(pkce.verifier()));
//! assert!(PkceChallenge::verify(pkce.verifier(), pkce.challenge()));
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ConfigError, Error, Result};
use crate::random::{constant_time_compare_str, generate_random_base64_url};

/// 授权请求使用的 challenge 方法
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// 默认的随机字节数（Base64 编码后为 43 字符）
pub const DEFAULT_ENTROPY_BYTES: usize = 32;

/// PKCE verifier / challenge 对
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// 原始的 code_verifier（保密，仅在 token 请求时发送）
    verifier: String,

    /// code_challenge（发送到授权端点）
    challenge: String,
}

impl PkceChallenge {
    /// 生成新的 PKCE 对
    ///
    /// # Arguments
    ///
    /// * `verifier_length` - verifier 的随机字节数
    pub fn new(verifier_length: usize) -> Result<Self> {
        let verifier = generate_random_base64_url(verifier_length)?;
        Self::from_verifier(verifier)
    }

    /// 从已有的 verifier 重建
    ///
    /// verifier 必须为 43-128 个 `[A-Za-z0-9-._~]` 字符
    pub fn from_verifier(verifier: String) -> Result<Self> {
        if verifier.len() < 43 || verifier.len() > 128 {
            return Err(Error::Config(ConfigError::InvalidValue {
                key: "code_verifier".to_string(),
                message: format!(
                    "verifier length must be 43-128 characters, got {}",
                    verifier.len()
                ),
            }));
        }

        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
        {
            return Err(Error::Config(ConfigError::InvalidValue {
                key: "code_verifier".to_string(),
                message: "verifier contains invalid characters".to_string(),
            }));
        }

        let challenge = Self::compute_challenge(&verifier);
        Ok(Self {
            verifier,
            challenge,
        })
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// 获取 code_verifier
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// 获取 code_challenge
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// 消费并返回 verifier
    pub fn into_verifier(self) -> String {
        self.verifier
    }

    /// 验证 code_verifier 是否匹配 code_challenge（常量时间比较）
    ///
    /// 授权服务器侧的检查，测试桩也用它来校验客户端交回的 verifier
    pub fn verify(verifier: &str, challenge: &str) -> bool {
        constant_time_compare_str(&Self::compute_challenge(verifier), challenge)
    }
}

/// 一次授权请求的客户端侧状态
///
/// 调用方需要在回调前保存它：`state` 用于比对回调参数，
/// `verifier` 在换取 token 时交回。本库不会持久化它。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// 防 CSRF 的随机 state
    pub state: String,

    /// PKCE code_verifier（未启用 PKCE 时为 `None`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifier: Option<String>,
}

impl Challenge {
    /// 回调中的 state 是否与本次请求一致（常量时间比较）
    pub fn matches_state(&self, state: &str) -> bool {
        constant_time_compare_str(&self.state, state)
    }
}

/// 生成 [`Challenge`]（以及可选的 PKCE 对）
///
/// 纯本地计算，没有 I/O 和缓存
#[derive(Debug, Clone)]
pub struct ChallengeBuilder {
    pkce: bool,
    verifier_length: usize,
    state_length: usize,
}

impl Default for ChallengeBuilder {
    fn default() -> Self {
        Self {
            pkce: false,
            verifier_length: DEFAULT_ENTROPY_BYTES,
            state_length: DEFAULT_ENTROPY_BYTES,
        }
    }
}

impl ChallengeBuilder {
    /// 创建默认 builder（不启用 PKCE）
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否生成 PKCE 对
    pub fn pkce(mut self, enabled: bool) -> Self {
        self.pkce = enabled;
        self
    }

    /// 设置 verifier 的随机字节数
    pub fn verifier_length(mut self, length: usize) -> Self {
        self.verifier_length = length;
        self
    }

    /// 设置 state 的随机字节数
    pub fn state_length(mut self, length: usize) -> Self {
        self.state_length = length;
        self
    }

    /// 生成 challenge
    ///
    /// 返回的 [`PkceChallenge`] 携带要发送给授权端点的 `code_challenge`；
    /// 其 verifier 同时存入 [`Challenge::verifier`]
    pub fn build(&self) -> Result<(Challenge, Option<PkceChallenge>)> {
        let state = generate_random_base64_url(self.state_length)?;

        let pkce = if self.pkce {
            Some(PkceChallenge::new(self.verifier_length)?)
        } else {
            None
        };

        let challenge = Challenge {
            state,
            verifier: pkce.as_ref().map(|p| p.verifier().to_string()),
        };

        Ok((challenge, pkce))
    }
}
