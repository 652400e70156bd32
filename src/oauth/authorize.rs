//! 授权请求
//!
//! 生成跳转到 issuer 授权端点的 URL，并返回调用方需要保存到回调时的
//! [`Challenge`]。整个过程只在本地计算，不访问网络。
//!
//! 查询参数依次为 `client_id`、`redirect_uri`、`response_type`、`state`，
//! 之后是可选的 `provider`，以及 PKCE 启用时的
//! `code_challenge_method=S256` 和 `code_challenge`。
//!
//! ## 示例
//!
//! ```rust
//! use authrs_client::oauth::{AuthorizationRequestBuilder, ResponseType};
//!
//! let result = AuthorizationRequestBuilder::new("https://auth.example.com", "my-client")
//!     .redirect_uri("https://app.example.com/callback")
//!     .response_type(ResponseType::Code)
//!     .pkce(true)
//!     .build()
//!     .unwrap();
//!
//! assert!(result.url.starts_with("https://auth.example.com/authorize?"));
//! assert!(result.challenge.verifier.is_some());
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::client::{AUTHORIZE_PATH, Client};
use super::pkce::{CODE_CHALLENGE_METHOD, Challenge, ChallengeBuilder, DEFAULT_ENTROPY_BYTES};
use super::token::ResponseType;
use crate::error::{ConfigError, Error, Result};

/// [`Client::authorize`] 的选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizeOptions {
    /// 是否启用 PKCE（仅对 `response_type=code` 生效）
    pub pkce: bool,

    /// 指定上游身份提供方
    pub provider: Option<String>,
}

impl AuthorizeOptions {
    /// 默认选项：不启用 PKCE，不指定 provider
    pub fn new() -> Self {
        Self::default()
    }

    /// 启用或关闭 PKCE
    pub fn with_pkce(mut self, pkce: bool) -> Self {
        self.pkce = pkce;
        self
    }

    /// 指定 provider
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// 授权请求的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResult {
    /// 需要调用方保存到回调时使用的 state / verifier
    pub challenge: Challenge,

    /// 授权端点 URL
    pub url: String,
}

/// 授权 URL 构建器
#[derive(Debug, Clone)]
pub struct AuthorizationRequestBuilder {
    issuer: String,
    client_id: String,
    redirect_uri: String,
    response_type: ResponseType,
    provider: Option<String>,
    pkce: bool,
    verifier_length: usize,
    state_length: usize,
}

impl AuthorizationRequestBuilder {
    /// 创建构建器
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            redirect_uri: String::new(),
            response_type: ResponseType::default(),
            provider: None,
            pkce: false,
            verifier_length: DEFAULT_ENTROPY_BYTES,
            state_length: DEFAULT_ENTROPY_BYTES,
        }
    }

    /// 回调地址
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// 响应类型
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// 上游身份提供方
    pub fn provider(mut self, provider: Option<String>) -> Self {
        self.provider = provider;
        self
    }

    /// 是否启用 PKCE
    pub fn pkce(mut self, pkce: bool) -> Self {
        self.pkce = pkce;
        self
    }

    /// verifier 的随机字节数
    pub fn verifier_length(mut self, length: usize) -> Self {
        self.verifier_length = length;
        self
    }

    /// state 的随机字节数
    pub fn state_length(mut self, length: usize) -> Self {
        self.state_length = length;
        self
    }

    /// 生成 challenge 并拼出授权 URL
    pub fn build(self) -> Result<AuthorizeResult> {
        // implicit 流程没有 token 端点交换，PKCE 无意义
        let use_pkce = self.pkce && self.response_type == ResponseType::Code;

        let (challenge, pkce) = ChallengeBuilder::new()
            .pkce(use_pkce)
            .verifier_length(self.verifier_length)
            .state_length(self.state_length)
            .build()?;

        let endpoint = format!("{}{}", self.issuer, AUTHORIZE_PATH);
        let mut url = Url::parse(&endpoint).map_err(|e| {
            Error::Config(ConfigError::InvalidValue {
                key: "issuer".to_string(),
                message: e.to_string(),
            })
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("response_type", self.response_type.as_str())
                .append_pair("state", &challenge.state);

            if let Some(provider) = &self.provider {
                query.append_pair("provider", provider);
            }

            if let Some(pkce) = &pkce {
                query
                    .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD)
                    .append_pair("code_challenge", pkce.challenge());
            }
        }

        debug!(
            response_type = %self.response_type,
            pkce = use_pkce,
            "authorization url built"
        );

        Ok(AuthorizeResult {
            challenge,
            url: url.into(),
        })
    }
}

impl Client {
    /// 生成授权 URL
    ///
    /// 返回的 [`AuthorizeResult::challenge`] 需要由调用方保存，
    /// 回调时用于比对 state，并在 [`Client::exchange`] 时交回 verifier
    pub fn authorize(
        &self,
        redirect_uri: &str,
        response_type: ResponseType,
        options: &AuthorizeOptions,
    ) -> Result<AuthorizeResult> {
        AuthorizationRequestBuilder::new(&self.config.issuer, &self.config.client_id)
            .redirect_uri(redirect_uri)
            .response_type(response_type)
            .provider(options.provider.clone())
            .pkce(options.pkce)
            .verifier_length(self.config.verifier_length)
            .state_length(self.config.state_length)
            .build()
    }
}
