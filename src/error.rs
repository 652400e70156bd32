//! 统一错误类型模块
//!
//! 提供 authrs-client 中所有操作的错误类型定义。
//!
//! 错误分为两类：
//!
//! - **协议错误**：授权服务器或本地校验拒绝了某个凭证
//!   （[`Error::InvalidAuthorizationCode`]、[`Error::InvalidRefreshToken`]、
//!   [`Error::InvalidAccessToken`]、[`Error::InvalidSubject`]）
//! - **基础设施错误**：网络、配置、随机数生成失败，原样向调用方传播，
//!   不会被降级为协议错误

use thiserror::Error;

/// authrs-client 的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// authrs-client 的错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// 授权码被 token 端点拒绝
    #[error("authorization code was rejected by the issuer")]
    InvalidAuthorizationCode,

    /// Refresh token 被 token 端点拒绝
    #[error("refresh token was rejected by the issuer")]
    InvalidRefreshToken,

    /// Access token 格式错误、签名无效或本地解码失败
    #[error("invalid access token: {0}")]
    InvalidAccessToken(#[from] TokenError),

    /// Claims 已验证，但 subject 不符合声明的 schema
    #[error("invalid subject: {0}")]
    InvalidSubject(#[from] SubjectError),

    /// 传输层错误（discovery / key set / token 端点）
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// 配置错误
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 加密错误
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl Error {
    /// access token 是否因过期而被拒绝
    pub fn is_expired(&self) -> bool {
        matches!(self, Error::InvalidAccessToken(TokenError::Expired))
    }

    /// 是否为传输层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Access token 相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token 已过期
    #[error("token has expired")]
    Expired,
    /// Token 格式无效
    #[error("invalid token format: {0}")]
    InvalidFormat(String),
    /// Token 签名无效
    #[error("invalid token signature")]
    InvalidSignature,
    /// Token 解码失败
    #[error("token decoding failed: {0}")]
    DecodingFailed(String),
    /// 无效的 claim 值
    #[error("invalid claim value: {0}")]
    InvalidClaim(String),
    /// key set 中没有匹配的密钥
    #[error("no matching key in key set: {0}")]
    KeyNotFound(String),
    /// 不接受的签名算法
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Subject 校验相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    /// token 的 mode 不是 `access`
    #[error("token mode is not 'access'")]
    NotAccessToken,
    /// schema 中没有注册该 subject 类型
    #[error("unknown subject type: {0}")]
    UnknownType(String),
    /// payload 未通过 schema 校验
    #[error("subject '{kind}' rejected: {}", issues.join("; "))]
    Rejected {
        /// subject 类型
        kind: String,
        /// 校验问题列表
        issues: Vec<String>,
    },
}

/// 传输层错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 请求未能完成
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    /// 服务器返回非成功状态码
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    /// 响应体无法解析
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 缺少必需的配置
    #[error("missing required configuration: {0}")]
    MissingRequired(String),
    /// 无效的配置值
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// 加密相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// 随机数生成失败
    #[error("random number generation failed: {0}")]
    RngFailed(String),
}
