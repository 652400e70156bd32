//! # AuthRS Client
//!
//! OAuth 2.0 / OpenID Connect relying-party 的 token 生命周期库。
//!
//! ## 功能特性
//!
//! - **授权请求**: 生成授权 URL、随机 state 与 PKCE (S256) challenge
//! - **授权码换取**: 用授权码换取 access / refresh token 对
//! - **Token 刷新**: refresh token 轮换，access token 仍有效时跳过网络请求
//! - **Token 验证**: 基于 issuer 的 key set 校验 JWT，并按 schema 解析 subject
//! - **自动续期**: 验证时 access token 过期会用 refresh token 刷新，最多一次
//! - **Discovery 缓存**: 按 issuer 惰性获取并缓存 discovery 文档与 key set
//!
//! ## Features
//!
//! - `reqwest` - 使用 `reqwest` 作为默认 HTTP transport（默认启用）
//!
//! 未启用 `reqwest` 时需要通过 [`transport::Transport`] 注入自己的实现。
//!
//! ## 示例
//!
//! ```rust,no_run
//! use authrs_client::{Client, SubjectSchema, VerifyOptions};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     id: String,
//!     email: String,
//! }
//!
//! # async fn run(access_token: &str, refresh_token: &str) -> authrs_client::Result<()> {
//! let client = Client::builder()
//!     .client_id("my-client")
//!     .issuer("https://auth.example.com")
//!     .build()?;
//!
//! let schema = SubjectSchema::new().subject::<User>("user");
//! let result = client
//!     .verify(
//!         &schema,
//!         access_token,
//!         &VerifyOptions::new().with_refresh(refresh_token),
//!     )
//!     .await?;
//!
//! // properties 已按 User 的 shape 校验过
//! let user: User = result.subject.properties_as().expect("validated by schema");
//! println!("verified {}", user.email);
//!
//! if let Some(tokens) = result.tokens {
//!     // access token 已过期并被刷新，保存新的 token 对
//!     println!("rotated refresh token: {}", tokens.refresh.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## 错误处理
//!
//! 所有操作返回 [`Result`]。授权服务器拒绝凭证时返回对应的协议错误
//! （[`Error::InvalidAuthorizationCode`]、[`Error::InvalidRefreshToken`]、
//! [`Error::InvalidAccessToken`]、[`Error::InvalidSubject`]）；
//! 网络故障以 [`Error::Transport`] 原样返回，不会被当作凭证无效。
//!
//! ## 日志
//!
//! 本库通过 `tracing` 输出 `debug` 级别的 span 与事件，凭证被拒绝时输出 `warn`。
//! token 与密钥内容不会写入日志。

pub mod config;
pub mod discovery;
pub mod error;
pub mod oauth;
pub mod random;
pub mod subject;
pub mod token;
pub mod transport;

pub use error::{Error, Result};

// ============================================================================
// 配置导出
// ============================================================================

pub use config::ClientConfig;

// ============================================================================
// 客户端导出
// ============================================================================

pub use oauth::{
    AuthorizationRequestBuilder, AuthorizeOptions, AuthorizeResult, Challenge, ChallengeBuilder,
    Client, ClientBuilder, GrantType, PkceChallenge, RefreshOptions, ResponseType, TokenPair,
    VerifyOptions, VerifyResult,
};

// ============================================================================
// Subject 导出
// ============================================================================

pub use subject::{SerdeSubject, SubjectSchema, SubjectValidator, VerifiedSubject};

// ============================================================================
// Discovery / Transport 导出
// ============================================================================

pub use discovery::{DiscoveryCache, KeySetCache, WellKnown};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, MockTransport, Transport};

// ============================================================================
// 随机数生成函数导出
// ============================================================================

pub use random::{constant_time_compare_str, generate_random_base64_url, generate_random_bytes};
