//! OAuth 2.0 relying-party 模块
//!
//! 围绕 [`Client`] 组织 token 的完整生命周期：
//!
//! - **授权** (`authorize`): 生成授权 URL 和需要保存的 [`Challenge`]
//! - **换取** (`exchange`): 用授权码换取 [`TokenPair`]
//! - **刷新** (`refresh`): refresh token 轮换，access token 仍有效时跳过
//! - **验证** (`verify`): 校验 access token 并解析 subject，过期时最多刷新一次
//! - **PKCE** (`pkce`): Proof Key for Code Exchange（仅 S256）
//!
//! ## 示例
//!
//! ```rust,no_run
//! use authrs_client::oauth::{AuthorizeOptions, Client, ResponseType, VerifyOptions};
//! use authrs_client::subject::SubjectSchema;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     id: String,
//! }
//!
//! # async fn run() -> authrs_client::Result<()> {
//! let client = Client::builder()
//!     .client_id("my-client")
//!     .issuer("https://auth.example.com")
//!     .build()?;
//!
//! // 1. 跳转到授权端点，保存 challenge
//! let auth = client.authorize(
//!     "https://app.example.com/callback",
//!     ResponseType::Code,
//!     &AuthorizeOptions::new().with_pkce(true),
//! )?;
//!
//! // 2. 回调中校验 state 并换取 token
//! if !auth.challenge.matches_state("state-from-callback") {
//!     return Ok(());
//! }
//! let tokens = client
//!     .exchange(
//!         "code-from-callback",
//!         "https://app.example.com/callback",
//!         auth.challenge.verifier.as_deref(),
//!     )
//!     .await?;
//!
//! // 3. 验证 access token，过期时自动刷新一次
//! let schema = SubjectSchema::new().subject::<User>("user");
//! let verified = client
//!     .verify(
//!         &schema,
//!         &tokens.access,
//!         &VerifyOptions::new().with_refresh(tokens.refresh.clone()),
//!     )
//!     .await?;
//! if let Some(rotated) = verified.tokens {
//!     // 保存轮换后的 token
//!     let _ = rotated;
//! }
//! # Ok(())
//! # }
//! ```

pub mod authorize;
pub mod client;
pub mod exchange;
pub mod pkce;
pub mod refresh;
pub mod token;
pub mod verify;

// ============================================================================
// Client 模块导出
// ============================================================================

pub use client::{AUTHORIZE_PATH, Client, ClientBuilder, TOKEN_PATH};

// ============================================================================
// 授权请求导出
// ============================================================================

pub use authorize::{AuthorizationRequestBuilder, AuthorizeOptions, AuthorizeResult};

// ============================================================================
// PKCE 模块导出
// ============================================================================

pub use pkce::{CODE_CHALLENGE_METHOD, Challenge, ChallengeBuilder, PkceChallenge};

// ============================================================================
// Token 模块导出
// ============================================================================

pub use refresh::RefreshOptions;
pub use token::{GrantType, ResponseType, TokenPair};
pub use verify::{VerifyOptions, VerifyResult};
