//! Token 模块
//!
//! 本地处理 access token 的部分：
//!
//! - **claims**: access token 的 claims 结构
//! - **jwt**: 基于 key set 的签名验证，以及不验证签名的解码
//!
//! 网络相关的 token 操作（换取、刷新）见 [`crate::oauth`]。

pub mod claims;
pub mod jwt;

pub use claims::{ACCESS_MODE, AccessClaims, ExpiryClaim};
pub use jwt::JwtVerifier;
