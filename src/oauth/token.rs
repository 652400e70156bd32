//! Token 端点的请求与响应结构
//!
//! token 端点的响应按严格 schema 解析：`access_token` 和 `refresh_token`
//! 必须存在且非空，否则视为被拒绝，而不是产生空值。

use serde::{Deserialize, Serialize};

use crate::transport::HttpResponse;

/// OAuth 授权类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    /// 授权码
    AuthorizationCode,
    /// 刷新令牌
    RefreshToken,
}

impl GrantType {
    /// 转换为 OAuth 2.0 参数字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 授权请求的 response_type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    /// 授权码流程
    #[default]
    Code,
    /// 隐式流程
    Token,
}

impl ResponseType {
    /// 转换为 OAuth 2.0 参数字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Code => "code",
            ResponseType::Token => "token",
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Access Token 和 Refresh Token 对
///
/// 不透明的 bearer 凭证，签发后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access Token
    pub access: String,

    /// Refresh Token
    pub refresh: String,

    /// Access Token 有效期（秒），服务器未返回时为 `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// token 端点响应的线上格式
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenPair {
    /// 从 token 端点的成功响应解析
    ///
    /// 响应体不是 JSON、缺少字段或字段为空时返回 `None`
    pub(crate) fn from_response(response: &HttpResponse) -> Option<Self> {
        let body: TokenEndpointResponse = response.json().ok()?;
        if body.access_token.is_empty() || body.refresh_token.is_empty() {
            return None;
        }

        Some(Self {
            access: body.access_token,
            refresh: body.refresh_token,
            expires_in: body.expires_in,
        })
    }
}
