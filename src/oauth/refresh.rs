//! Refresh token 轮换
//!
//! 调用方同时提供当前 access token 时，先在本地解码它的 `exp`：
//! 剩余有效期超过 `refresh_skew_secs`（默认 30 秒）则不发请求，直接返回
//! `Ok(None)`。这里的解码不校验签名，只用来决定是否需要网络往返。

use tracing::{debug, instrument, warn};

use super::client::Client;
use super::token::{GrantType, TokenPair};
use crate::error::{Error, Result};
use crate::token::claims::ExpiryClaim;
use crate::token::jwt::JwtVerifier;
use crate::transport::HttpRequest;

/// [`Client::refresh`] 的选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    /// 当前的 access token，提供时用于判断是否可以跳过刷新
    pub access: Option<String>,
}

impl RefreshOptions {
    /// 默认选项：总是刷新
    pub fn new() -> Self {
        Self::default()
    }

    /// 携带当前的 access token
    pub fn with_access(mut self, access: impl Into<String>) -> Self {
        self.access = Some(access.into());
        self
    }
}

impl Client {
    /// 用 refresh token 换取新的 token 对
    ///
    /// 返回 `Ok(None)` 表示 `options.access` 仍然有效，没有发起请求。
    ///
    /// # 错误
    ///
    /// - `options.access` 无法解码时返回 [`Error::InvalidAccessToken`]
    /// - 非 2xx 响应或响应体不符合 token 响应格式时返回
    ///   [`Error::InvalidRefreshToken`]
    /// - 请求未能完成时返回 [`Error::Transport`]
    #[instrument(skip_all, fields(issuer = %self.config.issuer), level = "debug")]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        options: &RefreshOptions,
    ) -> Result<Option<TokenPair>> {
        if let Some(access) = options.access.as_deref() {
            let claim: ExpiryClaim = JwtVerifier::decode_unverified(access)?;
            if claim.is_fresh_for(self.config.refresh_skew_secs) {
                debug!(exp = ?claim.exp, "access token still fresh, skipping refresh");
                return Ok(None);
            }
        }

        let request = HttpRequest::form(
            self.token_url(),
            &[
                ("grant_type", GrantType::RefreshToken.as_str()),
                ("refresh_token", refresh_token),
            ],
        );

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "refresh token rejected");
            return Err(Error::InvalidRefreshToken);
        }

        let tokens = TokenPair::from_response(&response).ok_or_else(|| {
            warn!("token endpoint returned a malformed body");
            Error::InvalidRefreshToken
        })?;

        debug!("tokens refreshed");
        Ok(Some(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use crate::transport::{HttpResponse, MockTransport};
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const TOKEN_URL: &str = "https://auth.example.com/token";

    fn client(mock: &MockTransport) -> Client {
        Client::builder()
            .client_id("my-client")
            .issuer("https://auth.example.com")
            .transport(mock.clone())
            .build()
            .unwrap()
    }

    fn access_expiring_in(secs: i64) -> String {
        encode(
            &Header::default(),
            &json!({ "mode": "access", "exp": Utc::now().timestamp() + secs }),
            &EncodingKey::from_secret(b"unused"),
        )
        .unwrap()
    }

    fn mock_with_tokens() -> MockTransport {
        let mock = MockTransport::new();
        mock.insert_response(
            TOKEN_URL,
            HttpResponse::json_body(
                200,
                &json!({ "access_token": "new-at", "refresh_token": "new-rt", "expires_in": 900 }),
            ),
        );
        mock
    }

    #[tokio::test]
    async fn test_refresh_without_access_always_calls() {
        let mock = mock_with_tokens();

        let tokens = client(&mock)
            .refresh("rt", &RefreshOptions::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(tokens.access, "new-at");
        assert_eq!(tokens.expires_in, Some(900));
        let params = mock.requests()[0].form_params();
        assert_eq!(params["grant_type"], "refresh_token");
        assert_eq!(params["refresh_token"], "rt");
    }

    #[tokio::test]
    async fn test_fresh_access_short_circuits() {
        let mock = mock_with_tokens();

        let result = client(&mock)
            .refresh("rt", &RefreshOptions::new().with_access(access_expiring_in(120)))
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_access_near_expiry_refreshes() {
        let mock = mock_with_tokens();

        let result = client(&mock)
            .refresh("rt", &RefreshOptions::new().with_access(access_expiring_in(10)))
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(mock.call_count(TOKEN_URL), 1);
    }

    #[tokio::test]
    async fn test_undecodable_access() {
        let mock = mock_with_tokens();

        let err = client(&mock)
            .refresh("rt", &RefreshOptions::new().with_access("garbage"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidAccessToken(TokenError::InvalidFormat(_))
        ));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let mock = MockTransport::new();
        mock.insert_response(
            TOKEN_URL,
            HttpResponse::json_body(401, &json!({ "error": "invalid_grant" })),
        );

        let err = client(&mock)
            .refresh("revoked", &RefreshOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_empty_tokens_rejected() {
        let mock = MockTransport::new();
        mock.insert_response(
            TOKEN_URL,
            HttpResponse::json_body(200, &json!({ "access_token": "", "refresh_token": "" })),
        );

        let err = client(&mock)
            .refresh("rt", &RefreshOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRefreshToken));
    }
}
