//! 授权码换取 token

use tracing::{debug, instrument, warn};

use super::client::Client;
use super::token::{GrantType, TokenPair};
use crate::error::{Error, Result};
use crate::transport::HttpRequest;

impl Client {
    /// 用授权码换取 token 对
    ///
    /// 向 `{issuer}/token` 提交 `grant_type=authorization_code`。
    /// 未使用 PKCE 时 `verifier` 传 `None`，请求中以空字符串发送 `code_verifier`。
    ///
    /// # 错误
    ///
    /// - 非 2xx 响应或响应体不符合 token 响应格式时返回
    ///   [`Error::InvalidAuthorizationCode`]
    /// - 请求未能完成时返回 [`Error::Transport`]
    #[instrument(skip_all, fields(issuer = %self.config.issuer), level = "debug")]
    pub async fn exchange(
        &self,
        code: &str,
        redirect_uri: &str,
        verifier: Option<&str>,
    ) -> Result<TokenPair> {
        let request = HttpRequest::form(
            self.token_url(),
            &[
                ("grant_type", GrantType::AuthorizationCode.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", self.config.client_id.as_str()),
                ("code_verifier", verifier.unwrap_or("")),
            ],
        );

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "authorization code rejected");
            return Err(Error::InvalidAuthorizationCode);
        }

        let tokens = TokenPair::from_response(&response).ok_or_else(|| {
            warn!("token endpoint returned a malformed body");
            Error::InvalidAuthorizationCode
        })?;

        debug!("authorization code exchanged");
        Ok(tokens)
    }
}
