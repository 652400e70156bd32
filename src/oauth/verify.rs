//! Access token 验证
//!
//! [`Client::verify`] 的流程：
//!
//! 1. 从缓存（或首次经 discovery 取得）issuer 的 key set
//! 2. 校验签名、issuer 与 `exp`，可选校验 audience
//! 3. 要求 `mode` 为 `access`，并按 `type` 用 [`SubjectSchema`] 校验 `properties`
//!
//! token 过期且调用方提供了 refresh token 时，会刷新一次并用新的 access token
//! 重新验证。重试最多一次：刷新得到的 token 仍然过期时直接返回错误，
//! 不会继续刷新。

use tracing::{debug, instrument, warn};

use super::client::Client;
use super::refresh::RefreshOptions;
use super::token::TokenPair;
use crate::error::{Error, Result, SubjectError};
use crate::subject::{SubjectSchema, VerifiedSubject};
use crate::token::claims::AccessClaims;
use crate::token::jwt::JwtVerifier;

/// [`Client::verify`] 的选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// access token 过期时用来刷新的 refresh token
    pub refresh: Option<String>,

    /// 要求 `aud` 与之相等
    pub audience: Option<String>,
}

impl VerifyOptions {
    /// 默认选项：不刷新，不校验 audience
    pub fn new() -> Self {
        Self::default()
    }

    /// 过期时使用该 refresh token 刷新
    pub fn with_refresh(mut self, refresh: impl Into<String>) -> Self {
        self.refresh = Some(refresh.into());
        self
    }

    /// 校验 audience
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// 验证结果
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyResult {
    /// token 的 `aud`
    pub audience: String,

    /// 通过 schema 校验的 subject
    pub subject: VerifiedSubject,

    /// 验证过程中刷新得到的新 token；未刷新时为 `None`
    pub tokens: Option<TokenPair>,
}

impl Client {
    /// 验证 access token 并解析 subject
    ///
    /// # 错误
    ///
    /// - 签名、issuer、audience 或格式不合法时返回 [`Error::InvalidAccessToken`]；
    ///   过期且没有 refresh token，或刷新后仍然过期，也返回该错误
    /// - `mode` 不是 `access` 或 subject 不符合 schema 时返回 [`Error::InvalidSubject`]
    /// - 刷新失败时原样返回刷新的错误（通常是 [`Error::InvalidRefreshToken`]）
    /// - key set 获取失败时返回 [`Error::Transport`]
    #[instrument(skip_all, fields(issuer = %self.config.issuer), level = "debug")]
    pub async fn verify(
        &self,
        schema: &SubjectSchema,
        token: &str,
        options: &VerifyOptions,
    ) -> Result<VerifyResult> {
        let audience = options.audience.as_deref();

        let err = match self.verify_once(schema, token, audience).await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        let refresh_token = match options.refresh.as_deref() {
            Some(refresh_token) if err.is_expired() => refresh_token,
            _ => return Err(err),
        };

        debug!("access token expired, refreshing once");
        let tokens = self
            .refresh(refresh_token, &RefreshOptions::default())
            .await?
            .ok_or(Error::InvalidRefreshToken)?;

        // 第二次验证不再携带 refresh token，保证只重试一次
        match self.verify_once(schema, &tokens.access, audience).await {
            Ok(mut result) => {
                result.tokens = Some(tokens);
                Ok(result)
            }
            Err(err) => {
                if err.is_expired() {
                    warn!("refreshed access token is already expired");
                }
                Err(err)
            }
        }
    }

    /// 不校验签名，解码 access token 并按 schema 校验 subject
    ///
    /// 只适用于 token 已经由其他途径验证过的场景
    pub fn decode(&self, schema: &SubjectSchema, token: &str) -> Result<VerifiedSubject> {
        let claims: AccessClaims = JwtVerifier::decode_unverified(token)?;
        subject_of(schema, &claims)
    }

    async fn verify_once(
        &self,
        schema: &SubjectSchema,
        token: &str,
        audience: Option<&str>,
    ) -> Result<VerifyResult> {
        let keys = self
            .key_sets
            .get(self.transport.as_ref(), &self.discovery, &self.config.issuer)
            .await?;

        let claims: AccessClaims = self.verifier.verify(token, &keys, audience)?;
        let subject = subject_of(schema, &claims)?;

        Ok(VerifyResult {
            audience: claims.aud,
            subject,
            tokens: None,
        })
    }
}

fn subject_of(schema: &SubjectSchema, claims: &AccessClaims) -> Result<VerifiedSubject> {
    if !claims.is_access() {
        return Err(Error::InvalidSubject(SubjectError::NotAccessToken));
    }

    Ok(schema.validate(&claims.kind, &claims.properties)?)
}
