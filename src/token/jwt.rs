//! 基于 key set 的 JWT 验证
//!
//! 签名校验本身由 `jsonwebtoken` 完成，本模块负责：
//!
//! - 按 token header 的 `kid` 从 key set 中选择密钥
//! - 限制可接受的签名算法
//! - 绑定 issuer、可选的 audience，并校验 `exp` / `nbf`
//! - 将 `jsonwebtoken` 的错误映射为 [`TokenError`]
//!
//! ## 示例
//!
//! ```rust
//! use authrs_client::token::jwt::JwtVerifier;
//! use jsonwebtoken::Algorithm;
//!
//! let verifier = JwtVerifier::new("https://auth.example.com", vec![Algorithm::RS256])
//!     .with_leeway(5);
//! assert_eq!(verifier.issuer(), "https://auth.example.com");
//! ```

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{
    Algorithm, DecodingKey, TokenData, Validation, dangerous::insecure_decode, decode,
    decode_header,
};
use serde::de::DeserializeOwned;

use crate::error::TokenError;

/// JWT 验证器
///
/// 绑定单一 issuer，key set 由调用方提供（通常来自 [`crate::discovery::KeySetCache`]）
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    issuer: String,
    algorithms: Vec<Algorithm>,
    leeway: u64,
}

impl JwtVerifier {
    /// 创建验证器
    pub fn new(issuer: impl Into<String>, algorithms: Vec<Algorithm>) -> Self {
        Self {
            issuer: issuer.into(),
            algorithms,
            leeway: 0,
        }
    }

    /// 设置时钟偏差容忍度（秒）
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// 绑定的 issuer
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// 使用 key set 验证 token 并解码 claims
    ///
    /// `audience` 为 `Some` 时要求 `aud` 与之相等
    pub fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        keys: &JwkSet,
        audience: Option<&str>,
    ) -> Result<T, TokenError> {
        let header = decode_header(token).map_err(map_jwt_error)?;

        if !self.algorithms.contains(&header.alg) {
            return Err(TokenError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let jwk = select_jwk(keys, header.kid.as_deref())?;
        if let Some(key_alg) = &jwk.common.key_algorithm {
            // key set 声明了算法时，token header 不能另选算法
            if signing_algorithm(key_alg) != Some(header.alg) {
                return Err(TokenError::UnsupportedAlgorithm(format!(
                    "{:?} does not match key algorithm {:?}",
                    header.alg, key_alg
                )));
            }
        }

        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| TokenError::DecodingFailed(format!("invalid key: {}", e)))?;

        let validation = self.build_validation(header.alg, audience);
        let token_data: TokenData<T> =
            decode(token, &key, &validation).map_err(map_jwt_error)?;

        Ok(token_data.claims)
    }

    /// 不验证签名，仅解码 claims
    ///
    /// 只能用于已经信任的 token（例如判断是否需要刷新）
    pub fn decode_unverified<T: DeserializeOwned>(token: &str) -> Result<T, TokenError> {
        let token_data: TokenData<T> = insecure_decode(token).map_err(map_jwt_error)?;
        Ok(token_data.claims)
    }

    fn build_validation(&self, alg: Algorithm, audience: Option<&str>) -> Validation {
        let mut validation = Validation::new(alg);
        validation.algorithms = vec![alg];
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = self.leeway;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[self.issuer.as_str()]);

        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        validation
    }
}

/// JWK `alg` 对应的 JWS 签名算法；加密用途的算法没有对应项
fn signing_algorithm(key_alg: &KeyAlgorithm) -> Option<Algorithm> {
    match key_alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

/// 按 `kid` 选择密钥；header 没有 `kid` 时只接受单密钥的 key set
fn select_jwk<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Result<&'a Jwk, TokenError> {
    if let Some(kid) = kid {
        return keys
            .find(kid)
            .ok_or_else(|| TokenError::KeyNotFound(kid.to_string()));
    }

    match keys.keys.as_slice() {
        [only] => Ok(only),
        [] => Err(TokenError::KeyNotFound("key set is empty".to_string())),
        _ => Err(TokenError::KeyNotFound(
            "token has no kid and key set holds multiple keys".to_string(),
        )),
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidIssuer => TokenError::InvalidClaim("invalid issuer".to_string()),
        ErrorKind::InvalidAudience => TokenError::InvalidClaim("invalid audience".to_string()),
        ErrorKind::ImmatureSignature => {
            TokenError::InvalidClaim("token not yet valid".to_string())
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            TokenError::InvalidClaim(format!("missing required claim: {}", claim))
        }
        ErrorKind::InvalidAlgorithm => {
            TokenError::UnsupportedAlgorithm("algorithm does not match key".to_string())
        }
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::InvalidFormat(e.to_string()),
        _ => TokenError::DecodingFailed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Deserialize;
    use serde_json::json;

    const ISSUER: &str = "https://auth.example.com";
    const SECRET: &[u8] = b"authrs-client-test-signing-key-01234567";

    #[derive(Debug, Deserialize)]
    struct TestClaims {
        sub: String,
    }

    fn key_set(kids: &[&str]) -> JwkSet {
        let keys: Vec<_> = kids
            .iter()
            .map(|kid| {
                json!({
                    "kty": "oct",
                    "kid": kid,
                    "alg": "HS256",
                    "k": URL_SAFE_NO_PAD.encode(SECRET),
                })
            })
            .collect();
        serde_json::from_value(json!({ "keys": keys })).unwrap()
    }

    fn sign(kid: Option<&str>, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = kid.map(str::to_string);
        encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(ISSUER, vec![Algorithm::HS256])
    }

    fn claims(exp_offset: i64) -> serde_json::Value {
        json!({
            "sub": "user_123",
            "iss": ISSUER,
            "aud": "my-client",
            "exp": Utc::now().timestamp() + exp_offset,
        })
    }

    #[test]
    fn test_verify_valid_token() {
        let token = sign(Some("k1"), claims(3600));
        let decoded: TestClaims = verifier().verify(&token, &key_set(&["k1"]), None).unwrap();
        assert_eq!(decoded.sub, "user_123");
    }

    #[test]
    fn test_verify_expired_token() {
        let token = sign(Some("k1"), claims(-3600));
        let result: Result<TestClaims, _> = verifier().verify(&token, &key_set(&["k1"]), None);
        assert_eq!(result.unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_verify_wrong_issuer() {
        let mut c = claims(3600);
        c["iss"] = json!("https://evil.example.com");
        let token = sign(Some("k1"), c);
        let result: Result<TestClaims, _> = verifier().verify(&token, &key_set(&["k1"]), None);
        assert!(matches!(result, Err(TokenError::InvalidClaim(_))));
    }

    #[test]
    fn test_verify_missing_issuer() {
        let mut c = claims(3600);
        c.as_object_mut().unwrap().remove("iss");
        let token = sign(Some("k1"), c);
        let result: Result<TestClaims, _> = verifier().verify(&token, &key_set(&["k1"]), None);
        assert!(matches!(result, Err(TokenError::InvalidClaim(_))));
    }

    #[test]
    fn test_verify_audience() {
        let token = sign(Some("k1"), claims(3600));
        let keys = key_set(&["k1"]);

        let ok: Result<TestClaims, _> = verifier().verify(&token, &keys, Some("my-client"));
        assert!(ok.is_ok());

        let wrong: Result<TestClaims, _> = verifier().verify(&token, &keys, Some("other"));
        assert!(matches!(wrong, Err(TokenError::InvalidClaim(_))));
    }

    #[test]
    fn test_verify_not_yet_valid() {
        let mut c = claims(3600);
        c["nbf"] = json!(Utc::now().timestamp() + 600);
        let token = sign(Some("k1"), c);

        let result: Result<TestClaims, _> = verifier().verify(&token, &key_set(&["k1"]), None);
        assert!(matches!(result, Err(TokenError::InvalidClaim(_))));
    }

    #[test]
    fn test_verify_rejects_key_algorithm_mismatch() {
        let token = sign(Some("k1"), claims(3600));

        for declared in ["HS384", "RSA-OAEP"] {
            let keys: JwkSet = serde_json::from_value(json!({
                "keys": [{
                    "kty": "oct",
                    "kid": "k1",
                    "alg": declared,
                    "k": URL_SAFE_NO_PAD.encode(SECRET),
                }]
            }))
            .unwrap();

            let result: Result<TestClaims, _> = verifier().verify(&token, &keys, None);
            assert!(
                matches!(result, Err(TokenError::UnsupportedAlgorithm(_))),
                "key declared {} should not accept HS256",
                declared
            );
        }
    }

    #[test]
    fn test_verify_bad_signature() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("k1".to_string());
        let token = encode(
            &header,
            &claims(3600),
            &EncodingKey::from_secret(b"another-secret-that-is-long-enough!!"),
        )
        .unwrap();

        let result: Result<TestClaims, _> = verifier().verify(&token, &key_set(&["k1"]), None);
        assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn test_verify_unknown_kid() {
        let token = sign(Some("rotated"), claims(3600));
        let result: Result<TestClaims, _> = verifier().verify(&token, &key_set(&["k1"]), None);
        assert!(matches!(result, Err(TokenError::KeyNotFound(_))));
    }

    #[test]
    fn test_verify_without_kid() {
        let token = sign(None, claims(3600));

        let single: Result<TestClaims, _> = verifier().verify(&token, &key_set(&["k1"]), None);
        assert!(single.is_ok());

        let multiple: Result<TestClaims, _> =
            verifier().verify(&token, &key_set(&["k1", "k2"]), None);
        assert!(matches!(multiple, Err(TokenError::KeyNotFound(_))));
    }

    #[test]
    fn test_verify_rejects_unlisted_algorithm() {
        let token = sign(Some("k1"), claims(3600));
        let strict = JwtVerifier::new(ISSUER, vec![Algorithm::RS256]);
        let result: Result<TestClaims, _> = strict.verify(&token, &key_set(&["k1"]), None);
        assert!(matches!(result, Err(TokenError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_verify_malformed_token() {
        let result: Result<TestClaims, _> =
            verifier().verify("not-a-jwt", &key_set(&["k1"]), None);
        assert!(matches!(result, Err(TokenError::InvalidFormat(_))));
    }

    #[test]
    fn test_leeway_accepts_recently_expired() {
        let token = sign(Some("k1"), claims(-5));
        let lenient = verifier().with_leeway(60);
        let result: Result<TestClaims, _> = lenient.verify(&token, &key_set(&["k1"]), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_decode_unverified() {
        let token = sign(Some("k1"), claims(-3600));
        let decoded: TestClaims = JwtVerifier::decode_unverified(&token).unwrap();
        assert_eq!(decoded.sub, "user_123");

        let bad: Result<TestClaims, _> = JwtVerifier::decode_unverified("garbage");
        assert!(bad.is_err());
    }
}
