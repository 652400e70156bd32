//! Access token 的 claims 结构

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// access token 的 `mode` 值
pub const ACCESS_MODE: &str = "access";

/// 授权服务器签发的 access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// token 用途，访问令牌为 `access`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// subject 类型标签，对应 [`crate::subject::SubjectSchema`] 中注册的名称
    #[serde(rename = "type", default)]
    pub kind: String,

    /// subject 的 payload
    #[serde(default)]
    pub properties: serde_json::Value,

    /// 过期时间（Unix 时间戳）
    pub exp: i64,

    /// 接收者（client id）
    pub aud: String,

    /// 签发者
    pub iss: String,
}

impl AccessClaims {
    /// 是否为 access 模式的 token
    pub fn is_access(&self) -> bool {
        self.mode.as_deref() == Some(ACCESS_MODE)
    }
}

/// 判断是否需要刷新时只关心 `exp`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExpiryClaim {
    /// 过期时间（Unix 时间戳），缺失视为已过期
    #[serde(default)]
    pub exp: Option<i64>,
}

impl ExpiryClaim {
    /// 剩余有效期是否超过 `skew_secs` 秒
    pub fn is_fresh_for(&self, skew_secs: i64) -> bool {
        self.is_fresh_at(Utc::now().timestamp(), skew_secs)
    }

    /// 以 `now` 为当前时间判断剩余有效期是否超过 `skew_secs` 秒
    pub fn is_fresh_at(&self, now: i64, skew_secs: i64) -> bool {
        self.exp.is_some_and(|exp| exp > now.saturating_add(skew_secs))
    }
}
