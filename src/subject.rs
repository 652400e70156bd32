//! Subject schema
//!
//! 应用通过 [`SubjectSchema`] 声明 access token 中可能出现的 subject 类型：
//! 每个类型标签（claims 中的 `type`）对应一个 [`SubjectValidator`]。
//! 验证时按标签查表一次，再用对应的 validator 校验 `properties`。
//!
//! 最常见的 validator 是 [`SerdeSubject`]：payload 能反序列化为给定类型即视为通过。
//!
//! ## 示例
//!
//! ```rust
//! use authrs_client::subject::SubjectSchema;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     id: String,
//! }
//!
//! let schema = SubjectSchema::new()
//!     .subject::<User>("user")
//!     .validator("service", |props: &serde_json::Value| {
//!         if props.get("name").and_then(|v| v.as_str()).is_some() {
//!             Ok(props.clone())
//!         } else {
//!             Err(vec!["name is required".to_string()])
//!         }
//!     });
//!
//! let subject = schema
//!     .validate("user", &serde_json::json!({ "id": "u1", "extra": true }))
//!     .unwrap();
//! assert_eq!(subject.kind, "user");
//! let user: User = subject.properties_as().unwrap();
//! assert_eq!(user.id, "u1");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SubjectError;

/// 校验 subject payload 的能力
///
/// 通过时返回校验后的值（可以是规范化后的 payload），否则返回问题列表
pub trait SubjectValidator: Send + Sync {
    /// 校验 payload
    fn validate(&self, properties: &serde_json::Value) -> Result<serde_json::Value, Vec<String>>;
}

impl<F> SubjectValidator for F
where
    F: Fn(&serde_json::Value) -> Result<serde_json::Value, Vec<String>> + Send + Sync,
{
    fn validate(&self, properties: &serde_json::Value) -> Result<serde_json::Value, Vec<String>> {
        self(properties)
    }
}

/// 以 serde 类型作为 shape 的 validator
///
/// payload 先反序列化为 `T` 再序列化回 JSON，因此结果只保留 `T` 声明的字段
pub struct SerdeSubject<T> {
    _shape: PhantomData<fn() -> T>,
}

impl<T> SerdeSubject<T> {
    /// 创建 validator
    pub fn new() -> Self {
        Self {
            _shape: PhantomData,
        }
    }
}

impl<T> Default for SerdeSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SubjectValidator for SerdeSubject<T>
where
    T: DeserializeOwned + Serialize,
{
    fn validate(&self, properties: &serde_json::Value) -> Result<serde_json::Value, Vec<String>> {
        let shaped: T =
            serde_json::from_value(properties.clone()).map_err(|e| vec![e.to_string()])?;
        serde_json::to_value(shaped).map_err(|e| vec![e.to_string()])
    }
}

/// subject 类型标签到 validator 的注册表
#[derive(Clone, Default)]
pub struct SubjectSchema {
    validators: HashMap<String, Arc<dyn SubjectValidator>>,
}

impl SubjectSchema {
    /// 创建空的 schema
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个以 serde 类型为 shape 的 subject
    pub fn subject<T>(self, kind: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Serialize + 'static,
    {
        self.validator(kind, SerdeSubject::<T>::new())
    }

    /// 注册自定义 validator
    pub fn validator<V>(mut self, kind: impl Into<String>, validator: V) -> Self
    where
        V: SubjectValidator + 'static,
    {
        self.validators.insert(kind.into(), Arc::new(validator));
        self
    }

    /// 查找类型标签对应的 validator
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn SubjectValidator>> {
        self.validators.get(kind)
    }

    /// 已注册的类型标签
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// 是否没有注册任何类型
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// 按类型标签校验 payload
    pub fn validate(
        &self,
        kind: &str,
        properties: &serde_json::Value,
    ) -> Result<VerifiedSubject, SubjectError> {
        let validator = self
            .get(kind)
            .ok_or_else(|| SubjectError::UnknownType(kind.to_string()))?;

        let properties = validator
            .validate(properties)
            .map_err(|issues| SubjectError::Rejected {
                kind: kind.to_string(),
                issues,
            })?;

        Ok(VerifiedSubject {
            kind: kind.to_string(),
            properties,
        })
    }
}

impl fmt::Debug for SubjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.kinds().collect();
        kinds.sort_unstable();
        f.debug_struct("SubjectSchema").field("kinds", &kinds).finish()
    }
}

/// 通过校验的 subject
///
/// `kind` 是 schema 中的某个类型标签，`properties` 是该类型 validator 的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedSubject {
    /// 类型标签
    #[serde(rename = "type")]
    pub kind: String,

    /// 校验后的 payload
    pub properties: serde_json::Value,
}

impl VerifiedSubject {
    /// 将 payload 反序列化为具体类型
    pub fn properties_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.properties.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        email: String,
    }

    fn schema() -> SubjectSchema {
        SubjectSchema::new().subject::<User>("user")
    }

    #[test]
    fn test_serde_subject_accepts_valid_payload() {
        let subject = schema()
            .validate("user", &json!({ "id": "u1", "email": "a@example.com" }))
            .unwrap();

        assert_eq!(subject.kind, "user");
        assert_eq!(
            subject.properties_as::<User>().unwrap(),
            User {
                id: "u1".to_string(),
                email: "a@example.com".to_string()
            }
        );
    }

    #[test]
    fn test_serde_subject_strips_unknown_fields() {
        let subject = schema()
            .validate(
                "user",
                &json!({ "id": "u1", "email": "a@example.com", "admin": true }),
            )
            .unwrap();
        assert!(subject.properties.get("admin").is_none());
    }

    #[test]
    fn test_serde_subject_rejects_invalid_payload() {
        let err = schema().validate("user", &json!({ "id": 42 })).unwrap_err();
        match err {
            SubjectError::Rejected { kind, issues } => {
                assert_eq!(kind, "user");
                assert_eq!(issues.len(), 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind() {
        let err = schema().validate("admin", &json!({})).unwrap_err();
        assert_eq!(err, SubjectError::UnknownType("admin".to_string()));
    }

    #[test]
    fn test_closure_validator() {
        let schema = SubjectSchema::new().validator("service", |props: &serde_json::Value| {
            match props.get("name").and_then(|v| v.as_str()) {
                Some(name) => Ok(json!({ "name": name.to_lowercase() })),
                None => Err(vec!["name is required".to_string()]),
            }
        });

        let subject = schema.validate("service", &json!({ "name": "Billing" })).unwrap();
        assert_eq!(subject.properties, json!({ "name": "billing" }));
        assert!(schema.validate("service", &json!({})).is_err());
    }

    #[test]
    fn test_kinds() {
        let schema = schema().subject::<serde_json::Value>("anything");
        let mut kinds: Vec<&str> = schema.kinds().collect();
        kinds.sort_unstable();
        assert_eq!(kinds, vec!["anything", "user"]);
        assert!(!schema.is_empty());
        assert!(SubjectSchema::new().is_empty());
    }

    #[test]
    fn test_verified_subject_serializes_type_tag() {
        let subject = VerifiedSubject {
            kind: "user".to_string(),
            properties: json!({ "id": "u1" }),
        };
        assert_eq!(
            serde_json::to_value(&subject).unwrap(),
            json!({ "type": "user", "properties": { "id": "u1" } })
        );
    }
}
