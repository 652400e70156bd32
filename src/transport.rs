//! HTTP 传输层
//!
//! 客户端的所有网络访问都经过 [`Transport`] trait，调用方可以注入自己的实现
//! （例如带超时、代理或重试的 HTTP 客户端）。客户端本身不设置超时，也不重试
//! 传输失败，需要这些行为时应在 transport 中实现。
//!
//! - [`ReqwestTransport`]：基于 `reqwest` 的默认实现（需启用 `reqwest` feature）
//! - [`MockTransport`]：内存中的桩实现，用于测试

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

/// HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

impl Method {
    /// 方法名
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// 发往授权服务器的请求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP 方法
    pub method: Method,
    /// 目标 URL
    pub url: String,
    /// 请求头
    pub headers: Vec<(String, String)>,
    /// 请求体
    pub body: Option<String>,
}

impl HttpRequest {
    /// 创建 GET 请求
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    /// 创建 `application/x-www-form-urlencoded` 的 POST 请求
    pub fn form<K, V>(url: impl Into<String>, params: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
            .finish();

        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![
                (
                    "content-type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ),
                ("accept".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        }
    }

    /// 解析表单请求体中的参数
    pub fn form_params(&self) -> HashMap<String, String> {
        self.body
            .as_deref()
            .map(|body| {
                url::form_urlencoded::parse(body.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 授权服务器的响应
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP 状态码
    pub status: u16,
    /// 响应体
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// 创建响应
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 创建 JSON 响应
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    /// 状态码是否为 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 将响应体解析为 JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// 可注入的 HTTP 传输
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求并返回响应
    ///
    /// 非 2xx 状态码不是错误，只有请求本身未能完成时才返回 `Err`
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// 基于 `reqwest` 的 transport
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestTransport {
    /// 使用默认的 `reqwest::Client` 创建
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义的 `reqwest::Client` 创建（用于配置超时、代理等）
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request {
                url,
                message: e.to_string(),
            })?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

type Handler = dyn Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync;

/// 内存中的 transport 桩实现
///
/// 先按 URL 查找预置响应，未命中时交给 handler；都未命中则返回
/// [`TransportError::Request`]。所有请求都会被记录下来供断言使用。
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, HttpResponse>>>,
    handler: Option<Arc<Handler>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// 创建空的桩实现
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用 handler 创建
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Option<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            ..Self::default()
        }
    }

    /// 为指定 URL 注册响应
    pub fn insert_response(&self, url: impl Into<String>, response: HttpResponse) {
        lock(&self.responses).insert(url.into(), response);
    }

    /// 已记录的全部请求
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// 发往指定 URL 的请求数
    pub fn call_count(&self, url: &str) -> usize {
        lock(&self.requests).iter().filter(|r| r.url == url).count()
    }

    /// 表单参数 `key` 等于 `value` 的请求数
    pub fn form_call_count(&self, key: &str, value: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|r| r.form_params().get(key).map(String::as_str) == Some(value))
            .count()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("responses", &lock(&self.responses).len())
            .field("requests", &lock(&self.requests).len())
            .finish()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request.clone());

        if let Some(response) = lock(&self.responses).get(&request.url) {
            return Ok(response.clone());
        }

        self.handler
            .as_ref()
            .and_then(|handler| handler(&request))
            .ok_or_else(|| TransportError::Request {
                url: request.url,
                message: "no mock response for url".to_string(),
            })
    }
}

// 桩实现中的锁只保护简单容器，poisoned 时继续使用内部数据
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
