//! Discovery 与 key set 缓存
//!
//! - **well_known** ([`DiscoveryCache`]): issuer 的 `/.well-known/oauth-authorization-server` 文档
//! - **jwks** ([`KeySetCache`]): 由 discovery 文档中 `jwks_uri` 指向的 JSON Web Key Set
//!
//! ## 缓存策略
//!
//! 两个缓存都以 issuer 为键，首次使用时惰性获取，之后在进程生命周期内一直有效，
//! 不会过期也不会刷新。已知限制：
//!
//! - 授权服务器轮换签名密钥后，使用新 `kid` 签发的 token 会以
//!   [`crate::error::TokenError::KeyNotFound`] 被拒绝，直到进程重启
//! - discovery 文档中端点的变更同样不会被察觉
//!
//! 缓存填充不加锁。同一 issuer 的两次并发首次访问可能各自请求一次，
//! 后写入的条目覆盖先写入的；两次请求得到的数据等价，因此这只是一次多余的请求。
//! 获取失败不会写入缓存，错误原样返回给调用方，下一次调用会重新请求。

pub mod jwks;
pub mod well_known;

pub use jwks::KeySetCache;
pub use well_known::{DiscoveryCache, WELL_KNOWN_PATH, WellKnown};
