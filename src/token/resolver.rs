//! 密钥解析
//!
//! 验证时由调用方决定用哪个密钥：解析器拿到只解码、尚未验证的 Token
//! （`kind` 与 `text` 已填充），返回用于验证签名的密钥。这样可以按用途
//! 或按用户使用不同的密钥，而本库不持有任何密钥存储。
//!
//! 解析器返回的错误会原样传递给调用方。
//!
//! ```rust
//! use tokenauth::error::{Error, Result};
//! use tokenauth::token::{parse, Token, TokenKind};
//!
//! let resolver = |token: &Token| -> Result<String> {
//!     match token.kind {
//!         TokenKind::Hook => Ok("hook-secret".to_string()),
//!         _ => Err(Error::resolution("unexpected token kind")),
//!     }
//! };
//!
//! let signed = Token::new(TokenKind::Hook, "repo-1").sign("hook-secret").unwrap();
//! assert!(parse(&signed, &resolver).is_ok());
//! ```

use super::Token;
use crate::error::Result;

/// 密钥解析器
///
/// 每次验证调用一次，可以阻塞（例如查询数据库）。本库不缓存其结果。
pub trait SecretResolver {
    /// 为尚未验证的 Token 返回验证密钥
    fn resolve(&self, token: &Token) -> Result<String>;
}

impl<F> SecretResolver for F
where
    F: Fn(&Token) -> Result<String>,
{
    fn resolve(&self, token: &Token) -> Result<String> {
        self(token)
    }
}

/// 对所有 Token 返回同一个密钥
#[derive(Clone)]
pub struct StaticSecret(String);

impl StaticSecret {
    /// 创建固定密钥解析器
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl std::fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticSecret(..)")
    }
}

impl SecretResolver for StaticSecret {
    fn resolve(&self, _token: &Token) -> Result<String> {
        Ok(self.0.clone())
    }
}
