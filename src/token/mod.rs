//! Token 模块
//!
//! 提供签名 Token 的数据类型、签名、验证以及密钥解析约定。
//!
//! ## 子模块
//!
//! - **jwt**: 紧凑签名格式（HS256）的生成与验证
//! - **resolver**: 由调用方提供的密钥解析策略
//!
//! ## 示例
//!
//! ```rust
//! use tokenauth::token::{parse, StaticSecret, Token, TokenKind};
//!
//! // 创建并签名
//! let signed = Token::new(TokenKind::User, "octocat")
//!     .sign("my-secret-key")
//!     .unwrap();
//!
//! // 验证
//! let token = parse(&signed, &StaticSecret::new("my-secret-key")).unwrap();
//! assert_eq!(token.kind, TokenKind::User);
//! assert_eq!(token.text, "octocat");
//! ```

pub mod jwt;
pub mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use jwt::{Claims, SIGNING_ALGORITHM, TokenVerifier, parse};
pub use resolver::{SecretResolver, StaticSecret};

/// Token 用途
///
/// 线上格式为字符串，未识别的值保存在 `Other` 中，调用方可以自定义用途。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenKind {
    /// 用户身份 (`user`)
    User,
    /// 会话 (`sess`)
    Session,
    /// Webhook / 集成 (`hook`)
    Hook,
    /// 防跨站请求伪造 (`csrf`)
    Csrf,
    /// 调用方自定义的用途
    Other(String),
}

impl TokenKind {
    /// 线上使用的字符串表示
    pub fn as_str(&self) -> &str {
        match self {
            TokenKind::User => "user",
            TokenKind::Session => "sess",
            TokenKind::Hook => "hook",
            TokenKind::Csrf => "csrf",
            TokenKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for TokenKind {
    fn from(kind: &str) -> Self {
        match kind {
            "user" => TokenKind::User,
            "sess" => TokenKind::Session,
            "hook" => TokenKind::Hook,
            "csrf" => TokenKind::Csrf,
            other => TokenKind::Other(other.to_string()),
        }
    }
}

impl From<String> for TokenKind {
    fn from(kind: String) -> Self {
        match TokenKind::from(kind.as_str()) {
            TokenKind::Other(_) => TokenKind::Other(kind),
            known => known,
        }
    }
}

impl From<TokenKind> for String {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 签名 Token
///
/// 由 [`Token::new`] 创建的值没有经过任何验证，不能当作已认证的凭证使用；
/// 只有 [`parse`] 或 [`TokenVerifier`] 返回的 Token 才是可信的。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 用途
    pub kind: TokenKind,
    /// 载荷，含义由 `kind` 决定（如用户登录名、会话 ID）
    pub text: String,
}

impl Token {
    /// 创建新的 Token
    pub fn new(kind: impl Into<TokenKind>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }
}
