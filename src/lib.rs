//! # tokenauth
//!
//! 无状态的签名 bearer token 认证与 CSRF 校验核心。
//!
//! ## 功能特性
//!
//! - **签名 Token**: 用途 (`kind`) + 主体 (`text`)，以 HS256 签名为 JWS 紧凑格式
//! - **密钥解析**: 验证时由调用方根据未验证的 token 提供密钥
//! - **请求提取**: 依次查找 `Authorization: Bearer`、`access_token` 参数、`user_sess` Cookie
//! - **CSRF 防护**: `GET`、`OPTIONS` 之外的请求必须携带 `X-CSRF-TOKEN`
//! - **缓存旁路助手**: 以字符串为键的读穿缓存接口
//!
//! 本库不持有任何密钥、会话或吊销列表，所有状态都来自调用方。
//!
//! ## Token 签名与验证示例
//!
//! ```rust
//! use tokenauth::{parse, Token, TokenKind};
//! use tokenauth::error::{Error, Result, TokenError};
//!
//! let signed = Token::new(TokenKind::User, "octocat").sign("user-hash").unwrap();
//!
//! // 按用户查找密钥
//! let resolver = |token: &Token| -> Result<String> {
//!     match token.text.as_str() {
//!         "octocat" => Ok("user-hash".to_string()),
//!         _ => Err(Error::resolution("unknown user")),
//!     }
//! };
//!
//! let token = parse(&signed, &resolver).unwrap();
//! assert_eq!(token.kind, TokenKind::User);
//! assert_eq!(token.text, "octocat");
//!
//! // 错误的密钥
//! let other = Token::new(TokenKind::User, "octocat").sign("stale-hash").unwrap();
//! assert!(matches!(
//!     parse(&other, &resolver),
//!     Err(Error::Token(TokenError::InvalidSignature))
//! ));
//! ```
//!
//! ## 过期时间
//!
//! ```rust
//! use chrono::Duration;
//! use tokenauth::{StaticSecret, Token, TokenKind, TokenVerifier};
//!
//! let signed = Token::new(TokenKind::Session, "octocat")
//!     .sign_expires_in("secret", Duration::hours(72))
//!     .unwrap();
//!
//! let verifier = TokenVerifier::new().with_leeway(30);
//! assert!(verifier.parse(&signed, &StaticSecret::new("secret")).is_ok());
//! ```
//!
//! ## 请求处理示例
//!
//! ```rust
//! use http::Request;
//! use tokenauth::{check_csrf, issue_csrf_token, parse_request, StaticSecret, Token, TokenKind};
//!
//! let secret = StaticSecret::new("user-hash");
//! let session = Token::new(TokenKind::Session, "octocat").sign("user-hash").unwrap();
//!
//! // GET 请求只需要凭证
//! let request = Request::get("/api/user")
//!     .header("Cookie", format!("user_sess={}", session))
//!     .body(())
//!     .unwrap();
//! assert_eq!(parse_request(&request, &secret).unwrap().text, "octocat");
//! assert!(check_csrf(&request, &secret).is_ok());
//!
//! // POST 请求还需要 CSRF 请求头
//! let request = Request::post("/api/repos/octocat/hello")
//!     .header("Cookie", format!("user_sess={}", session))
//!     .body(())
//!     .unwrap();
//! assert!(check_csrf(&request, &secret).is_err());
//!
//! let csrf = issue_csrf_token("octocat", "user-hash").unwrap();
//! let request = Request::post("/api/repos/octocat/hello")
//!     .header("Cookie", format!("user_sess={}", session))
//!     .header("X-CSRF-TOKEN", csrf)
//!     .body(())
//!     .unwrap();
//! assert!(check_csrf(&request, &secret).is_ok());
//! ```
//!
//! ## 日志
//!
//! 本库通过 `tracing` 输出事件，不安装任何 subscriber。密钥和原始 token
//! 不会出现在日志中。

pub mod cache;
pub mod error;
pub mod security;
pub mod token;

pub use error::{Error, Result, StorageError, TokenError};

pub use token::{
    Claims, SIGNING_ALGORITHM, SecretResolver, StaticSecret, Token, TokenKind, TokenVerifier,
    parse,
};

pub use security::{
    AuthorizationPolicy, Carrier, CsrfConfig, CsrfGuard, ExtractorConfig, RawCredential,
    SameSite, SessionCookie, TokenExtractor, check_csrf, issue_csrf_token, parse_request,
};

pub use cache::{CacheStore, InMemoryCache, get_or_populate};
