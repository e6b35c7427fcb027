//! 请求层安全模块
//!
//! 把签名 token 与 HTTP 请求连接起来。
//!
//! ## 子模块
//!
//! - **extract**: 按 Authorization 头、`access_token` 参数、`user_sess` Cookie 的顺序提取并验证 token
//! - **csrf**: 对非安全方法要求 `X-CSRF-TOKEN` 请求头
//! - **cookie**: Cookie 读取与会话 Cookie 生成
//!
//! ## 示例
//!
//! ```rust
//! use http::Request;
//! use tokenauth::security::{check_csrf, issue_csrf_token, parse_request};
//! use tokenauth::token::{StaticSecret, Token, TokenKind};
//!
//! let secret = StaticSecret::new("user-hash");
//! let session = Token::new(TokenKind::Session, "octocat").sign("user-hash").unwrap();
//! let csrf = issue_csrf_token("octocat", "user-hash").unwrap();
//!
//! let request = Request::delete("/api/repos/octocat/hello")
//!     .header("Cookie", format!("user_sess={}", session))
//!     .header("X-CSRF-TOKEN", csrf)
//!     .body(())
//!     .unwrap();
//!
//! let user = parse_request(&request, &secret).unwrap();
//! assert_eq!(user.text, "octocat");
//! assert!(check_csrf(&request, &secret).is_ok());
//! ```

pub mod cookie;
pub mod csrf;
pub mod extract;

pub use cookie::{SameSite, SessionCookie, cookie_value};
pub use csrf::{CSRF_HEADER, CsrfConfig, CsrfGuard, check_csrf, issue_csrf_token};
pub use extract::{
    ACCESS_TOKEN_PARAM, AUTHORIZATION_SCHEME, AuthorizationPolicy, Carrier, ExtractorConfig,
    RawCredential, SESSION_COOKIE, TokenExtractor, parse_request,
};
