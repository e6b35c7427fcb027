//! CSRF (跨站请求伪造) 防护模块
//!
//! 对会产生副作用的请求，要求在专用请求头（默认 `X-CSRF-TOKEN`）中携带一个
//! 独立签名的防伪 token，并按与普通 token 相同的流程验证。
//!
//! ## 功能特性
//!
//! - 安全方法（默认 `GET`、`OPTIONS`）直接放行，不检查任何请求头
//! - 复用 [`TokenVerifier`] 与调用方的密钥解析器
//! - 任何失败都以 [`Error::Csrf`] 返回，内部保留具体原因
//!
//! 放行安全方法的前提是：系统中这些方法不会产生副作用。
//!
//! ## 基本用法
//!
//! ```rust
//! use http::Request;
//! use tokenauth::security::csrf::{check_csrf, issue_csrf_token};
//! use tokenauth::token::StaticSecret;
//!
//! let secret = StaticSecret::new("user-hash");
//! let csrf = issue_csrf_token("octocat", "user-hash").unwrap();
//!
//! let request = Request::post("/api/repos/octocat/hello")
//!     .header("X-CSRF-TOKEN", csrf)
//!     .body(())
//!     .unwrap();
//! assert!(check_csrf(&request, &secret).is_ok());
//!
//! let request = Request::post("/api/repos/octocat/hello").body(()).unwrap();
//! assert!(check_csrf(&request, &secret).is_err());
//! ```

use http::{HeaderMap, HeaderName, Method, Request};
use tracing::{trace, warn};

use crate::error::{Error, Result, TokenError};
use crate::token::{SecretResolver, Token, TokenKind, TokenVerifier};

/// 默认的 CSRF 请求头
pub const CSRF_HEADER: &str = "x-csrf-token";

/// CSRF 配置
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    /// 携带防伪 token 的请求头
    header_name: HeaderName,
    /// 无需检查的方法
    safe_methods: Vec<Method>,
    /// 是否要求 token 的用途为 `csrf`
    require_csrf_kind: bool,
    /// 验证器
    verifier: TokenVerifier,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header_name: HeaderName::from_static(CSRF_HEADER),
            safe_methods: vec![Method::GET, Method::OPTIONS],
            require_csrf_kind: false,
            verifier: TokenVerifier::default(),
        }
    }
}

impl CsrfConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置请求头名称
    pub fn with_header_name(mut self, header_name: HeaderName) -> Self {
        self.header_name = header_name;
        self
    }

    /// 设置无需检查的方法
    ///
    /// # 示例
    ///
    /// ```rust
    /// use http::Method;
    /// use tokenauth::security::csrf::CsrfConfig;
    ///
    /// let config = CsrfConfig::new()
    ///     .with_safe_methods(vec![Method::GET, Method::HEAD, Method::OPTIONS]);
    /// ```
    pub fn with_safe_methods(mut self, methods: Vec<Method>) -> Self {
        self.safe_methods = methods;
        self
    }

    /// 要求防伪 token 的用途为 [`TokenKind::Csrf`]
    pub fn with_require_csrf_kind(mut self, require: bool) -> Self {
        self.require_csrf_kind = require;
        self
    }

    /// 设置验证器
    pub fn with_verifier(mut self, verifier: TokenVerifier) -> Self {
        self.verifier = verifier;
        self
    }
}

/// CSRF 防护器
#[derive(Debug, Clone, Default)]
pub struct CsrfGuard {
    config: CsrfConfig,
}

impl CsrfGuard {
    /// 创建 CSRF 防护器
    pub fn new(config: CsrfConfig) -> Self {
        Self { config }
    }

    /// 使用默认配置创建
    pub fn with_default() -> Self {
        Self::new(CsrfConfig::default())
    }

    /// 是否为无需检查的方法
    pub fn is_safe(&self, method: &Method) -> bool {
        self.config.safe_methods.contains(method)
    }

    /// 检查请求
    pub fn check<B, R>(&self, request: &Request<B>, resolver: &R) -> Result<()>
    where
        R: SecretResolver + ?Sized,
    {
        self.check_parts(request.method(), request.headers(), resolver)
    }

    /// 以方法和请求头检查，适用于已拆分的请求
    pub fn check_parts<R>(&self, method: &Method, headers: &HeaderMap, resolver: &R) -> Result<()>
    where
        R: SecretResolver + ?Sized,
    {
        if self.is_safe(method) {
            trace!(%method, "csrf check skipped for safe method");
            return Ok(());
        }

        self.verify_header(headers, resolver)
            .map(|_| ())
            .map_err(|err| {
                warn!(%method, error = %err, "csrf check failed");
                Error::Csrf(Box::new(err))
            })
    }

    fn verify_header<R>(&self, headers: &HeaderMap, resolver: &R) -> Result<Token>
    where
        R: SecretResolver + ?Sized,
    {
        let raw = headers
            .get(&self.config.header_name)
            .ok_or(Error::CredentialNotFound)?
            .to_str()
            .map_err(|_| Error::malformed("csrf header is not valid UTF-8"))?;
        if raw.is_empty() {
            return Err(Error::CredentialNotFound);
        }

        let token = self.config.verifier.parse(raw, resolver)?;
        if self.config.require_csrf_kind && token.kind != TokenKind::Csrf {
            return Err(Error::Token(TokenError::InvalidClaim(format!(
                "expected csrf token, got {}",
                token.kind
            ))));
        }
        Ok(token)
    }
}

/// 使用默认配置检查请求
pub fn check_csrf<B, R>(request: &Request<B>, resolver: &R) -> Result<()>
where
    R: SecretResolver + ?Sized,
{
    CsrfGuard::with_default().check(request, resolver)
}

/// 为主体签发防伪 token
pub fn issue_csrf_token(subject: impl Into<String>, secret: impl AsRef<[u8]>) -> Result<String> {
    Token::new(TokenKind::Csrf, subject).sign(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StaticSecret;

    const SECRET: &str = "csrf-secret";

    fn post_with(header: Option<&str>) -> Request<()> {
        let mut builder = Request::post("/api/repos/octocat/hello");
        if let Some(value) = header {
            builder = builder.header("X-CSRF-TOKEN", value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_safe_methods_skip_check() {
        let guard = CsrfGuard::with_default();
        let resolver = StaticSecret::new(SECRET);

        for method in [Method::GET, Method::OPTIONS] {
            let request = Request::builder()
                .method(method)
                .uri("/")
                .body(())
                .unwrap();
            assert!(guard.check(&request, &resolver).is_ok());
        }
    }

    #[test]
    fn test_unsafe_methods_require_header() {
        let guard = CsrfGuard::with_default();
        let resolver = StaticSecret::new(SECRET);

        for method in [
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
        ] {
            let request = Request::builder()
                .method(method)
                .uri("/")
                .body(())
                .unwrap();
            let err = guard.check(&request, &resolver).unwrap_err();
            match err {
                Error::Csrf(inner) => assert!(matches!(*inner, Error::CredentialNotFound)),
                other => panic!("Expected Csrf, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_valid_token_passes() {
        let token = issue_csrf_token("octocat", SECRET).unwrap();
        let request = post_with(Some(token.as_str()));

        assert!(check_csrf(&request, &StaticSecret::new(SECRET)).is_ok());
    }

    #[test]
    fn test_invalid_token_fails() {
        let token = issue_csrf_token("octocat", "other-secret").unwrap();
        let resolver = StaticSecret::new(SECRET);

        let err = check_csrf(&post_with(Some(token.as_str())), &resolver).unwrap_err();
        match err {
            Error::Csrf(inner) => assert!(matches!(
                *inner,
                Error::Token(TokenError::InvalidSignature)
            )),
            other => panic!("Expected Csrf, got {:?}", other),
        }

        let err = check_csrf(&post_with(Some("garbage")), &resolver).unwrap_err();
        match err {
            Error::Csrf(inner) => assert!(inner.is_malformed()),
            other => panic!("Expected Csrf, got {:?}", other),
        }

        assert!(matches!(
            check_csrf(&post_with(Some("")), &resolver),
            Err(Error::Csrf(_))
        ));
    }

    #[test]
    fn test_expired_token_fails() {
        let token = Token::new(TokenKind::Csrf, "octocat")
            .sign_with_expiry(SECRET, 1)
            .unwrap();

        let request = post_with(Some(token.as_str()));

        let err = check_csrf(&request, &StaticSecret::new(SECRET)).unwrap_err();
        match err {
            Error::Csrf(inner) => assert!(matches!(*inner, Error::Token(TokenError::Expired))),
            other => panic!("Expected Csrf, got {:?}", other),
        }
    }

    #[test]
    fn test_resolver_error_wrapped() {
        let token = issue_csrf_token("ghost", SECRET).unwrap();
        let resolver = |_: &Token| -> Result<String> { Err(Error::resolution("unknown user")) };

        let err = check_csrf(&post_with(Some(token.as_str())), &resolver).unwrap_err();
        match err {
            Error::Csrf(inner) => assert!(matches!(*inner, Error::SecretResolution(_))),
            other => panic!("Expected Csrf, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_not_checked_by_default() {
        let token = Token::new(TokenKind::User, "octocat").sign(SECRET).unwrap();
        assert!(check_csrf(&post_with(Some(token.as_str())), &StaticSecret::new(SECRET)).is_ok());
    }

    #[test]
    fn test_require_csrf_kind() {
        let guard = CsrfGuard::new(CsrfConfig::new().with_require_csrf_kind(true));
        let resolver = StaticSecret::new(SECRET);

        let user_token = Token::new(TokenKind::User, "octocat").sign(SECRET).unwrap();
        assert!(guard.check(&post_with(Some(user_token.as_str())), &resolver).is_err());

        let csrf_token = issue_csrf_token("octocat", SECRET).unwrap();
        assert!(guard.check(&post_with(Some(csrf_token.as_str())), &resolver).is_ok());
    }

    #[test]
    fn test_custom_config() {
        let guard = CsrfGuard::new(
            CsrfConfig::new()
                .with_header_name(HeaderName::from_static("x-xsrf"))
                .with_safe_methods(vec![Method::GET, Method::HEAD]),
        );
        let resolver = StaticSecret::new(SECRET);

        assert!(guard.is_safe(&Method::HEAD));
        assert!(!guard.is_safe(&Method::OPTIONS));

        let token = issue_csrf_token("octocat", SECRET).unwrap();
        let request = Request::delete("/")
            .header("X-XSRF", token.as_str())
            .body(())
            .unwrap();
        assert!(guard.check(&request, &resolver).is_ok());

        // 默认请求头不再被读取
        let request = Request::delete("/")
            .header("X-CSRF-TOKEN", token.as_str())
            .body(())
            .unwrap();
        assert!(guard.check(&request, &resolver).is_err());
    }

    #[test]
    fn test_check_parts() {
        let guard = CsrfGuard::with_default();
        let token = issue_csrf_token("octocat", SECRET).unwrap();
        let request = post_with(Some(token.as_str()));
        let (parts, _) = request.into_parts();

        assert!(
            guard
                .check_parts(&parts.method, &parts.headers, &StaticSecret::new(SECRET))
                .is_ok()
        );
    }
}
