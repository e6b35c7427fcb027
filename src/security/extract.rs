//! 请求凭证提取模块
//!
//! 按固定优先级从 HTTP 请求中找到签名 token，找到第一个即停止：
//!
//! 1. `Authorization: Bearer <token>` 请求头
//! 2. `access_token` 表单或 URL 查询参数
//! 3. `user_sess` Cookie
//!
//! 三处都没有时返回 [`Error::CredentialNotFound`]，与验证失败区分开。
//!
//! ## Authorization 头的解析策略
//!
//! - [`AuthorizationPolicy::Strict`]（默认）：必须是 `Bearer <token>`，否则直接
//!   返回格式错误，不会继续尝试后面的来源。
//! - [`AuthorizationPolicy::Permissive`]：兼容旧行为，不符合 `Bearer <token>`
//!   时把整个头的值当作 token 去验证。
//!
//! ## 示例
//!
//! ```rust
//! use http::Request;
//! use tokenauth::security::extract::parse_request;
//! use tokenauth::token::{StaticSecret, Token, TokenKind};
//!
//! let signed = Token::new(TokenKind::User, "octocat").sign("secret").unwrap();
//! let request = Request::get("/api/user")
//!     .header("Authorization", format!("Bearer {}", signed))
//!     .body(())
//!     .unwrap();
//!
//! let token = parse_request(&request, &StaticSecret::new("secret")).unwrap();
//! assert_eq!(token.text, "octocat");
//! ```

use std::fmt;

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName, Request, Uri};
use tracing::debug;

use super::cookie::cookie_value;
use crate::error::{Error, Result};
use crate::token::{SecretResolver, Token, TokenVerifier};

/// Authorization 头使用的认证方案
pub const AUTHORIZATION_SCHEME: &str = "Bearer";

/// 默认的 token 参数名
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// 默认的会话 Cookie 名
pub const SESSION_COOKIE: &str = "user_sess";

/// Authorization 头不符合 `Bearer <token>` 时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationPolicy {
    /// 返回格式错误，不再尝试其他来源
    #[default]
    Strict,
    /// 把整个头的值当作 token
    Permissive,
}

/// 凭证来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Carrier {
    /// Authorization 请求头
    AuthorizationHeader,
    /// 表单或查询参数
    AccessTokenParam,
    /// 会话 Cookie
    SessionCookie,
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Carrier::AuthorizationHeader => write!(f, "authorization_header"),
            Carrier::AccessTokenParam => write!(f, "access_token_param"),
            Carrier::SessionCookie => write!(f, "session_cookie"),
        }
    }
}

/// 已定位但尚未验证的凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCredential {
    /// 来源
    pub carrier: Carrier,
    /// 签名 token 字符串
    pub value: String,
}

/// 提取配置
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    authorization_header: HeaderName,
    access_token_param: String,
    session_cookie: String,
    policy: AuthorizationPolicy,
    verifier: TokenVerifier,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            authorization_header: AUTHORIZATION,
            access_token_param: ACCESS_TOKEN_PARAM.to_string(),
            session_cookie: SESSION_COOKIE.to_string(),
            policy: AuthorizationPolicy::default(),
            verifier: TokenVerifier::default(),
        }
    }
}

impl ExtractorConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置携带 bearer token 的请求头
    pub fn with_authorization_header(mut self, header: HeaderName) -> Self {
        self.authorization_header = header;
        self
    }

    /// 设置表单/查询参数名
    pub fn with_access_token_param(mut self, param: impl Into<String>) -> Self {
        self.access_token_param = param.into();
        self
    }

    /// 设置会话 Cookie 名
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = cookie.into();
        self
    }

    /// 设置 Authorization 头解析策略
    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 设置验证器
    pub fn with_verifier(mut self, verifier: TokenVerifier) -> Self {
        self.verifier = verifier;
        self
    }
}

/// 请求凭证提取器
#[derive(Debug, Clone, Default)]
pub struct TokenExtractor {
    config: ExtractorConfig,
}

impl TokenExtractor {
    /// 创建提取器
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// 使用默认配置创建提取器
    pub fn with_default() -> Self {
        Self::new(ExtractorConfig::default())
    }

    /// 定位请求中的凭证（不验证）
    pub fn locate<B>(&self, request: &Request<B>) -> Result<RawCredential> {
        self.locate_parts(request.headers(), request.uri(), None)
    }

    /// 定位凭证，`form` 为已读取的 `application/x-www-form-urlencoded` 请求体
    ///
    /// 表单中的参数优先于 URL 查询参数。
    pub fn locate_with_form<B>(
        &self,
        request: &Request<B>,
        form: Option<&[u8]>,
    ) -> Result<RawCredential> {
        self.locate_parts(request.headers(), request.uri(), form)
    }

    /// 定位并验证请求中的 token
    pub fn extract<B, R>(&self, request: &Request<B>, resolver: &R) -> Result<Token>
    where
        R: SecretResolver + ?Sized,
    {
        let credential = self.locate(request)?;
        self.config.verifier.parse(&credential.value, resolver)
    }

    /// 定位并验证 token，同时考虑表单请求体
    pub fn extract_with_form<B, R>(
        &self,
        request: &Request<B>,
        form: Option<&[u8]>,
        resolver: &R,
    ) -> Result<Token>
    where
        R: SecretResolver + ?Sized,
    {
        let credential = self.locate_with_form(request, form)?;
        self.config.verifier.parse(&credential.value, resolver)
    }

    fn locate_parts(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
        form: Option<&[u8]>,
    ) -> Result<RawCredential> {
        let credential = self
            .authorization_credential(headers)?
            .or_else(|| self.param_credential(uri, form))
            .or_else(|| self.cookie_credential(headers))
            .ok_or(Error::CredentialNotFound)?;

        debug!(carrier = %credential.carrier, "credential located");
        Ok(credential)
    }

    fn authorization_credential(&self, headers: &HeaderMap) -> Result<Option<RawCredential>> {
        let Some(value) = headers.get(&self.config.authorization_header) else {
            return Ok(None);
        };
        let value = value
            .to_str()
            .map_err(|_| Error::malformed("authorization header is not valid UTF-8"))?;
        if value.trim().is_empty() {
            return Ok(None);
        }

        let token = match self.config.policy {
            AuthorizationPolicy::Strict => strict_bearer(value).ok_or_else(|| {
                Error::malformed("authorization header is not a bearer credential")
            })?,
            AuthorizationPolicy::Permissive => permissive_bearer(value),
        };

        Ok(Some(RawCredential {
            carrier: Carrier::AuthorizationHeader,
            value: token.to_string(),
        }))
    }

    fn param_credential(&self, uri: &Uri, form: Option<&[u8]>) -> Option<RawCredential> {
        let name = self.config.access_token_param.as_str();
        form.and_then(|body| form_param(body, name))
            .or_else(|| uri.query().and_then(|q| form_param(q.as_bytes(), name)))
            .map(|value| RawCredential {
                carrier: Carrier::AccessTokenParam,
                value,
            })
    }

    fn cookie_credential(&self, headers: &HeaderMap) -> Option<RawCredential> {
        cookie_value(headers, &self.config.session_cookie)
            .filter(|value| !value.is_empty())
            .map(|value| RawCredential {
                carrier: Carrier::SessionCookie,
                value,
            })
    }
}

/// 使用默认配置从请求中提取并验证 token
pub fn parse_request<B, R>(request: &Request<B>, resolver: &R) -> Result<Token>
where
    R: SecretResolver + ?Sized,
{
    TokenExtractor::with_default().extract(request, resolver)
}

/// `Bearer <token>`，方案名不区分大小写，且只能有一个 token
fn strict_bearer(value: &str) -> Option<&str> {
    let (scheme, rest) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME) {
        return None;
    }

    let mut words = rest.split_whitespace();
    let token = words.next()?;
    if words.next().is_some() {
        return None;
    }
    Some(token)
}

/// `Bearer` 后的第一个词；不匹配时返回原值
fn permissive_bearer(value: &str) -> &str {
    value
        .split_once(char::is_whitespace)
        .filter(|(scheme, _)| *scheme == AUTHORIZATION_SCHEME)
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or(value)
}

/// 第一个名为 `name` 且非空的参数值
fn form_param(bytes: &[u8], name: &str) -> Option<String> {
    for (key, value) in url::form_urlencoded::parse(bytes) {
        if key == name {
            return Some(value.into_owned()).filter(|v| !v.is_empty());
        }
    }
    None
}
