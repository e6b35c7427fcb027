//! Cookie 助手模块
//!
//! - **读取**: 从请求的 `Cookie` 头中找到指定名称的值
//! - **写入**: 签发会话 token 并生成放进 `user_sess` Cookie 的 `Set-Cookie` 头
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::Duration;
//! use http::{header, HeaderMap};
//! use tokenauth::security::cookie::{cookie_value, SessionCookie};
//! use tokenauth::token::{parse, StaticSecret, Token, TokenKind};
//!
//! // 登录成功后签发会话 Cookie
//! let session = Token::new(TokenKind::Session, "octocat");
//! let cookie = SessionCookie::for_token(&session, "user-hash", Duration::hours(72)).unwrap();
//!
//! let mut response = HeaderMap::new();
//! response.insert(header::SET_COOKIE, cookie.to_header_value().unwrap());
//!
//! // 浏览器随后回传 name=value
//! let mut request = HeaderMap::new();
//! request.insert(header::COOKIE, format!("user_sess={}", cookie.token()).parse().unwrap());
//! let raw = cookie_value(&request, "user_sess").unwrap();
//! assert_eq!(parse(&raw, &StaticSecret::new("user-hash")).unwrap(), session);
//!
//! // 注销
//! let removal = cookie.clear().to_string();
//! assert!(removal.contains("Max-Age=0"));
//! ```

use std::fmt;

use chrono::{Duration, Utc};
use http::header::COOKIE;
use http::{HeaderMap, HeaderValue};

use super::extract::SESSION_COOKIE;
use crate::error::{Error, Result, TokenError};
use crate::token::Token;

/// SameSite Cookie 属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// 只在同站请求时发送
    Strict,
    /// 允许顶级导航的跨站请求
    Lax,
    /// 所有请求都发送，需要 Secure
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// 在所有 `Cookie` 头中查找第一个名为 `name` 的 Cookie 值
///
/// 无法按 UTF-8 解析的头会被跳过。
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// 会话 Cookie
///
/// 承载签名会话 token 的 `user_sess` Cookie。始终带 HttpOnly，默认还带
/// Secure、SameSite=Strict、Path=/。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    name: String,
    token: String,
    max_age: Option<i64>,
    path: Option<String>,
    domain: Option<String>,
    same_site: SameSite,
    secure: bool,
}

impl SessionCookie {
    /// 包装一个已签名的 token，不设置 Max-Age（浏览器会话 Cookie）
    pub fn new(signed: impl Into<String>) -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            token: signed.into(),
            max_age: None,
            path: Some("/".to_string()),
            domain: None,
            same_site: SameSite::Strict,
            secure: true,
        }
    }

    /// 签发 token 并放进 Cookie
    ///
    /// token 的 `exp` 与 Cookie 的 Max-Age 都取 `lifetime`。
    pub fn for_token(
        token: &Token,
        secret: impl AsRef<[u8]>,
        lifetime: Duration,
    ) -> Result<Self> {
        let exp = (Utc::now() + lifetime).timestamp();
        let signed = token.sign_with_expiry(secret, exp)?;

        let mut cookie = Self::new(signed);
        cookie.max_age = Some(lifetime.num_seconds().max(0));
        Ok(cookie)
    }

    /// 注销用的 Cookie：同名、同路径，值为空且立即过期
    pub fn clear(&self) -> Self {
        Self {
            token: String::new(),
            max_age: Some(0),
            ..self.clone()
        }
    }

    /// 设置 Cookie 名称，需与提取器配置的名称一致
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置 Path 属性
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 设置 Domain 属性
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// 设置 SameSite 属性
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// 设置 Secure 属性，仅用于本地 HTTP 开发环境
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Cookie 名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 签名 token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// 生成 `Set-Cookie` 头
    pub fn to_header_value(&self) -> Result<HeaderValue> {
        HeaderValue::try_from(self.to_string()).map_err(|_| {
            Error::Token(TokenError::EncodingFailed(
                "cookie contains characters not allowed in a header".into(),
            ))
        })
    }
}

impl fmt::Display for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.token)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
            if max_age == 0 {
                f.write_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT")?;
            }
        }
        if let Some(path) = &self.path {
            write!(f, "; Path={}", path)?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain)?;
        }
        write!(f, "; SameSite={}", self.same_site)?;
        if self.secure {
            f.write_str("; Secure")?;
        }
        f.write_str("; HttpOnly")
    }
}
