//! 紧凑签名 Token 实现模块
//!
//! Token 以 JWS 紧凑格式传输：`header.payload.signature`，三段均为无填充的
//! base64url 编码。
//!
//! ## 算法
//!
//! 只接受 **HS256**（HMAC-SHA256）。头部声明其他算法的 token 一律以
//! [`TokenError::UnsupportedAlgorithm`] 拒绝，不会尝试用其他算法验证。
//!
//! ## Claims
//!
//! 载荷是一个开放的 JSON 对象，保留字段：
//!
//! - `type`: Token 用途
//! - `text`: Token 载荷
//! - `exp`: 过期时间（Unix 时间戳，可选，允许浮点数）
//!
//! 其他字段会被保留但不参与验证。
//!
//! ## 验证流程
//!
//! 1. 拆分并解码头部与载荷（此时尚不可信）；第二个 `.` 之后的内容整体
//!    视为签名段，签名段中的任何改动都以 [`TokenError::InvalidSignature`] 拒绝
//! 2. 检查算法
//! 3. 提取 `type` 与 `text`
//! 4. 调用密钥解析器获取密钥
//! 5. 常量时间比较签名
//! 6. 检查过期时间
//!
//! ## 示例
//!
//! ```rust
//! use tokenauth::token::{Token, TokenKind, TokenVerifier};
//!
//! let secret = "my-secret-key";
//! let signed = Token::new(TokenKind::Session, "session-id-1")
//!     .sign_with_expiry(secret, 4_102_444_800)
//!     .unwrap();
//!
//! let verifier = TokenVerifier::new().with_leeway(30);
//! let resolver = |_: &Token| -> tokenauth::Result<String> { Ok(secret.to_string()) };
//! let token = verifier.parse(&signed, &resolver).unwrap();
//! assert_eq!(token.text, "session-id-1");
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::{SecretResolver, Token};
use crate::error::{Error, Result, TokenError};

type HmacSha256 = Hmac<Sha256>;

/// 唯一接受的签名算法
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Token 载荷
///
/// 开放的字符串键映射，`type`、`text`、`exp` 为保留字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// 用途字段
    pub const TYPE: &'static str = "type";
    /// 载荷字段
    pub const TEXT: &'static str = "text";
    /// 过期时间字段
    pub const EXP: &'static str = "exp";

    /// 创建空的 Claims
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 Token 构建 Claims，`exp > 0` 时写入过期时间
    pub fn for_token(token: &Token, exp: i64) -> Self {
        let mut claims = Self::new();
        claims.insert(Self::TYPE, token.kind.as_str());
        claims.insert(Self::TEXT, token.text.as_str());
        if exp > 0 {
            claims.insert(Self::EXP, exp as f64);
        }
        claims
    }

    /// 获取原始字段值
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 获取并反序列化字段值
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// 写入字段
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// `type` 字段
    pub fn kind(&self) -> Result<&str> {
        self.required_str(Self::TYPE)
    }

    /// `text` 字段
    pub fn text(&self) -> Result<&str> {
        self.required_str(Self::TEXT)
    }

    /// `exp` 字段，未设置时返回 `None`
    pub fn expires_at(&self) -> Result<Option<f64>> {
        match self.0.get(Self::EXP) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| {
                Error::Token(TokenError::InvalidClaim("exp is not a valid number".into()))
            }),
            Some(_) => Err(Error::Token(TokenError::InvalidClaim(
                "exp must be a number".into(),
            ))),
        }
    }

    fn required_str(&self, key: &str) -> Result<&str> {
        match self.0.get(key) {
            None => Err(Error::Token(TokenError::MissingClaim(key.to_string()))),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(Error::Token(TokenError::InvalidClaim(format!(
                "{} must be a string",
                key
            )))),
        }
    }
}

impl Token {
    /// 使用密钥签名，不带过期时间
    pub fn sign(&self, secret: impl AsRef<[u8]>) -> Result<String> {
        self.sign_with_expiry(secret, 0)
    }

    /// 使用密钥签名，`exp > 0` 时写入过期时间（Unix 时间戳）
    pub fn sign_with_expiry(&self, secret: impl AsRef<[u8]>, exp: i64) -> Result<String> {
        let claims = Claims::for_token(self, exp);
        let header = Header::new(SIGNING_ALGORITHM);
        let key = EncodingKey::from_secret(secret.as_ref());

        encode(&header, &claims, &key).map_err(|e| {
            Error::Token(TokenError::EncodingFailed(format!(
                "failed to encode token: {}",
                e
            )))
        })
    }

    /// 使用密钥签名，从现在起 `lifetime` 后过期
    pub fn sign_expires_in(&self, secret: impl AsRef<[u8]>, lifetime: Duration) -> Result<String> {
        let exp = (Utc::now() + lifetime).timestamp();
        self.sign_with_expiry(secret, exp)
    }
}

/// 头部中验证所需的字段
#[derive(Debug, Deserialize)]
struct RawHeader {
    alg: String,
}

/// Token 验证器
///
/// 无状态，可在多线程间共享。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenVerifier {
    /// 允许的时钟偏差（秒）
    leeway: u64,
}

impl TokenVerifier {
    /// 创建默认验证器（无时钟偏差）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置时钟偏差容忍度
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// 时钟偏差容忍度（秒）
    pub fn leeway(&self) -> u64 {
        self.leeway
    }

    /// 验证签名 token 并返回 Token
    pub fn parse<R>(&self, raw: &str, resolver: &R) -> Result<Token>
    where
        R: SecretResolver + ?Sized,
    {
        self.parse_at(raw, resolver, Utc::now().timestamp())
    }

    /// 以指定时间戳为当前时间验证
    pub fn parse_at<R>(&self, raw: &str, resolver: &R, now: i64) -> Result<Token>
    where
        R: SecretResolver + ?Sized,
    {
        self.parse_with_claims_at(raw, resolver, now)
            .map(|(token, _)| token)
    }

    /// 验证并同时返回完整的 Claims
    pub fn parse_with_claims<R>(&self, raw: &str, resolver: &R) -> Result<(Token, Claims)>
    where
        R: SecretResolver + ?Sized,
    {
        self.parse_with_claims_at(raw, resolver, Utc::now().timestamp())
    }

    /// 以指定时间戳验证并返回完整的 Claims
    pub fn parse_with_claims_at<R>(
        &self,
        raw: &str,
        resolver: &R,
        now: i64,
    ) -> Result<(Token, Claims)>
    where
        R: SecretResolver + ?Sized,
    {
        let result = self.verify(raw, resolver, now);
        match &result {
            Ok((token, _)) => debug!(kind = %token.kind, "token verified"),
            Err(Error::Token(TokenError::UnsupportedAlgorithm(_))) => {}
            Err(err) => debug!(error = %err, "token verification failed"),
        }
        result
    }

    fn verify<R>(&self, raw: &str, resolver: &R, now: i64) -> Result<(Token, Claims)>
    where
        R: SecretResolver + ?Sized,
    {
        // 第二个 `.` 之后的全部内容都属于签名段
        let mut segments = raw.splitn(3, '.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(Error::malformed("token must have three segments"));
        };

        // 此时头部和载荷都还不可信
        let header: RawHeader = decode_segment(header_b64, "header")?;
        let payload: Value = decode_segment(payload_b64, "payload")?;

        match header.alg.parse::<Algorithm>() {
            Ok(alg) if alg == SIGNING_ALGORITHM => {}
            _ => {
                warn!(alg = %header.alg, "rejected token with unsupported signing algorithm");
                return Err(Error::Token(TokenError::UnsupportedAlgorithm(header.alg)));
            }
        }

        let Value::Object(map) = payload else {
            return Err(Error::malformed("claims are not a JSON object"));
        };
        let claims = Claims(map);

        let token = Token::new(claims.kind()?, claims.text()?);

        let secret = resolver.resolve(&token)?;

        let message = &raw[..header_b64.len() + 1 + payload_b64.len()];
        verify_signature(message, signature_b64, secret.as_bytes())?;

        if let Some(exp) = claims.expires_at()? {
            if exp + (self.leeway as f64) < now as f64 {
                return Err(Error::Token(TokenError::Expired));
            }
        }

        Ok((token, claims))
    }
}

/// 使用默认验证器验证签名 token
///
/// # 示例
///
/// ```rust
/// use tokenauth::token::{parse, StaticSecret, Token, TokenKind};
/// use tokenauth::error::{Error, TokenError};
///
/// let signed = Token::new(TokenKind::Hook, "repo-42").sign("secret").unwrap();
///
/// let result = parse(&signed, &StaticSecret::new("other"));
/// assert!(matches!(result, Err(Error::Token(TokenError::InvalidSignature))));
/// ```
pub fn parse<R>(raw: &str, resolver: &R) -> Result<Token>
where
    R: SecretResolver + ?Sized,
{
    TokenVerifier::default().parse(raw, resolver)
}

fn decode_segment<T: DeserializeOwned>(segment: &str, name: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::malformed(format!("{} is not valid base64url", name)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::malformed(format!("{} is not valid JSON: {}", name, e)))
}

fn compute_signature(message: &str, secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn verify_signature(message: &str, signature_b64: &str, secret: &[u8]) -> Result<()> {
    let provided = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| Error::Token(TokenError::InvalidSignature))?;
    let expected = compute_signature(message, secret);

    // 常量时间比较
    if bool::from(provided.ct_eq(&expected)) {
        Ok(())
    } else {
        Err(Error::Token(TokenError::InvalidSignature))
    }
}
