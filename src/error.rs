//! 统一错误类型模块
//!
//! 提供 tokenauth 库中所有操作的错误类型定义。
//!
//! 每一种失败都有可区分的类型，调用方可以据此选择 HTTP 状态码，
//! 或者决定是否换一个凭证来源重试。

use http::StatusCode;
use thiserror::Error;

/// tokenauth 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 密钥解析器返回的任意错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// tokenauth 库的错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// Token 相关错误
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// 密钥解析器无法给出密钥（未知用户、已吊销等）
    #[error("secret resolution failed: {0}")]
    SecretResolution(#[source] BoxError),

    /// 请求中任何位置都没有找到凭证
    #[error("no credential found in request")]
    CredentialNotFound,

    /// 变更类请求的 CSRF 校验失败，内部为具体原因
    #[error("csrf check failed: {0}")]
    Csrf(#[source] Box<Error>),

    /// 存储错误
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// 包装密钥解析器内部的错误
    pub fn resolution<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::SecretResolution(err.into())
    }

    /// 创建一个格式错误
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Token(TokenError::Malformed(msg.into()))
    }

    /// 是否属于 token 格式错误（无法解码、缺少或错误的 claim）
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Error::Token(
                TokenError::Malformed(_) | TokenError::MissingClaim(_) | TokenError::InvalidClaim(_)
            )
        )
    }

    /// 建议的 HTTP 状态码
    ///
    /// 密钥解析失败默认视为未认证，调用方可以按自己的语义覆盖。
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Token(TokenError::EncodingFailed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Token(_) | Error::SecretResolution(_) | Error::CredentialNotFound => {
                StatusCode::UNAUTHORIZED
            }
            Error::Csrf(_) => StatusCode::FORBIDDEN,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Token 相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Token 格式无效
    #[error("malformed token: {0}")]
    Malformed(String),
    /// 缺少必需的 claim
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// 无效的 claim 值
    #[error("invalid claim value: {0}")]
    InvalidClaim(String),
    /// 声明的签名算法不被接受
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// Token 签名无效
    #[error("invalid token signature")]
    InvalidSignature,
    /// Token 已过期
    #[error("token has expired")]
    Expired,
    /// Token 编码失败
    #[error("token encoding failed: {0}")]
    EncodingFailed(String),
}

/// 存储相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// 操作失败
    #[error("storage operation failed: {0}")]
    OperationFailed(String),
    /// 值无法序列化
    #[error("value serialization failed: {0}")]
    Serialization(String),
}
