use serde::{Deserialize, Serialize};

use crate::errors::HWSystemError;

/// API 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,

    // 生命周期错误
    InvalidTransition = 2001,
    DeadlinePassed = 2002,
    DuplicateActiveSubmission = 2003,
    Timeout = 2004,
    Conflict = 2005,

    // 评分错误
    OutOfRange = 3001,
}

impl From<&HWSystemError> for ErrorCode {
    fn from(err: &HWSystemError) -> Self {
        match err {
            HWSystemError::NotFound(_) => ErrorCode::NotFound,
            HWSystemError::Forbidden(_) => ErrorCode::Forbidden,
            HWSystemError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            HWSystemError::OutOfRange(_) => ErrorCode::OutOfRange,
            HWSystemError::DeadlinePassed(_) => ErrorCode::DeadlinePassed,
            HWSystemError::DuplicateActiveSubmission(_) => ErrorCode::DuplicateActiveSubmission,
            HWSystemError::Timeout(_) => ErrorCode::Timeout,
            HWSystemError::Conflict(_) => ErrorCode::Conflict,
            HWSystemError::Validation(_) => ErrorCode::BadRequest,
            HWSystemError::Authentication(_) => ErrorCode::Unauthorized,
            HWSystemError::Storage(_)
            | HWSystemError::Serialization(_)
            | HWSystemError::Configuration(_)
            | HWSystemError::Internal(_) => ErrorCode::InternalServerError,
        }
    }
}
