//! 业务结果到 HTTP 响应的转换

use actix_web::{HttpResponse, http::StatusCode};
use serde::Serialize;
use tracing::error;

use crate::errors::HWSystemError;
use crate::models::{ApiResponse, ErrorCode};

/// 错误类型对应的 HTTP 状态码
pub fn status_for(err: &HWSystemError) -> StatusCode {
    match err {
        HWSystemError::NotFound(_) => StatusCode::NOT_FOUND,
        HWSystemError::Forbidden(_) => StatusCode::FORBIDDEN,
        HWSystemError::Authentication(_) => StatusCode::UNAUTHORIZED,
        HWSystemError::Validation(_) => StatusCode::BAD_REQUEST,
        HWSystemError::OutOfRange(_) | HWSystemError::DeadlinePassed(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        HWSystemError::InvalidTransition(_)
        | HWSystemError::DuplicateActiveSubmission(_)
        | HWSystemError::Conflict(_) => StatusCode::CONFLICT,
        HWSystemError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        HWSystemError::Storage(_)
        | HWSystemError::Serialization(_)
        | HWSystemError::Configuration(_)
        | HWSystemError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 错误响应；内部错误只记录日志，不把细节返回给调用方
pub fn error_response(err: HWSystemError) -> HttpResponse {
    if err.is_internal() {
        error!("{}", err.format_simple());
    }
    let err = err.into_public();
    HttpResponse::build(status_for(&err)).json(ApiResponse::error_empty(
        ErrorCode::from(&err),
        err.message(),
    ))
}

pub fn respond<T: Serialize>(result: crate::errors::Result<T>, message: &str) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data, message)),
        Err(err) => error_response(err),
    }
}

pub fn respond_created<T: Serialize>(
    result: crate::errors::Result<T>,
    message: &str,
) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Created().json(ApiResponse::success(data, message)),
        Err(err) => error_response(err),
    }
}
