pub mod directory;

pub mod homeworks;

pub mod stats;

pub mod submissions;

pub use directory::configure_directory_routes;
pub use homeworks::configure_homeworks_routes;
pub use stats::configure_stats_routes;
pub use submissions::configure_submissions_routes;

use actix_web::{HttpRequest, HttpResponse};

use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, actors::entities::Actor};

// 取出 RequireJWT 放入的操作者，缺失时返回 401 响应
pub(crate) fn require_actor(req: &HttpRequest) -> Result<Actor, HttpResponse> {
    RequireJWT::extract_actor(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "无法获取用户信息",
        ))
    })
}
