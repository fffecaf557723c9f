use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use uuid::Uuid;

use super::require_actor;
use crate::errors::HWSystemError;
use crate::middlewares;
use crate::models::stats::{entities::StatsScope, requests::StatsQuery};
use crate::services::AppServices;
use crate::utils::{error_response, respond};

fn parse_scope(kind: &str, id: Uuid) -> Option<StatsScope> {
    match kind {
        "classes" => Some(StatsScope::Class(id)),
        "students" => Some(StatsScope::Student(id)),
        "schools" => Some(StatsScope::School(id)),
        "homeworks" => Some(StatsScope::Homework(id)),
        _ => None,
    }
}

fn parse_trend_scope(kind: &str, id: Uuid) -> Option<StatsScope> {
    match kind {
        "classes" => Some(StatsScope::ClassTrend(id)),
        "students" => Some(StatsScope::StudentTrend(id)),
        _ => None,
    }
}

// 获取统计（可用 as_of 要求数据不早于某个时间点）
pub async fn get_stats(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<(String, Uuid)>,
    query: web::Query<StatsQuery>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let (kind, id) = path.into_inner();
    let Some(scope) = parse_scope(&kind, id) else {
        return Ok(error_response(HWSystemError::not_found(format!(
            "未知的统计范围: {kind}"
        ))));
    };

    let result = services
        .aggregation
        .get_stats_for(&actor, scope, query.as_of)
        .await;
    Ok(respond(result, "获取统计成功"))
}

// 获取按天的提交与成绩趋势
pub async fn get_trend(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<(String, Uuid)>,
    query: web::Query<StatsQuery>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let (kind, id) = path.into_inner();
    let Some(scope) = parse_trend_scope(&kind, id) else {
        return Ok(error_response(HWSystemError::not_found(format!(
            "不支持趋势统计的范围: {kind}"
        ))));
    };

    let result = services
        .aggregation
        .get_stats_for(&actor, scope, query.as_of)
        .await;
    Ok(respond(result, "获取趋势成功"))
}

// 配置路由
pub fn configure_stats_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/stats")
            .wrap(middlewares::RequireJWT)
            // 权限在业务层检查
            .route("/{kind}/{id}", web::get().to(get_stats))
            .route("/{kind}/{id}/trend", web::get().to(get_trend)),
    );
}
