use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use uuid::Uuid;

use super::require_actor;
use crate::middlewares::{self, RequireRole};
use crate::models::actors::entities::ActorRole;
use crate::models::submissions::{
    entities::AiAnalysis,
    requests::{
        GradeSubmissionRequest, RegradeSubmissionRequest, ResubmissionRequest,
        StudentSubmissionsQuery,
    },
    responses::{GradeSubmissionResponse, SubmissionListResponse},
};
use crate::services::{AppServices, grading::FeedbackChange};
use crate::utils::{error_response, respond};

// 列出学生在所有作业下的提交
pub async fn list_student_submissions(
    req: HttpRequest,
    services: web::Data<AppServices>,
    query: web::Query<StudentSubmissionsQuery>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .lifecycle
        .list_student_submissions(&actor, query.student_id, query.active_only)
        .await
        .map(|items| SubmissionListResponse {
            total: items.len(),
            items,
        });
    Ok(respond(result, "获取提交列表成功"))
}

// 获取提交详情
pub async fn get_submission(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services.lifecycle.get_submission(&actor, *path).await;
    Ok(respond(result, "获取提交成功"))
}

// 标记为已查看
pub async fn mark_reviewed(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services.lifecycle.mark_reviewed(&actor, *path).await;
    Ok(respond(result, "已标记为已查看"))
}

// 评分
pub async fn grade_submission(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
    body: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let GradeSubmissionRequest { score, feedback } = body.into_inner();
    let result = services
        .grading
        .grade(&actor, *path, score, feedback)
        .await
        .map(|submission| GradeSubmissionResponse::from(&submission));
    Ok(respond(result, "评分成功"))
}

// 改分
pub async fn regrade_submission(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
    body: web::Json<RegradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let RegradeSubmissionRequest {
        score,
        feedback,
        clear_feedback,
    } = body.into_inner();
    let feedback = match FeedbackChange::from_request(feedback, clear_feedback) {
        Ok(change) => change,
        Err(e) => return Ok(error_response(e)),
    };
    let result = services
        .grading
        .regrade(&actor, *path, score, feedback)
        .await
        .map(|submission| GradeSubmissionResponse::from(&submission));
    Ok(respond(result, "改分成功"))
}

// 要求重交
pub async fn request_resubmission(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
    body: web::Json<ResubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .lifecycle
        .request_resubmission(&actor, *path, &body.reason)
        .await;
    Ok(respond(result, "已要求学生重新提交"))
}

// 附加 AI 分析
pub async fn attach_ai_analysis(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
    body: web::Json<AiAnalysis>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .lifecycle
        .attach_ai_analysis(&actor, *path, body.into_inner())
        .await;
    Ok(respond(result, "AI 分析已保存"))
}

// 配置路由
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .wrap(middlewares::RequireJWT)
            // 权限在业务层检查（本人、家长、任课教师、校长）
            .service(web::resource("").route(web::get().to(list_student_submissions)))
            .service(web::resource("/{id}").route(web::get().to(get_submission)))
            .service(
                web::scope("/{id}")
                    .wrap(RequireRole::new(&ActorRole::Teacher))
                    .route("/review", web::post().to(mark_reviewed))
                    .route("/grade", web::post().to(grade_submission))
                    .route("/regrade", web::post().to(regrade_submission))
                    .route("/resubmission", web::post().to(request_resubmission))
                    .route("/ai-analysis", web::put().to(attach_ai_analysis)),
            ),
    );
}
