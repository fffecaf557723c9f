use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use uuid::Uuid;

use super::require_actor;
use crate::middlewares::{self, RequireRole};
use crate::models::actors::entities::ActorRole;
use crate::models::homeworks::{
    requests::{AmendHomeworkRequest, CreateHomeworkRequest, HomeworkListQuery},
    responses::DeleteHomeworkResponse,
};
use crate::models::submissions::{
    requests::{NewSubmission, SubmitHomeworkRequest},
    responses::{SubmissionListResponse, SubmitHomeworkResponse},
};
use crate::services::AppServices;
use crate::utils::{respond, respond_created};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

// 列出班级作业
pub async fn list_homeworks(
    req: HttpRequest,
    services: web::Data<AppServices>,
    query: web::Query<HomeworkListQuery>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .homeworks
        .list_class_homeworks(&actor, query.class_id)
        .await;
    Ok(respond(result, "获取作业列表成功"))
}

// 创建作业
pub async fn create_homework(
    req: HttpRequest,
    services: web::Data<AppServices>,
    body: web::Json<CreateHomeworkRequest>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .homeworks
        .create_homework(&actor, body.into_inner())
        .await;
    Ok(respond_created(result, "作业创建成功"))
}

// 获取作业详情
pub async fn get_homework(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services.homeworks.get_homework(&actor, *path).await;
    Ok(respond(result, "获取作业成功"))
}

// 修改作业
pub async fn amend_homework(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
    body: web::Json<AmendHomeworkRequest>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .homeworks
        .amend_homework(&actor, *path, body.into_inner())
        .await;
    Ok(respond(result, "作业修改成功"))
}

// 删除作业（已有提交时归档）
pub async fn delete_homework(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let homework_id = *path;
    let result = services
        .homeworks
        .delete_homework(&actor, homework_id)
        .await
        .map(|outcome| DeleteHomeworkResponse {
            homework_id,
            outcome,
        });
    Ok(respond(result, "作业已删除"))
}

// 提交作业；幂等键可以放在请求体或 Idempotency-Key 头中
pub async fn submit_homework(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
    body: web::Json<SubmitHomeworkRequest>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let body = body.into_inner();
    let idempotency_key = body.idempotency_key.or_else(|| {
        req.headers()
            .get(IDEMPOTENCY_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    });

    let result = services
        .lifecycle
        .submit(
            &actor,
            NewSubmission {
                homework_id: *path,
                student_id: actor.id,
                files: body.files,
                idempotency_key,
            },
        )
        .await
        .map(|submission| SubmitHomeworkResponse::from(&submission));
    Ok(respond_created(result, "作业提交成功"))
}

// 作业下的有效提交
pub async fn list_submissions(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .lifecycle
        .list_homework_submissions(&actor, *path)
        .await
        .map(|items| SubmissionListResponse {
            total: items.len(),
            items,
        });
    Ok(respond(result, "获取提交列表成功"))
}

// 学生的提交历史
pub async fn submission_history(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<(Uuid, Uuid)>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let (homework_id, student_id) = path.into_inner();
    let result = services
        .lifecycle
        .submission_history(&actor, homework_id, student_id)
        .await
        .map(|items| SubmissionListResponse {
            total: items.len(),
            items,
        });
    Ok(respond(result, "获取提交历史成功"))
}

// 配置路由
pub fn configure_homeworks_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/homeworks")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    // 列出班级作业 - 班级成员、家长、校长（业务层检查）
                    .route(web::get().to(list_homeworks))
                    // 创建作业 - 仅教师
                    .route(
                        web::post()
                            .to(create_homework)
                            .wrap(RequireRole::new(&ActorRole::Teacher)),
                    ),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_homework))
                    .route(
                        web::patch()
                            .to(amend_homework)
                            .wrap(RequireRole::new(&ActorRole::Teacher)),
                    )
                    .route(
                        web::delete()
                            .to(delete_homework)
                            .wrap(RequireRole::new(&ActorRole::Teacher)),
                    ),
            )
            .service(
                web::resource("/{id}/submissions")
                    // 提交作业 - 仅学生
                    .route(
                        web::post()
                            .to(submit_homework)
                            .wrap(RequireRole::new(&ActorRole::Student)),
                    )
                    // 提交列表 - 任课教师、校长
                    .route(
                        web::get()
                            .to(list_submissions)
                            .wrap(RequireRole::new_any(ActorRole::staff_roles())),
                    ),
            )
            .service(
                web::resource("/{id}/submissions/students/{student_id}")
                    // 权限在业务层检查（本人、家长、任课教师、校长）
                    .route(web::get().to(submission_history)),
            ),
    );
}
