use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use uuid::Uuid;

use super::require_actor;
use crate::middlewares::{self, RequireRole};
use crate::models::{actors::entities::ActorRole, directory::requests::SyncClassRosterRequest};
use crate::services::AppServices;
use crate::utils::respond;

// 同步班级花名册
pub async fn sync_class_roster(
    req: HttpRequest,
    services: web::Data<AppServices>,
    path: web::Path<Uuid>,
    body: web::Json<SyncClassRosterRequest>,
) -> ActixResult<HttpResponse> {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(resp) => return Ok(resp),
    };
    let result = services
        .directory
        .sync_class_roster(&actor, *path, body.into_inner())
        .await;
    Ok(respond(result, "班级花名册已同步"))
}

// 配置路由
pub fn configure_directory_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/directory")
            .wrap(RequireRole::new(&ActorRole::Principal))
            .wrap(middlewares::RequireJWT)
            .route("/classes/{id}", web::put().to(sync_class_roster)),
    );
}
