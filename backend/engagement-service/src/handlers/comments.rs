/// Comment handlers - owner delete with cascade
use actix_web::{web, HttpResponse};

use crate::domain::models::TargetRef;
use crate::error::ServiceResult;
use crate::handlers::parse_id;
use crate::middleware::UserId;
use crate::state::AppState;

/// DELETE /api/v1/comments/{comment_id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    comment_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let target = TargetRef::comment(parse_id(&comment_id, "comment id")?);
    let report = state.cascades.delete_entity(user_id.0, target).await?;

    Ok(HttpResponse::Ok().json(report))
}
