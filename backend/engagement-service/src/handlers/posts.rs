/// Post handlers - a user's posts and owner delete
use actix_web::{web, HttpResponse};

use crate::domain::models::TargetRef;
use crate::error::ServiceResult;
use crate::handlers::{parse_id, PageParams};
use crate::middleware::{UserId, Viewer};
use crate::state::AppState;

/// GET /api/v1/users/{user_id}/posts
pub async fn list_user_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    user_id: web::Path<String>,
    query: web::Query<PageParams>,
) -> ServiceResult<HttpResponse> {
    let user_id = parse_id(&user_id, "user id")?;
    let page = state
        .views
        .list_user_posts(user_id, viewer.0, query.request())
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/users/by-username/{username}/posts
pub async fn list_posts_by_username(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    query: web::Query<PageParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .views
        .list_posts_by_username(&username, viewer.0, query.request())
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// DELETE /api/v1/posts/{post_id}
pub async fn delete_post(
    state: web::Data<AppState>,
    user_id: UserId,
    post_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let target = TargetRef::post(parse_id(&post_id, "post id")?);
    let report = state.cascades.delete_entity(user_id.0, target).await?;

    Ok(HttpResponse::Ok().json(report))
}
