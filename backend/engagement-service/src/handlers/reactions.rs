/// Reaction handlers - like/unlike toggles and the viewer's liked videos
use actix_web::{web, HttpResponse};
use tracing::info;

use crate::domain::models::{TargetKind, TargetRef};
use crate::error::ServiceResult;
use crate::handlers::{parse_id, toggle_response, PageParams};
use crate::middleware::UserId;
use crate::state::AppState;

/// POST /api/v1/reactions/{kind}/{target_id}
pub async fn toggle_reaction(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<(String, String)>,
) -> ServiceResult<HttpResponse> {
    let (kind, target_id) = path.into_inner();
    let kind: TargetKind = kind.parse()?;
    let target = TargetRef::new(kind, parse_id(&target_id, "target id")?);

    let outcome = state.toggles.toggle_reaction(user_id.0, target).await?;

    info!(
        actor_id = %user_id.0,
        target = %target,
        state = outcome.state.as_str(),
        "reaction toggled"
    );
    Ok(toggle_response(outcome))
}

/// GET /api/v1/me/liked-videos
pub async fn liked_videos(
    state: web::Data<AppState>,
    user_id: UserId,
    query: web::Query<PageParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .views
        .list_liked_videos(user_id.0, query.request())
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
