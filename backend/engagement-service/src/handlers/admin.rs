/// Operator endpoints, mounted only when ENGAGEMENT_ADMIN_ENABLED is set
use actix_web::{web, HttpResponse};

use crate::error::ServiceResult;
use crate::handlers::parse_id;
use crate::state::AppState;

/// POST /api/v1/admin/cascade/sweep
pub async fn sweep_orphans(state: web::Data<AppState>) -> ServiceResult<HttpResponse> {
    let report = state.cascades.sweep_orphans().await?;
    Ok(HttpResponse::Ok().json(report))
}

/// POST /api/v1/admin/channels/{channel_id}/deleted
///
/// Called by the user service after it removes an account.
pub async fn channel_deleted(
    state: web::Data<AppState>,
    channel_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let channel_id = parse_id(&channel_id, "channel id")?;
    let report = state.cascades.on_channel_deleted(channel_id).await?;
    Ok(HttpResponse::Ok().json(report))
}
