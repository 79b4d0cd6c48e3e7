/// Channel handlers - profile, subscribers, subscriptions, dashboard stats
use actix_web::{web, HttpResponse};

use crate::error::ServiceResult;
use crate::handlers::{parse_id, PageParams};
use crate::middleware::Viewer;
use crate::state::AppState;

/// GET /api/v1/channels/{channel_id}
pub async fn channel_profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    channel_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let channel_id = parse_id(&channel_id, "channel id")?;
    let profile = state.views.channel_profile(channel_id, viewer.0).await?;

    Ok(HttpResponse::Ok().json(profile))
}

/// GET /api/v1/channels/{channel_id}/subscribers
pub async fn list_subscribers(
    state: web::Data<AppState>,
    channel_id: web::Path<String>,
    query: web::Query<PageParams>,
) -> ServiceResult<HttpResponse> {
    let channel_id = parse_id(&channel_id, "channel id")?;
    let page = state
        .views
        .list_channel_subscribers(channel_id, query.request())
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/channels/{channel_id}/stats
pub async fn channel_stats(
    state: web::Data<AppState>,
    channel_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let channel_id = parse_id(&channel_id, "channel id")?;
    let stats = state.views.channel_stats(channel_id).await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/v1/users/{user_id}/subscriptions
pub async fn list_subscriptions(
    state: web::Data<AppState>,
    viewer: Viewer,
    user_id: web::Path<String>,
    query: web::Query<PageParams>,
) -> ServiceResult<HttpResponse> {
    let subscriber_id = parse_id(&user_id, "user id")?;
    let page = state
        .views
        .list_subscribed_channels(subscriber_id, viewer.0, query.request())
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
