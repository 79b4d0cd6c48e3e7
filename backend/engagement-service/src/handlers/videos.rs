/// Video handlers - listings, watch page, owner delete
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::models::TargetRef;
use crate::domain::page::{PageRequest, SortDirection, VideoFilter, VideoSort, VideoSortField};
use crate::error::ServiceResult;
use crate::handlers::{parse_id, PageParams};
use crate::middleware::{UserId, Viewer};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVideosParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    #[serde(alias = "userId")]
    pub owner: Option<String>,
    pub query: Option<String>,
}

impl ListVideosParams {
    fn filter(&self) -> ServiceResult<VideoFilter> {
        let owner_id = self
            .owner
            .as_deref()
            .map(|raw| parse_id(raw, "owner"))
            .transpose()?;
        let query = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        Ok(VideoFilter {
            owner_id,
            query,
            published_only: true,
        })
    }

    fn sort(&self) -> ServiceResult<VideoSort> {
        Ok(VideoSort {
            field: VideoSortField::parse(self.sort_by.as_deref())?,
            direction: SortDirection::parse(self.sort_type.as_deref()),
        })
    }
}

/// GET /api/v1/videos
pub async fn list_videos(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<ListVideosParams>,
) -> ServiceResult<HttpResponse> {
    let page = state
        .views
        .list_videos(
            query.filter()?,
            query.sort()?,
            viewer.0,
            PageRequest::new(query.page, query.limit),
        )
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /api/v1/videos/{video_id}
pub async fn get_video(
    state: web::Data<AppState>,
    viewer: Viewer,
    video_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let video_id: Uuid = parse_id(&video_id, "video id")?;
    let detail = state.views.get_video(video_id, viewer.0).await?;

    Ok(HttpResponse::Ok().json(detail))
}

/// GET /api/v1/videos/{video_id}/comments
pub async fn list_video_comments(
    state: web::Data<AppState>,
    viewer: Viewer,
    video_id: web::Path<String>,
    query: web::Query<PageParams>,
) -> ServiceResult<HttpResponse> {
    let video_id = parse_id(&video_id, "video id")?;
    let page = state
        .views
        .list_video_comments(video_id, viewer.0, query.request())
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// DELETE /api/v1/videos/{video_id}
pub async fn delete_video(
    state: web::Data<AppState>,
    user_id: UserId,
    video_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let target = TargetRef::video(parse_id(&video_id, "video id")?);
    let report = state.cascades.delete_entity(user_id.0, target).await?;

    Ok(HttpResponse::Ok().json(report))
}
