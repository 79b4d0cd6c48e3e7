/// HTTP handlers for engagement endpoints
///
/// - Reactions: like/unlike toggles and the viewer's liked videos
/// - Subscriptions: subscribe/unsubscribe toggles
/// - Videos, comments, posts: aggregated listings and owner deletes
/// - Channels: profile, subscribers, subscriptions and dashboard stats
/// - Admin: orphan repair sweep
pub mod admin;
pub mod channels;
pub mod comments;
pub mod health;
pub mod posts;
pub mod reactions;
pub mod subscriptions;
pub mod videos;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::ToggleOutcome;
use crate::domain::page::PageRequest;
use crate::error::{ServiceError, ServiceResult};

/// `page`/`limit` query parameters shared by listing endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::InvalidInput(format!("{} must be a UUID, got '{}'", what, raw)))
}

/// 201 when the edge was created, 200 when it was removed
pub(crate) fn toggle_response<E: Serialize>(outcome: ToggleOutcome<E>) -> HttpResponse {
    use crate::domain::models::ToggleState;

    match outcome.state {
        ToggleState::Added => HttpResponse::Created().json(outcome),
        ToggleState::Removed => HttpResponse::Ok().json(outcome),
    }
}

/// Mount the `/api/v1` routes; operator routes only when `admin_enabled`
pub fn configure(cfg: &mut web::ServiceConfig, admin_enabled: bool) {
    let mut api = web::scope("/api/v1")
        .route(
            "/reactions/{kind}/{target_id}",
            web::post().to(reactions::toggle_reaction),
        )
        .route(
            "/subscriptions/{channel_id}",
            web::post().to(subscriptions::toggle_subscription),
        )
        .route("/me/liked-videos", web::get().to(reactions::liked_videos))
        .service(
            web::scope("/videos")
                .service(web::resource("").route(web::get().to(videos::list_videos)))
                .service(
                    web::resource("/{video_id}")
                        .route(web::get().to(videos::get_video))
                        .route(web::delete().to(videos::delete_video)),
                )
                .service(
                    web::resource("/{video_id}/comments")
                        .route(web::get().to(videos::list_video_comments)),
                ),
        )
        .route(
            "/comments/{comment_id}",
            web::delete().to(comments::delete_comment),
        )
        .route("/posts/{post_id}", web::delete().to(posts::delete_post))
        .service(
            web::scope("/users")
                .route("/{user_id}/posts", web::get().to(posts::list_user_posts))
                .route(
                    "/by-username/{username}/posts",
                    web::get().to(posts::list_posts_by_username),
                )
                .route(
                    "/{user_id}/subscriptions",
                    web::get().to(channels::list_subscriptions),
                ),
        )
        .service(
            web::scope("/channels")
                .route("/{channel_id}", web::get().to(channels::channel_profile))
                .route(
                    "/{channel_id}/subscribers",
                    web::get().to(channels::list_subscribers),
                )
                .route("/{channel_id}/stats", web::get().to(channels::channel_stats)),
        );

    if admin_enabled {
        api = api.service(
            web::scope("/admin")
                .route("/cascade/sweep", web::post().to(admin::sweep_orphans))
                .route(
                    "/channels/{channel_id}/deleted",
                    web::post().to(admin::channel_deleted),
                ),
        );
    }

    cfg.app_data(web::QueryConfig::default().error_handler(|err, _| {
        ServiceError::InvalidInput(err.to_string()).into()
    }))
    .service(api);
}
