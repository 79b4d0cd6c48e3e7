//! Read-side projections.
//!
//! Only the fields declared here ever reach a client; entity records carry
//! internal columns (owner ids, emails, parent ids) that stay behind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::{Comment, Post, TargetKind, User, Video};

/// Public projection of a user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
}

impl From<&User> for OwnerProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.full_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Entity enriched with owner, reaction count and viewer flag
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedView<T> {
    #[serde(flatten)]
    pub entity: T,
    pub owner: Option<OwnerProfile>,
    pub reaction_count: i64,
    pub viewer_has_reacted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entity that the aggregation pipeline can enrich
pub trait Reactable: Send {
    type Summary: Serialize + Send;

    const KIND: TargetKind;

    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
    fn summarize(self) -> Self::Summary;
}

impl Reactable for Video {
    type Summary = VideoSummary;

    const KIND: TargetKind = TargetKind::Video;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    fn summarize(self) -> VideoSummary {
        VideoSummary {
            id: self.id,
            title: self.title,
            description: self.description,
            video_file: self.video_file,
            thumbnail: self.thumbnail,
            duration: self.duration,
            views: self.views,
            is_published: self.is_published,
            created_at: self.created_at,
        }
    }
}

impl Reactable for Comment {
    type Summary = CommentSummary;

    const KIND: TargetKind = TargetKind::Comment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    fn summarize(self) -> CommentSummary {
        CommentSummary {
            id: self.id,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Reactable for Post {
    type Summary = PostSummary;

    const KIND: TargetKind = TargetKind::Post;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    fn summarize(self) -> PostSummary {
        PostSummary {
            id: self.id,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Item of the viewer's liked-videos page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoView {
    pub liked_at: DateTime<Utc>,
    #[serde(flatten)]
    pub video: AggregatedView<VideoSummary>,
}

/// Single video with the counters shown on its watch page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: AggregatedView<VideoSummary>,
    pub comment_count: i64,
    pub owner_subscriber_count: i64,
    pub viewer_is_subscribed: bool,
}

/// Channel in a subscriber's subscription list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelView {
    #[serde(flatten)]
    pub channel: OwnerProfile,
    pub subscribed_at: DateTime<Utc>,
    pub subscriber_count: i64,
    pub viewer_is_subscribed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberView {
    #[serde(flatten)]
    pub subscriber: OwnerProfile,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub channel: OwnerProfile,
    pub cover_image: Option<String>,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    pub viewer_is_subscribed: bool,
}

/// Creator dashboard totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_subscribers: i64,
    pub total_videos: i64,
    pub total_views: i64,
    pub total_likes: i64,
}
