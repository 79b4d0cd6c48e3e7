use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ServiceError;

/// Kind of entity a reaction points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Video,
    Comment,
    Post,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Video => "video",
            TargetKind::Comment => "comment",
            TargetKind::Post => "post",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" | "videos" => Ok(TargetKind::Video),
            "comment" | "comments" => Ok(TargetKind::Comment),
            // Posts were called tweets by older clients
            "post" | "posts" | "tweet" | "tweets" => Ok(TargetKind::Post),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown target kind '{}'",
                other
            ))),
        }
    }
}

/// A typed reference to a reactable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: Uuid,
}

impl TargetRef {
    pub fn new(kind: TargetKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn video(id: Uuid) -> Self {
        Self::new(TargetKind::Video, id)
    }

    pub fn comment(id: Uuid) -> Self {
        Self::new(TargetKind::Comment, id)
    }

    pub fn post(id: Uuid) -> Self {
        Self::new(TargetKind::Post, id)
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Natural key of a reaction edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReactionKey {
    pub actor_id: Uuid,
    pub target: TargetRef,
}

impl ReactionKey {
    pub fn new(actor_id: Uuid, target: TargetRef) -> Self {
        Self { actor_id, target }
    }
}

/// Reaction (like) edge: actor -> video | comment | post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEdge {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub target_kind: TargetKind,
    pub created_at: DateTime<Utc>,
}

impl ReactionEdge {
    pub fn new(key: &ReactionKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: key.actor_id,
            target_id: key.target.id,
            target_kind: key.target.kind,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> ReactionKey {
        ReactionKey::new(self.actor_id, self.target())
    }

    pub fn target(&self) -> TargetRef {
        TargetRef::new(self.target_kind, self.target_id)
    }
}

/// Natural key of a subscription edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
}

impl SubscriptionKey {
    pub fn new(subscriber_id: Uuid, channel_id: Uuid) -> Self {
        Self {
            subscriber_id,
            channel_id,
        }
    }
}

/// Subscription edge: subscriber -> channel (a user)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEdge {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionEdge {
    pub fn new(key: &SubscriptionKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscriber_id: key.subscriber_id,
            channel_id: key.channel_id,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey::new(self.subscriber_id, self.channel_id)
    }
}

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Added,
    Removed,
}

impl ToggleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleState::Added => "added",
            ToggleState::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome<E> {
    pub state: ToggleState,
    pub edge: E,
}

// ============================================================================
// Entity records (owned by the content collaborator)
// ============================================================================

/// User entity; every user is also a channel
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
    pub email: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short text post (formerly "tweet")
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video count and summed views for one owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoTotals {
    pub videos: i64,
    pub views: i64,
}
