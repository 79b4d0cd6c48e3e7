use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::models::{
    Comment, Post, ReactionEdge, ReactionKey, SubscriptionEdge, SubscriptionKey, TargetKind,
    TargetRef, User, Video, VideoTotals,
};
use crate::domain::page::{PageSlice, VideoFilter, VideoSort, Window};
use crate::error::ServiceResult;

/// Storage for reaction and subscription edges.
///
/// Implementations own the uniqueness invariant: at most one edge per natural
/// key, even when identical inserts race. Callers never check-then-insert.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EdgeStore: Send + Sync {
    // ========== Reactions ==========

    /// Insert unless an edge with this key exists. `Some` only when this call created it.
    async fn insert_reaction_if_absent(&self, key: &ReactionKey)
        -> ServiceResult<Option<ReactionEdge>>;

    /// Remove the edge if present, returning what was removed
    async fn remove_reaction(&self, key: &ReactionKey) -> ServiceResult<Option<ReactionEdge>>;

    async fn reaction_exists(&self, key: &ReactionKey) -> ServiceResult<bool>;

    async fn count_reactions(&self, target: TargetRef) -> ServiceResult<i64>;

    /// Counts keyed by target id; ids without reactions may be absent
    async fn count_reactions_batch(
        &self,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, i64>>;

    /// Subset of `target_ids` the actor has reacted to
    async fn reacted_targets(
        &self,
        actor_id: Uuid,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<HashSet<Uuid>>;

    /// All of an actor's reactions of one kind, most recent first
    async fn reactions_by_actor(
        &self,
        actor_id: Uuid,
        kind: TargetKind,
    ) -> ServiceResult<Vec<ReactionEdge>>;

    /// Distinct targets that currently hold at least one reaction
    async fn reaction_targets(&self) -> ServiceResult<Vec<TargetRef>>;

    async fn delete_reactions_by_target(&self, target: TargetRef) -> ServiceResult<u64>;

    async fn delete_reactions_by_targets(
        &self,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<u64>;

    async fn delete_reactions_by_actor(&self, actor_id: Uuid) -> ServiceResult<u64>;

    // ========== Subscriptions ==========

    async fn insert_subscription_if_absent(
        &self,
        key: &SubscriptionKey,
    ) -> ServiceResult<Option<SubscriptionEdge>>;

    async fn remove_subscription(
        &self,
        key: &SubscriptionKey,
    ) -> ServiceResult<Option<SubscriptionEdge>>;

    async fn subscription_exists(&self, key: &SubscriptionKey) -> ServiceResult<bool>;

    async fn count_subscribers(&self, channel_id: Uuid) -> ServiceResult<i64>;

    async fn count_subscribers_batch(
        &self,
        channel_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, i64>>;

    /// Number of channels a user subscribes to
    async fn count_subscriptions(&self, subscriber_id: Uuid) -> ServiceResult<i64>;

    /// Subset of `channel_ids` the subscriber follows
    async fn subscribed_channels(
        &self,
        subscriber_id: Uuid,
        channel_ids: &[Uuid],
    ) -> ServiceResult<HashSet<Uuid>>;

    /// Most recent first
    async fn subscriptions_by_subscriber(
        &self,
        subscriber_id: Uuid,
    ) -> ServiceResult<Vec<SubscriptionEdge>>;

    /// Most recent first
    async fn subscriptions_by_channel(&self, channel_id: Uuid)
        -> ServiceResult<Vec<SubscriptionEdge>>;

    async fn delete_subscriptions_by_channel(&self, channel_id: Uuid) -> ServiceResult<u64>;

    async fn delete_subscriptions_by_subscriber(&self, subscriber_id: Uuid) -> ServiceResult<u64>;
}

/// Read/delete view of the content collaborator's records.
///
/// Creation and editing of entities happen elsewhere; this service only needs
/// existence, ownership, scoped listings and the deletes that trigger cascades.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Readiness probe for the backing store
    async fn ping(&self) -> ServiceResult<()>;

    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>>;

    async fn get_users(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, User>>;

    /// Exact username match
    async fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>>;

    async fn get_video(&self, id: Uuid) -> ServiceResult<Option<Video>>;

    async fn get_videos(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, Video>>;

    /// Owner of a reactable entity, `None` when it does not exist
    async fn owner_of(&self, target: TargetRef) -> ServiceResult<Option<Uuid>>;

    /// Subset of `ids` that still exist
    async fn existing_ids(&self, kind: TargetKind, ids: &[Uuid]) -> ServiceResult<HashSet<Uuid>>;

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: VideoSort,
        window: Window,
    ) -> ServiceResult<PageSlice<Video>>;

    /// Newest first
    async fn list_comments_for_video(
        &self,
        video_id: Uuid,
        window: Window,
    ) -> ServiceResult<PageSlice<Comment>>;

    /// Newest first
    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        window: Window,
    ) -> ServiceResult<PageSlice<Post>>;

    async fn count_comments_for_video(&self, video_id: Uuid) -> ServiceResult<i64>;

    async fn video_ids_for_owner(&self, owner_id: Uuid) -> ServiceResult<Vec<Uuid>>;

    async fn video_totals_for_owner(&self, owner_id: Uuid) -> ServiceResult<VideoTotals>;

    async fn increment_views(&self, video_id: Uuid) -> ServiceResult<()>;

    /// Delete the entity record itself; `false` when it was already gone
    async fn delete_entity(&self, target: TargetRef) -> ServiceResult<bool>;

    /// Delete every comment on the video, returning the ids actually removed
    async fn delete_comments_for_video(&self, video_id: Uuid) -> ServiceResult<Vec<Uuid>>;

    /// Delete comments whose video no longer exists, returning their ids
    async fn delete_orphaned_comments(&self) -> ServiceResult<Vec<Uuid>>;
}
