//! Process-local stores backed by `DashMap`.
//!
//! Used by the `memory` backend and by the test suites. Edge uniqueness comes
//! from the map's entry API, which holds the shard lock across the vacancy
//! check and the insert.

use anyhow::Context;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use uuid::Uuid;

use crate::domain::models::{
    Comment, Post, ReactionEdge, ReactionKey, SubscriptionEdge, SubscriptionKey, TargetKind,
    TargetRef, User, Video, VideoTotals,
};
use crate::domain::page::{newest_first, PageSlice, VideoFilter, VideoSort, Window};
use crate::error::ServiceResult;
use crate::repository::{EdgeStore, EntityStore};

fn most_recent_reactions(mut edges: Vec<ReactionEdge>) -> Vec<ReactionEdge> {
    edges.sort_by(|a, b| newest_first(a.created_at, a.target_id, b.created_at, b.target_id));
    edges
}

fn most_recent_subscriptions(mut edges: Vec<SubscriptionEdge>) -> Vec<SubscriptionEdge> {
    edges.sort_by(|a, b| newest_first(a.created_at, a.id, b.created_at, b.id));
    edges
}

#[derive(Default)]
pub struct InMemoryEdgeStore {
    reactions: DashMap<ReactionKey, ReactionEdge>,
    subscriptions: DashMap<SubscriptionKey, SubscriptionEdge>,
}

impl InMemoryEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reaction_len(&self) -> usize {
        self.reactions.len()
    }

    pub fn subscription_len(&self) -> usize {
        self.subscriptions.len()
    }
}

#[async_trait::async_trait]
impl EdgeStore for InMemoryEdgeStore {
    async fn insert_reaction_if_absent(
        &self,
        key: &ReactionKey,
    ) -> ServiceResult<Option<ReactionEdge>> {
        match self.reactions.entry(*key) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let edge = ReactionEdge::new(key);
                slot.insert(edge.clone());
                Ok(Some(edge))
            }
        }
    }

    async fn remove_reaction(&self, key: &ReactionKey) -> ServiceResult<Option<ReactionEdge>> {
        Ok(self.reactions.remove(key).map(|(_, edge)| edge))
    }

    async fn reaction_exists(&self, key: &ReactionKey) -> ServiceResult<bool> {
        Ok(self.reactions.contains_key(key))
    }

    async fn count_reactions(&self, target: TargetRef) -> ServiceResult<i64> {
        Ok(self
            .reactions
            .iter()
            .filter(|entry| entry.key().target == target)
            .count() as i64)
    }

    async fn count_reactions_batch(
        &self,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, i64>> {
        let wanted: HashSet<Uuid> = target_ids.iter().copied().collect();
        let mut counts = HashMap::new();
        for entry in self.reactions.iter() {
            let target = entry.key().target;
            if target.kind == kind && wanted.contains(&target.id) {
                *counts.entry(target.id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn reacted_targets(
        &self,
        actor_id: Uuid,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<HashSet<Uuid>> {
        Ok(target_ids
            .iter()
            .copied()
            .filter(|id| {
                self.reactions
                    .contains_key(&ReactionKey::new(actor_id, TargetRef::new(kind, *id)))
            })
            .collect())
    }

    async fn reactions_by_actor(
        &self,
        actor_id: Uuid,
        kind: TargetKind,
    ) -> ServiceResult<Vec<ReactionEdge>> {
        let edges = self
            .reactions
            .iter()
            .filter(|entry| entry.key().actor_id == actor_id && entry.key().target.kind == kind)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(most_recent_reactions(edges))
    }

    async fn reaction_targets(&self) -> ServiceResult<Vec<TargetRef>> {
        let targets: HashSet<TargetRef> =
            self.reactions.iter().map(|entry| entry.key().target).collect();
        Ok(targets.into_iter().collect())
    }

    async fn delete_reactions_by_target(&self, target: TargetRef) -> ServiceResult<u64> {
        let mut removed = 0;
        self.reactions.retain(|key, _| {
            let hit = key.target == target;
            if hit {
                removed += 1;
            }
            !hit
        });
        Ok(removed)
    }

    async fn delete_reactions_by_targets(
        &self,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }
        let doomed: HashSet<Uuid> = target_ids.iter().copied().collect();
        let mut removed = 0;
        self.reactions.retain(|key, _| {
            let hit = key.target.kind == kind && doomed.contains(&key.target.id);
            if hit {
                removed += 1;
            }
            !hit
        });
        Ok(removed)
    }

    async fn delete_reactions_by_actor(&self, actor_id: Uuid) -> ServiceResult<u64> {
        let mut removed = 0;
        self.reactions.retain(|key, _| {
            let hit = key.actor_id == actor_id;
            if hit {
                removed += 1;
            }
            !hit
        });
        Ok(removed)
    }

    async fn insert_subscription_if_absent(
        &self,
        key: &SubscriptionKey,
    ) -> ServiceResult<Option<SubscriptionEdge>> {
        match self.subscriptions.entry(*key) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let edge = SubscriptionEdge::new(key);
                slot.insert(edge.clone());
                Ok(Some(edge))
            }
        }
    }

    async fn remove_subscription(
        &self,
        key: &SubscriptionKey,
    ) -> ServiceResult<Option<SubscriptionEdge>> {
        Ok(self.subscriptions.remove(key).map(|(_, edge)| edge))
    }

    async fn subscription_exists(&self, key: &SubscriptionKey) -> ServiceResult<bool> {
        Ok(self.subscriptions.contains_key(key))
    }

    async fn count_subscribers(&self, channel_id: Uuid) -> ServiceResult<i64> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|entry| entry.key().channel_id == channel_id)
            .count() as i64)
    }

    async fn count_subscribers_batch(
        &self,
        channel_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, i64>> {
        let wanted: HashSet<Uuid> = channel_ids.iter().copied().collect();
        let mut counts = HashMap::new();
        for entry in self.subscriptions.iter() {
            let channel_id = entry.key().channel_id;
            if wanted.contains(&channel_id) {
                *counts.entry(channel_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn count_subscriptions(&self, subscriber_id: Uuid) -> ServiceResult<i64> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|entry| entry.key().subscriber_id == subscriber_id)
            .count() as i64)
    }

    async fn subscribed_channels(
        &self,
        subscriber_id: Uuid,
        channel_ids: &[Uuid],
    ) -> ServiceResult<HashSet<Uuid>> {
        Ok(channel_ids
            .iter()
            .copied()
            .filter(|id| {
                self.subscriptions
                    .contains_key(&SubscriptionKey::new(subscriber_id, *id))
            })
            .collect())
    }

    async fn subscriptions_by_subscriber(
        &self,
        subscriber_id: Uuid,
    ) -> ServiceResult<Vec<SubscriptionEdge>> {
        let edges = self
            .subscriptions
            .iter()
            .filter(|entry| entry.key().subscriber_id == subscriber_id)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(most_recent_subscriptions(edges))
    }

    async fn subscriptions_by_channel(
        &self,
        channel_id: Uuid,
    ) -> ServiceResult<Vec<SubscriptionEdge>> {
        let edges = self
            .subscriptions
            .iter()
            .filter(|entry| entry.key().channel_id == channel_id)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(most_recent_subscriptions(edges))
    }

    async fn delete_subscriptions_by_channel(&self, channel_id: Uuid) -> ServiceResult<u64> {
        let mut removed = 0;
        self.subscriptions.retain(|key, _| {
            let hit = key.channel_id == channel_id;
            if hit {
                removed += 1;
            }
            !hit
        });
        Ok(removed)
    }

    async fn delete_subscriptions_by_subscriber(&self, subscriber_id: Uuid) -> ServiceResult<u64> {
        let mut removed = 0;
        self.subscriptions.retain(|key, _| {
            let hit = key.subscriber_id == subscriber_id;
            if hit {
                removed += 1;
            }
            !hit
        });
        Ok(removed)
    }
}

/// Seed document accepted by [`InMemoryEntityStore::load_seed`]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub users: Vec<User>,
    pub videos: Vec<Video>,
    pub comments: Vec<Comment>,
    pub posts: Vec<Post>,
}

#[derive(Default)]
pub struct InMemoryEntityStore {
    users: DashMap<Uuid, User>,
    videos: DashMap<Uuid, Video>,
    comments: DashMap<Uuid, Comment>,
    posts: DashMap<Uuid, Post>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_video(&self, video: Video) {
        self.videos.insert(video.id, video);
    }

    pub fn insert_comment(&self, comment: Comment) {
        self.comments.insert(comment.id, comment);
    }

    pub fn insert_post(&self, post: Post) {
        self.posts.insert(post.id, post);
    }

    pub fn apply_seed(&self, seed: SeedData) {
        seed.users.into_iter().for_each(|u| self.insert_user(u));
        seed.videos.into_iter().for_each(|v| self.insert_video(v));
        seed.comments.into_iter().for_each(|c| self.insert_comment(c));
        seed.posts.into_iter().for_each(|p| self.insert_post(p));
    }

    /// Load a JSON [`SeedData`] file into the store
    pub async fn load_seed(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: SeedData = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;
        tracing::info!(
            users = seed.users.len(),
            videos = seed.videos.len(),
            comments = seed.comments.len(),
            posts = seed.posts.len(),
            "seeding in-memory entity store"
        );
        self.apply_seed(seed);
        Ok(())
    }

    fn contains(&self, target: TargetRef) -> bool {
        match target.kind {
            TargetKind::Video => self.videos.contains_key(&target.id),
            TargetKind::Comment => self.comments.contains_key(&target.id),
            TargetKind::Post => self.posts.contains_key(&target.id),
        }
    }
}

#[async_trait::async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    async fn get_users(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| (*id, u.value().clone())))
            .collect())
    }

    async fn get_video(&self, id: Uuid) -> ServiceResult<Option<Video>> {
        Ok(self.videos.get(&id).map(|v| v.value().clone()))
    }

    async fn get_videos(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, Video>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.videos.get(id).map(|v| (*id, v.value().clone())))
            .collect())
    }

    async fn owner_of(&self, target: TargetRef) -> ServiceResult<Option<Uuid>> {
        let owner = match target.kind {
            TargetKind::Video => self.videos.get(&target.id).map(|v| v.owner_id),
            TargetKind::Comment => self.comments.get(&target.id).map(|c| c.owner_id),
            TargetKind::Post => self.posts.get(&target.id).map(|p| p.owner_id),
        };
        Ok(owner)
    }

    async fn existing_ids(&self, kind: TargetKind, ids: &[Uuid]) -> ServiceResult<HashSet<Uuid>> {
        Ok(ids
            .iter()
            .copied()
            .filter(|id| self.contains(TargetRef::new(kind, *id)))
            .collect())
    }

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: VideoSort,
        window: Window,
    ) -> ServiceResult<PageSlice<Video>> {
        let mut videos: Vec<Video> = self
            .videos
            .iter()
            .filter(|v| filter.matches(v.value()))
            .map(|v| v.value().clone())
            .collect();
        videos.sort_by(|a, b| sort.compare(a, b));
        Ok(PageSlice::from_ordered(videos, window))
    }

    async fn list_comments_for_video(
        &self,
        video_id: Uuid,
        window: Window,
    ) -> ServiceResult<PageSlice<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .map(|c| c.value().clone())
            .collect();
        comments.sort_by(|a, b| newest_first(a.created_at, a.id, b.created_at, b.id));
        Ok(PageSlice::from_ordered(comments, window))
    }

    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        window: Window,
    ) -> ServiceResult<PageSlice<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.value().clone())
            .collect();
        posts.sort_by(|a, b| newest_first(a.created_at, a.id, b.created_at, b.id));
        Ok(PageSlice::from_ordered(posts, window))
    }

    async fn count_comments_for_video(&self, video_id: Uuid) -> ServiceResult<i64> {
        Ok(self
            .comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .count() as i64)
    }

    async fn video_ids_for_owner(&self, owner_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        Ok(self
            .videos
            .iter()
            .filter(|v| v.owner_id == owner_id)
            .map(|v| v.id)
            .collect())
    }

    async fn video_totals_for_owner(&self, owner_id: Uuid) -> ServiceResult<VideoTotals> {
        Ok(self
            .videos
            .iter()
            .filter(|v| v.owner_id == owner_id)
            .fold(VideoTotals::default(), |acc, v| VideoTotals {
                videos: acc.videos + 1,
                views: acc.views + v.views,
            }))
    }

    async fn increment_views(&self, video_id: Uuid) -> ServiceResult<()> {
        if let Some(mut video) = self.videos.get_mut(&video_id) {
            video.views += 1;
        }
        Ok(())
    }

    async fn delete_entity(&self, target: TargetRef) -> ServiceResult<bool> {
        let removed = match target.kind {
            TargetKind::Video => self.videos.remove(&target.id).is_some(),
            TargetKind::Comment => self.comments.remove(&target.id).is_some(),
            TargetKind::Post => self.posts.remove(&target.id).is_some(),
        };
        Ok(removed)
    }

    async fn delete_comments_for_video(&self, video_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let mut removed = Vec::new();
        self.comments.retain(|id, comment| {
            let hit = comment.video_id == video_id;
            if hit {
                removed.push(*id);
            }
            !hit
        });
        Ok(removed)
    }

    async fn delete_orphaned_comments(&self) -> ServiceResult<Vec<Uuid>> {
        let orphaned: Vec<Uuid> = self
            .comments
            .iter()
            .filter(|c| !self.videos.contains_key(&c.video_id))
            .map(|c| c.id)
            .collect();
        for id in &orphaned {
            self.comments.remove(id);
        }
        Ok(orphaned)
    }
}
