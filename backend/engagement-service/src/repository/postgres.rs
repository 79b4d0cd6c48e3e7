//! PostgreSQL stores.
//!
//! Edge uniqueness is enforced by the unique constraints on `reactions` and
//! `subscriptions`; inserts use `ON CONFLICT DO NOTHING RETURNING` so the
//! caller learns whether this statement created the row.

use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::{
    Comment, Post, ReactionEdge, ReactionKey, SubscriptionEdge, SubscriptionKey, TargetKind,
    TargetRef, User, Video, VideoTotals,
};
use crate::domain::page::{PageSlice, VideoFilter, VideoSort, Window};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{EdgeStore, EntityStore};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const REACTION_COLUMNS: &str = "id, actor_id, target_id, target_kind, created_at";
const SUBSCRIPTION_COLUMNS: &str = "id, subscriber_id, channel_id, created_at";
const USER_COLUMNS: &str = "id, username, full_name, avatar, email, cover_image, created_at";
const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_file, thumbnail, duration, \
                             views, is_published, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, video_id, owner_id, content, created_at, updated_at";
const POST_COLUMNS: &str = "id, owner_id, content, created_at, updated_at";

fn table_for(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Video => "videos",
        TargetKind::Comment => "comments",
        TargetKind::Post => "posts",
    }
}

fn parse_kind(raw: &str) -> ServiceResult<TargetKind> {
    raw.parse()
        .map_err(|_| ServiceError::Internal(format!("unexpected target_kind '{}' in reactions", raw)))
}

/// `target_kind` is stored as text
#[derive(sqlx::FromRow)]
struct ReactionRow {
    id: Uuid,
    actor_id: Uuid,
    target_id: Uuid,
    target_kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReactionRow> for ReactionEdge {
    type Error = ServiceError;

    fn try_from(row: ReactionRow) -> Result<Self, Self::Error> {
        Ok(ReactionEdge {
            id: row.id,
            actor_id: row.actor_id,
            target_id: row.target_id,
            target_kind: parse_kind(&row.target_kind)?,
            created_at: row.created_at,
        })
    }
}

fn into_edges(rows: Vec<ReactionRow>) -> ServiceResult<Vec<ReactionEdge>> {
    rows.into_iter().map(ReactionEdge::try_from).collect()
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PgEdgeStore {
    pool: PgPool,
}

impl PgEdgeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EdgeStore for PgEdgeStore {
    async fn insert_reaction_if_absent(
        &self,
        key: &ReactionKey,
    ) -> ServiceResult<Option<ReactionEdge>> {
        let row = sqlx::query_as::<_, ReactionRow>(&format!(
            r#"
            INSERT INTO reactions (id, actor_id, target_id, target_kind, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (actor_id, target_id, target_kind) DO NOTHING
            RETURNING {}
            "#,
            REACTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(key.actor_id)
        .bind(key.target.id)
        .bind(key.target.kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReactionEdge::try_from).transpose()
    }

    async fn remove_reaction(&self, key: &ReactionKey) -> ServiceResult<Option<ReactionEdge>> {
        let row = sqlx::query_as::<_, ReactionRow>(&format!(
            r#"
            DELETE FROM reactions
            WHERE actor_id = $1 AND target_id = $2 AND target_kind = $3
            RETURNING {}
            "#,
            REACTION_COLUMNS
        ))
        .bind(key.actor_id)
        .bind(key.target.id)
        .bind(key.target.kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReactionEdge::try_from).transpose()
    }

    async fn reaction_exists(&self, key: &ReactionKey) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reactions
                WHERE actor_id = $1 AND target_id = $2 AND target_kind = $3
            )
            "#,
        )
        .bind(key.actor_id)
        .bind(key.target.id)
        .bind(key.target.kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_reactions(&self, target: TargetRef) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reactions WHERE target_kind = $1 AND target_id = $2",
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_reactions_batch(
        &self,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, i64>> {
        if target_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT target_id, COUNT(*)
            FROM reactions
            WHERE target_kind = $1 AND target_id = ANY($2)
            GROUP BY target_id
            "#,
        )
        .bind(kind.as_str())
        .bind(target_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn reacted_targets(
        &self,
        actor_id: Uuid,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<HashSet<Uuid>> {
        if target_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT target_id
            FROM reactions
            WHERE actor_id = $1 AND target_kind = $2 AND target_id = ANY($3)
            "#,
        )
        .bind(actor_id)
        .bind(kind.as_str())
        .bind(target_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn reactions_by_actor(
        &self,
        actor_id: Uuid,
        kind: TargetKind,
    ) -> ServiceResult<Vec<ReactionEdge>> {
        let rows = sqlx::query_as::<_, ReactionRow>(&format!(
            r#"
            SELECT {}
            FROM reactions
            WHERE actor_id = $1 AND target_kind = $2
            ORDER BY created_at DESC, target_id ASC
            "#,
            REACTION_COLUMNS
        ))
        .bind(actor_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_edges(rows)
    }

    async fn reaction_targets(&self) -> ServiceResult<Vec<TargetRef>> {
        let rows: Vec<(String, Uuid)> =
            sqlx::query_as("SELECT DISTINCT target_kind, target_id FROM reactions")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(kind, id)| Ok(TargetRef::new(parse_kind(&kind)?, id)))
            .collect()
    }

    async fn delete_reactions_by_target(&self, target: TargetRef) -> ServiceResult<u64> {
        let result =
            sqlx::query("DELETE FROM reactions WHERE target_kind = $1 AND target_id = $2")
                .bind(target.kind.as_str())
                .bind(target.id)
                .execute(&self.pool)
                .await?;

        debug!("Deleted {} reactions on {}", result.rows_affected(), target);
        Ok(result.rows_affected())
    }

    async fn delete_reactions_by_targets(
        &self,
        kind: TargetKind,
        target_ids: &[Uuid],
    ) -> ServiceResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }

        let result =
            sqlx::query("DELETE FROM reactions WHERE target_kind = $1 AND target_id = ANY($2)")
                .bind(kind.as_str())
                .bind(target_ids)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn delete_reactions_by_actor(&self, actor_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM reactions WHERE actor_id = $1")
            .bind(actor_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_subscription_if_absent(
        &self,
        key: &SubscriptionKey,
    ) -> ServiceResult<Option<SubscriptionEdge>> {
        let edge = sqlx::query_as::<_, SubscriptionEdge>(&format!(
            r#"
            INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (subscriber_id, channel_id) DO NOTHING
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(key.subscriber_id)
        .bind(key.channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(edge)
    }

    async fn remove_subscription(
        &self,
        key: &SubscriptionKey,
    ) -> ServiceResult<Option<SubscriptionEdge>> {
        let edge = sqlx::query_as::<_, SubscriptionEdge>(&format!(
            r#"
            DELETE FROM subscriptions
            WHERE subscriber_id = $1 AND channel_id = $2
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(key.subscriber_id)
        .bind(key.channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(edge)
    }

    async fn subscription_exists(&self, key: &SubscriptionKey) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM subscriptions
                WHERE subscriber_id = $1 AND channel_id = $2
            )
            "#,
        )
        .bind(key.subscriber_id)
        .bind(key.channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_subscribers(&self, channel_id: Uuid) -> ServiceResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn count_subscribers_batch(
        &self,
        channel_ids: &[Uuid],
    ) -> ServiceResult<HashMap<Uuid, i64>> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT channel_id, COUNT(*)
            FROM subscriptions
            WHERE channel_id = ANY($1)
            GROUP BY channel_id
            "#,
        )
        .bind(channel_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn count_subscriptions(&self, subscriber_id: Uuid) -> ServiceResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1")
                .bind(subscriber_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn subscribed_channels(
        &self,
        subscriber_id: Uuid,
        channel_ids: &[Uuid],
    ) -> ServiceResult<HashSet<Uuid>> {
        if channel_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT channel_id
            FROM subscriptions
            WHERE subscriber_id = $1 AND channel_id = ANY($2)
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn subscriptions_by_subscriber(
        &self,
        subscriber_id: Uuid,
    ) -> ServiceResult<Vec<SubscriptionEdge>> {
        let edges = sqlx::query_as::<_, SubscriptionEdge>(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE subscriber_id = $1
            ORDER BY created_at DESC, id ASC
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    async fn subscriptions_by_channel(
        &self,
        channel_id: Uuid,
    ) -> ServiceResult<Vec<SubscriptionEdge>> {
        let edges = sqlx::query_as::<_, SubscriptionEdge>(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE channel_id = $1
            ORDER BY created_at DESC, id ASC
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    async fn delete_subscriptions_by_channel(&self, channel_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE channel_id = $1")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_subscriptions_by_subscriber(&self, subscriber_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1")
            .bind(subscriber_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Read/delete access to the content tables
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EntityStore for PgEntityStore {
    async fn ping(&self) -> ServiceResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_users(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    async fn get_video(&self, id: Uuid) -> ServiceResult<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    async fn get_videos(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, Video>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE id = ANY($1)",
            VIDEO_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos.into_iter().map(|v| (v.id, v)).collect())
    }

    async fn owner_of(&self, target: TargetRef) -> ServiceResult<Option<Uuid>> {
        let owner: Option<Uuid> = sqlx::query_scalar(&format!(
            "SELECT owner_id FROM {} WHERE id = $1",
            table_for(target.kind)
        ))
        .bind(target.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn existing_ids(&self, kind: TargetKind, ids: &[Uuid]) -> ServiceResult<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<Uuid> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE id = ANY($1)",
            table_for(kind)
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(found.into_iter().collect())
    }

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: VideoSort,
        window: Window,
    ) -> ServiceResult<PageSlice<Video>> {
        const FILTER: &str = r#"
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2)
              AND (NOT $3 OR is_published)
        "#;
        let pattern = filter.query.as_deref().map(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM videos {}", FILTER))
            .bind(filter.owner_id)
            .bind(pattern.as_deref())
            .bind(filter.published_only)
            .fetch_one(&self.pool)
            .await?;

        // Sort column comes from a closed enum, never from the request
        let items = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos {} ORDER BY {} {}, id ASC LIMIT $4 OFFSET $5",
            VIDEO_COLUMNS,
            FILTER,
            sort.field.column(),
            sort.direction.as_sql()
        ))
        .bind(filter.owner_id)
        .bind(pattern.as_deref())
        .bind(filter.published_only)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PageSlice { items, total })
    }

    async fn list_comments_for_video(
        &self,
        video_id: Uuid,
        window: Window,
    ) -> ServiceResult<PageSlice<Comment>> {
        let total = self.count_comments_for_video(video_id).await?;
        let items = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {}
            FROM comments
            WHERE video_id = $1
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_COLUMNS
        ))
        .bind(video_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PageSlice { items, total })
    }

    async fn list_posts_by_owner(
        &self,
        owner_id: Uuid,
        window: Window,
    ) -> ServiceResult<PageSlice<Post>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        let items = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {}
            FROM posts
            WHERE owner_id = $1
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
            POST_COLUMNS
        ))
        .bind(owner_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(PageSlice { items, total })
    }

    async fn count_comments_for_video(&self, video_id: Uuid) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn video_ids_for_owner(&self, owner_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM videos WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn video_totals_for_owner(&self, owner_id: Uuid) -> ServiceResult<VideoTotals> {
        let (videos, views): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(views), 0)::BIGINT
            FROM videos
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(VideoTotals { videos, views })
    }

    async fn increment_views(&self, video_id: Uuid) -> ServiceResult<()> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_entity(&self, target: TargetRef) -> ServiceResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1",
            table_for(target.kind)
        ))
        .bind(target.id)
        .execute(&self.pool)
        .await?;

        debug!("Deleted {} ({} rows)", target, result.rows_affected());
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comments_for_video(&self, video_id: Uuid) -> ServiceResult<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("DELETE FROM comments WHERE video_id = $1 RETURNING id")
                .bind(video_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    async fn delete_orphaned_comments(&self) -> ServiceResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            DELETE FROM comments c
            WHERE NOT EXISTS (SELECT 1 FROM videos v WHERE v.id = c.video_id)
            RETURNING c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("cats"), "%cats%");
        assert_eq!(like_pattern("100%_real"), "%100\\%\\_real%");
    }

    #[test]
    fn test_reaction_row_rejects_unknown_kind() {
        let row = ReactionRow {
            id: Uuid::new_v4(),
            actor_id: Uuid::new_v4(),
            target_id: Uuid::new_v4(),
            target_kind: "playlist".into(),
            created_at: Utc::now(),
        };

        assert!(matches!(
            ReactionEdge::try_from(row),
            Err(ServiceError::Internal(_))
        ));
    }
}
