//! Read-time views: paginated listings enriched with owner profiles, reaction
//! counts and viewer flags.
//!
//! Counts are never cached; every page is computed from the edge store with
//! batched lookups (one query per concern, not per item). A missing viewer
//! only turns the viewer flags off.

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::models::{SubscriptionKey, TargetKind, TargetRef, User};
use crate::domain::page::{Page, PageRequest, PageSlice, VideoFilter, VideoSort};
use crate::domain::views::{
    AggregatedView, ChannelProfile, ChannelStats, ChannelView, CommentSummary, LikedVideoView,
    OwnerProfile, PostSummary, Reactable, SubscriberView, VideoDetail, VideoSummary,
};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{EdgeStore, EntityStore};

#[derive(Clone)]
pub struct AggregationEngine {
    entities: Arc<dyn EntityStore>,
    edges: Arc<dyn EdgeStore>,
}

impl AggregationEngine {
    pub fn new(entities: Arc<dyn EntityStore>, edges: Arc<dyn EdgeStore>) -> Self {
        Self { entities, edges }
    }

    /// Attach owner, reaction count and viewer flag to each item, keeping order
    async fn enrich<T: Reactable>(
        &self,
        items: Vec<T>,
        viewer: Option<Uuid>,
    ) -> ServiceResult<Vec<AggregatedView<T::Summary>>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = items.iter().map(Reactable::id).collect();
        let owner_ids: Vec<Uuid> = items
            .iter()
            .map(Reactable::owner_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let owners = self.entities.get_users(&owner_ids).await?;
        let counts = self.edges.count_reactions_batch(T::KIND, &ids).await?;
        let reacted = match viewer {
            Some(viewer_id) => self.edges.reacted_targets(viewer_id, T::KIND, &ids).await?,
            None => HashSet::new(),
        };

        Ok(items
            .into_iter()
            .map(|item| {
                let id = item.id();
                let owner = owners.get(&item.owner_id()).map(OwnerProfile::from);
                AggregatedView {
                    entity: item.summarize(),
                    owner,
                    reaction_count: counts.get(&id).copied().unwrap_or(0),
                    viewer_has_reacted: reacted.contains(&id),
                }
            })
            .collect())
    }

    async fn require_user(&self, id: Uuid) -> ServiceResult<User> {
        self.entities
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", id)))
    }

    async fn is_subscribed(&self, viewer: Option<Uuid>, channel_id: Uuid) -> ServiceResult<bool> {
        match viewer {
            Some(viewer_id) => {
                self.edges
                    .subscription_exists(&SubscriptionKey::new(viewer_id, channel_id))
                    .await
            }
            None => Ok(false),
        }
    }

    /// Page of videos. Unpublished videos are only listed when the viewer is
    /// browsing their own channel.
    pub async fn list_videos(
        &self,
        mut filter: VideoFilter,
        sort: VideoSort,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> ServiceResult<Page<AggregatedView<VideoSummary>>> {
        let own_channel = viewer.is_some() && filter.owner_id == viewer;
        filter.published_only = !own_channel;

        let slice = self
            .entities
            .list_videos(&filter, sort, page.window())
            .await?;
        let docs = self.enrich(slice.items, viewer).await?;

        Ok(Page::new(docs, slice.total, page))
    }

    pub async fn list_video_comments(
        &self,
        video_id: Uuid,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> ServiceResult<Page<AggregatedView<CommentSummary>>> {
        if self.entities.get_video(video_id).await?.is_none() {
            return Err(ServiceError::NotFound(TargetRef::video(video_id).to_string()));
        }

        let slice = self
            .entities
            .list_comments_for_video(video_id, page.window())
            .await?;
        let docs = self.enrich(slice.items, viewer).await?;

        Ok(Page::new(docs, slice.total, page))
    }

    pub async fn list_user_posts(
        &self,
        user_id: Uuid,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> ServiceResult<Page<AggregatedView<PostSummary>>> {
        self.require_user(user_id).await?;
        self.posts_page(user_id, viewer, page).await
    }

    /// Same page as [`Self::list_user_posts`], addressed by username
    pub async fn list_posts_by_username(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> ServiceResult<Page<AggregatedView<PostSummary>>> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::InvalidInput("username is required".into()));
        }

        let user = self
            .entities
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", username)))?;

        self.posts_page(user.id, viewer, page).await
    }

    async fn posts_page(
        &self,
        owner_id: Uuid,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> ServiceResult<Page<AggregatedView<PostSummary>>> {
        let slice = self
            .entities
            .list_posts_by_owner(owner_id, page.window())
            .await?;
        let docs = self.enrich(slice.items, viewer).await?;

        Ok(Page::new(docs, slice.total, page))
    }

    /// Videos the viewer liked, most recently liked first
    pub async fn list_liked_videos(
        &self,
        viewer_id: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Page<LikedVideoView>> {
        let edges = self
            .edges
            .reactions_by_actor(viewer_id, TargetKind::Video)
            .await?;
        if edges.is_empty() {
            return Ok(Page::empty(page));
        }

        let ids: Vec<Uuid> = edges.iter().map(|e| e.target_id).collect();
        let mut videos = self.entities.get_videos(&ids).await?;

        // Dangling edges and other people's drafts are skipped
        let visible: Vec<_> = edges
            .into_iter()
            .filter_map(|edge| {
                let video = videos.remove(&edge.target_id)?;
                (video.is_published || video.owner_id == viewer_id)
                    .then_some((edge.created_at, video))
            })
            .collect();

        let PageSlice { items, total } = PageSlice::from_ordered(visible, page.window());
        let (liked_at, videos): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        let views = self.enrich(videos, Some(viewer_id)).await?;

        let docs = liked_at
            .into_iter()
            .zip(views)
            .map(|(liked_at, video)| LikedVideoView { liked_at, video })
            .collect();

        Ok(Page::new(docs, total, page))
    }

    /// Channels a user subscribes to, most recent subscription first
    pub async fn list_subscribed_channels(
        &self,
        subscriber_id: Uuid,
        viewer: Option<Uuid>,
        page: PageRequest,
    ) -> ServiceResult<Page<ChannelView>> {
        self.require_user(subscriber_id).await?;

        let edges = self.edges.subscriptions_by_subscriber(subscriber_id).await?;
        let channel_ids: Vec<Uuid> = edges.iter().map(|e| e.channel_id).collect();
        let channels = self.entities.get_users(&channel_ids).await?;

        let visible: Vec<_> = edges
            .into_iter()
            .filter_map(|edge| {
                channels
                    .get(&edge.channel_id)
                    .map(|user| (edge.created_at, OwnerProfile::from(user)))
            })
            .collect();

        let PageSlice { items, total } = PageSlice::from_ordered(visible, page.window());
        let page_ids: Vec<Uuid> = items.iter().map(|(_, channel)| channel.id).collect();

        let counts = self.edges.count_subscribers_batch(&page_ids).await?;
        let followed = match viewer {
            Some(viewer_id) => self.edges.subscribed_channels(viewer_id, &page_ids).await?,
            None => HashSet::new(),
        };

        let docs = items
            .into_iter()
            .map(|(subscribed_at, channel)| ChannelView {
                subscriber_count: counts.get(&channel.id).copied().unwrap_or(0),
                viewer_is_subscribed: followed.contains(&channel.id),
                subscribed_at,
                channel,
            })
            .collect();

        Ok(Page::new(docs, total, page))
    }

    /// Subscribers of a channel, most recent first
    pub async fn list_channel_subscribers(
        &self,
        channel_id: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Page<SubscriberView>> {
        self.require_user(channel_id).await?;

        let edges = self.edges.subscriptions_by_channel(channel_id).await?;
        let subscriber_ids: Vec<Uuid> = edges.iter().map(|e| e.subscriber_id).collect();
        let subscribers = self.entities.get_users(&subscriber_ids).await?;

        let visible: Vec<_> = edges
            .into_iter()
            .filter_map(|edge| {
                subscribers.get(&edge.subscriber_id).map(|user| SubscriberView {
                    subscriber: OwnerProfile::from(user),
                    subscribed_at: edge.created_at,
                })
            })
            .collect();

        let PageSlice { items, total } = PageSlice::from_ordered(visible, page.window());
        Ok(Page::new(items, total, page))
    }

    /// Single video for its watch page. Records one view.
    pub async fn get_video(
        &self,
        video_id: Uuid,
        viewer: Option<Uuid>,
    ) -> ServiceResult<VideoDetail> {
        let not_found = || ServiceError::NotFound(TargetRef::video(video_id).to_string());

        let video = self.entities.get_video(video_id).await?.ok_or_else(not_found)?;
        if !video.is_published && viewer != Some(video.owner_id) {
            return Err(ServiceError::Forbidden(format!(
                "video {} is not published",
                video_id
            )));
        }

        self.entities.increment_views(video_id).await?;
        let video = self.entities.get_video(video_id).await?.ok_or_else(not_found)?;
        let owner_id = video.owner_id;

        let mut enriched = self.enrich(vec![video], viewer).await?;
        let video = enriched.pop().ok_or_else(not_found)?;

        Ok(VideoDetail {
            video,
            comment_count: self.entities.count_comments_for_video(video_id).await?,
            owner_subscriber_count: self.edges.count_subscribers(owner_id).await?,
            viewer_is_subscribed: self.is_subscribed(viewer, owner_id).await?,
        })
    }

    pub async fn channel_profile(
        &self,
        channel_id: Uuid,
        viewer: Option<Uuid>,
    ) -> ServiceResult<ChannelProfile> {
        let user = self.require_user(channel_id).await?;

        Ok(ChannelProfile {
            channel: OwnerProfile::from(&user),
            cover_image: user.cover_image,
            subscriber_count: self.edges.count_subscribers(channel_id).await?,
            subscribed_to_count: self.edges.count_subscriptions(channel_id).await?,
            viewer_is_subscribed: self.is_subscribed(viewer, channel_id).await?,
        })
    }

    /// Creator dashboard totals. Likes are summed over the channel's videos
    /// at read time.
    pub async fn channel_stats(&self, channel_id: Uuid) -> ServiceResult<ChannelStats> {
        self.require_user(channel_id).await?;

        let totals = self.entities.video_totals_for_owner(channel_id).await?;
        let video_ids = self.entities.video_ids_for_owner(channel_id).await?;
        let total_likes = self
            .edges
            .count_reactions_batch(TargetKind::Video, &video_ids)
            .await?
            .values()
            .sum();

        Ok(ChannelStats {
            total_subscribers: self.edges.count_subscribers(channel_id).await?,
            total_videos: totals.videos,
            total_views: totals.views,
            total_likes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ReactionKey;
    use crate::domain::page::{SortDirection, VideoSortField};
    use crate::repository::{InMemoryEdgeStore, InMemoryEntityStore};
    use crate::services::fixtures;

    fn engine(entities: &Arc<InMemoryEntityStore>, edges: &Arc<InMemoryEdgeStore>) -> AggregationEngine {
        AggregationEngine::new(entities.clone(), edges.clone())
    }

    async fn react(edges: &InMemoryEdgeStore, actor: Uuid, target: TargetRef) {
        edges
            .insert_reaction_if_absent(&ReactionKey::new(actor, target))
            .await
            .unwrap();
    }

    async fn subscribe(edges: &InMemoryEdgeStore, subscriber: Uuid, channel: Uuid) {
        edges
            .insert_subscription_if_absent(&SubscriptionKey::new(subscriber, channel))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_counts_and_viewer_flag() {
        let (entities, edges) = fixtures::stores();
        let (a, b, c) = (fixtures::user("a"), fixtures::user("b"), fixtures::user("c"));
        let video = fixtures::video(a.id, "v", 0);
        let (a_id, b_id, c_id, video_id) = (a.id, b.id, c.id, video.id);
        [a, b, c].into_iter().for_each(|u| entities.insert_user(u));
        entities.insert_video(video);
        react(&edges, a_id, TargetRef::video(video_id)).await;
        react(&edges, b_id, TargetRef::video(video_id)).await;
        let engine = engine(&entities, &edges);

        let seen_by_a = engine
            .list_videos(VideoFilter::default(), VideoSort::default(), Some(a_id), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(seen_by_a.docs[0].reaction_count, 2);
        assert!(seen_by_a.docs[0].viewer_has_reacted);
        assert_eq!(seen_by_a.docs[0].owner.as_ref().map(|o| o.id), Some(a_id));

        let seen_by_c = engine
            .list_videos(VideoFilter::default(), VideoSort::default(), Some(c_id), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(seen_by_c.docs[0].reaction_count, 2);
        assert!(!seen_by_c.docs[0].viewer_has_reacted);

        let anonymous = engine
            .list_videos(VideoFilter::default(), VideoSort::default(), None, PageRequest::default())
            .await
            .unwrap();
        assert!(!anonymous.docs[0].viewer_has_reacted);
    }

    #[tokio::test]
    async fn test_pagination_is_stable() {
        let (entities, edges) = fixtures::stores();
        let owner = fixtures::user("owner");
        let owner_id = owner.id;
        entities.insert_user(owner);
        // rank 1 is the newest
        let titles: Vec<String> = (1..=25).map(|rank| format!("rank{rank:02}")).collect();
        for (i, title) in titles.iter().enumerate() {
            entities.insert_video(fixtures::video(owner_id, title, 100 - i as i64));
        }
        let engine = engine(&entities, &edges);

        let second = engine
            .list_videos(VideoFilter::default(), VideoSort::default(), None, PageRequest::new(Some(2), Some(10)))
            .await
            .unwrap();
        let got: Vec<_> = second.docs.iter().map(|d| d.entity.title.clone()).collect();
        assert_eq!(got, titles[10..20].to_vec());
        assert_eq!(second.total_docs, 25);
        assert_eq!(second.total_pages, 3);
        assert!(second.has_prev_page && second.has_next_page);

        let third = engine
            .list_videos(VideoFilter::default(), VideoSort::default(), None, PageRequest::new(Some(3), Some(10)))
            .await
            .unwrap();
        let got: Vec<_> = third.docs.iter().map(|d| d.entity.title.clone()).collect();
        assert_eq!(got, titles[20..25].to_vec());
        assert!(!third.has_next_page);
    }

    #[tokio::test]
    async fn test_list_videos_sorts_by_views_ascending() {
        let (entities, edges) = fixtures::stores();
        let owner = fixtures::user("owner");
        for (views, title) in [(30, "c"), (10, "a"), (20, "b")] {
            let mut video = fixtures::video(owner.id, title, views);
            video.views = views;
            entities.insert_video(video);
        }
        entities.insert_user(owner);
        let sort = VideoSort {
            field: VideoSortField::Views,
            direction: SortDirection::Asc,
        };

        let page = engine(&entities, &edges)
            .list_videos(VideoFilter::default(), sort, None, PageRequest::default())
            .await
            .unwrap();

        let titles: Vec<_> = page.docs.iter().map(|d| d.entity.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_drafts_only_listed_for_their_owner() {
        let (entities, edges) = fixtures::stores();
        let owner = fixtures::user("owner");
        let owner_id = owner.id;
        let mut draft = fixtures::video(owner_id, "draft", 1);
        draft.is_published = false;
        entities.insert_video(draft);
        entities.insert_video(fixtures::video(owner_id, "live", 0));
        entities.insert_user(owner);
        let engine = engine(&entities, &edges);
        let filter = VideoFilter {
            owner_id: Some(owner_id),
            ..Default::default()
        };

        let public = engine
            .list_videos(filter.clone(), VideoSort::default(), Some(Uuid::new_v4()), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(public.total_docs, 1);

        let own = engine
            .list_videos(filter, VideoSort::default(), Some(owner_id), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(own.total_docs, 2);
    }

    #[tokio::test]
    async fn test_comments_of_silent_video_is_empty_page() {
        let (entities, edges) = fixtures::stores();
        let owner = fixtures::user("owner");
        let video = fixtures::video(owner.id, "quiet", 0);
        let video_id = video.id;
        entities.insert_user(owner);
        entities.insert_video(video);

        let page = engine(&entities, &edges)
            .list_video_comments(video_id, None, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_docs, 0);
        assert!(page.docs.is_empty());
    }

    #[tokio::test]
    async fn test_comments_of_missing_video_is_not_found() {
        let (entities, edges) = fixtures::stores();

        let err = engine(&entities, &edges)
            .list_video_comments(Uuid::new_v4(), None, PageRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comment_reactions_do_not_leak_across_kinds() {
        let (entities, edges) = fixtures::stores();
        let owner = fixtures::user("owner");
        let video = fixtures::video(owner.id, "v", 0);
        let comment = fixtures::comment(video.id, owner.id, 1);
        // Same id reacted to as a post must not count for the comment
        react(&edges, owner.id, TargetRef::post(comment.id)).await;
        react(&edges, owner.id, TargetRef::comment(comment.id)).await;
        let (video_id, owner_id) = (video.id, owner.id);
        entities.insert_user(owner);
        entities.insert_video(video);
        entities.insert_comment(comment);

        let page = engine(&entities, &edges)
            .list_video_comments(video_id, Some(owner_id), PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.docs[0].reaction_count, 1);
        assert!(page.docs[0].viewer_has_reacted);
    }

    #[tokio::test]
    async fn test_user_posts_newest_first() {
        let (entities, edges) = fixtures::stores();
        let author = fixtures::user("author");
        let author_id = author.id;
        entities.insert_user(author);
        entities.insert_post(fixtures::post(author_id, 1));
        entities.insert_post(fixtures::post(author_id, 5));

        let page = engine(&entities, &edges)
            .list_user_posts(author_id, None, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_docs, 2);
        assert_eq!(page.docs[0].entity.content, "post at 5");
        assert_eq!(page.docs[0].owner.as_ref().map(|o| o.username.as_str()), Some("author"));
    }

    #[tokio::test]
    async fn test_posts_by_username() {
        let (entities, edges) = fixtures::stores();
        let author = fixtures::user("author");
        let author_id = author.id;
        entities.insert_user(author);
        entities.insert_user(fixtures::user("quiet"));
        entities.insert_post(fixtures::post(author_id, 2));
        let engine = engine(&entities, &edges);

        let page = engine
            .list_posts_by_username(" author ", None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_docs, 1);

        let quiet = engine
            .list_posts_by_username("quiet", None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(quiet.total_docs, 0);

        let err = engine
            .list_posts_by_username("nobody", None, PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = engine
            .list_posts_by_username("  ", None, PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_liked_videos_skip_dangling_and_foreign_drafts() {
        let (entities, edges) = fixtures::stores();
        let viewer = fixtures::user("viewer");
        let other = fixtures::user("other");
        let viewer_id = viewer.id;
        let liked = fixtures::video(other.id, "liked", 0);
        let mut foreign_draft = fixtures::video(other.id, "draft", 1);
        foreign_draft.is_published = false;
        let mut own_draft = fixtures::video(viewer_id, "mine", 2);
        own_draft.is_published = false;

        for target in [liked.id, foreign_draft.id, own_draft.id, Uuid::new_v4()] {
            react(&edges, viewer_id, TargetRef::video(target)).await;
        }
        entities.insert_user(viewer);
        entities.insert_user(other);
        entities.insert_video(liked);
        entities.insert_video(foreign_draft);
        entities.insert_video(own_draft);

        let page = engine(&entities, &edges)
            .list_liked_videos(viewer_id, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_docs, 2);
        let titles: Vec<_> = page.docs.iter().map(|d| d.video.entity.title.as_str()).collect();
        assert!(titles.contains(&"liked"));
        assert!(titles.contains(&"mine"));
        assert!(page.docs.iter().all(|d| d.video.viewer_has_reacted));
    }

    #[tokio::test]
    async fn test_inverted_joins_slice_second_page() {
        let (entities, edges) = fixtures::stores();
        let viewer = fixtures::user("viewer");
        let viewer_id = viewer.id;
        entities.insert_user(viewer);

        for i in 0..5 {
            let channel = fixtures::user(&format!("channel{i}"));
            let video = fixtures::video(channel.id, &format!("video{i}"), i);
            react(&edges, viewer_id, TargetRef::video(video.id)).await;
            subscribe(&edges, viewer_id, channel.id).await;
            entities.insert_user(channel);
            entities.insert_video(video);
        }
        // Dangling like is not counted
        react(&edges, viewer_id, TargetRef::video(Uuid::new_v4())).await;
        let engine = engine(&entities, &edges);

        let first = engine
            .list_liked_videos(viewer_id, PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        let second = engine
            .list_liked_videos(viewer_id, PageRequest::new(Some(2), Some(2)))
            .await
            .unwrap();
        let third = engine
            .list_liked_videos(viewer_id, PageRequest::new(Some(3), Some(2)))
            .await
            .unwrap();

        assert_eq!(second.total_docs, 5);
        assert_eq!(second.total_pages, 3);
        assert_eq!(second.docs.len(), 2);
        assert_eq!(second.paging_counter, 3);
        assert_eq!(third.docs.len(), 1);
        let mut titles: Vec<_> = [&first, &second, &third]
            .iter()
            .flat_map(|p| p.docs.iter().map(|d| d.video.entity.title.clone()))
            .collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), 5);

        let first = engine
            .list_subscribed_channels(viewer_id, None, PageRequest::new(Some(1), Some(3)))
            .await
            .unwrap();
        let second = engine
            .list_subscribed_channels(viewer_id, None, PageRequest::new(Some(2), Some(3)))
            .await
            .unwrap();

        assert_eq!(second.total_docs, 5);
        assert_eq!(second.docs.len(), 2);
        assert!(!second.has_next_page);
        assert!(second
            .docs
            .iter()
            .all(|d| first.docs.iter().all(|f| f.channel.id != d.channel.id)));
        assert!(second.docs.iter().all(|d| d.subscriber_count == 1));
    }

    #[tokio::test]
    async fn test_subscriptions_and_subscribers() {
        let (entities, edges) = fixtures::stores();
        let (alice, bob, carol) = (fixtures::user("alice"), fixtures::user("bob"), fixtures::user("carol"));
        let (a, b, c) = (alice.id, bob.id, carol.id);
        [alice, bob, carol].into_iter().for_each(|u| entities.insert_user(u));
        subscribe(&edges, a, c).await;
        subscribe(&edges, b, c).await;
        subscribe(&edges, b, a).await;
        // Dangling channel is skipped
        subscribe(&edges, a, Uuid::new_v4()).await;
        let engine = engine(&entities, &edges);

        let channels = engine
            .list_subscribed_channels(a, Some(b), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(channels.total_docs, 1);
        assert_eq!(channels.docs[0].channel.id, c);
        assert_eq!(channels.docs[0].subscriber_count, 2);
        assert!(channels.docs[0].viewer_is_subscribed);

        let subscribers = engine
            .list_channel_subscribers(c, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(subscribers.total_docs, 2);

        let profile = engine.channel_profile(a, Some(b)).await.unwrap();
        assert_eq!(profile.subscriber_count, 1);
        assert_eq!(profile.subscribed_to_count, 2);
        assert!(profile.viewer_is_subscribed);
    }

    #[tokio::test]
    async fn test_get_video_records_view_and_guards_drafts() {
        let (entities, edges) = fixtures::stores();
        let owner = fixtures::user("owner");
        let fan = fixtures::user("fan");
        let (owner_id, fan_id) = (owner.id, fan.id);
        let video = fixtures::video(owner_id, "v", 0);
        let mut draft = fixtures::video(owner_id, "draft", 1);
        draft.is_published = false;
        let (video_id, draft_id) = (video.id, draft.id);
        entities.insert_user(owner);
        entities.insert_user(fan);
        entities.insert_video(video);
        entities.insert_video(draft);
        entities.insert_comment(fixtures::comment(video_id, fan_id, 2));
        subscribe(&edges, fan_id, owner_id).await;
        let engine = engine(&entities, &edges);

        let detail = engine.get_video(video_id, Some(fan_id)).await.unwrap();
        assert_eq!(detail.video.entity.views, 1);
        assert_eq!(detail.comment_count, 1);
        assert_eq!(detail.owner_subscriber_count, 1);
        assert!(detail.viewer_is_subscribed);

        let err = engine.get_video(draft_id, Some(fan_id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(engine.get_video(draft_id, Some(owner_id)).await.is_ok());

        let err = engine.get_video(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_channel_stats_sum_likes_over_videos() {
        let (entities, edges) = fixtures::stores();
        let owner = fixtures::user("owner");
        let owner_id = owner.id;
        entities.insert_user(owner);
        let mut first = fixtures::video(owner_id, "first", 0);
        first.views = 7;
        let mut second = fixtures::video(owner_id, "second", 1);
        second.views = 3;
        let (v1, v2) = (first.id, second.id);
        entities.insert_video(first);
        entities.insert_video(second);
        let (fan1, fan2) = (Uuid::new_v4(), Uuid::new_v4());
        react(&edges, fan1, TargetRef::video(v1)).await;
        react(&edges, fan2, TargetRef::video(v1)).await;
        react(&edges, fan1, TargetRef::video(v2)).await;
        // Post reactions are not video likes
        react(&edges, fan1, TargetRef::post(Uuid::new_v4())).await;
        subscribe(&edges, fan1, owner_id).await;

        let stats = engine(&entities, &edges).channel_stats(owner_id).await.unwrap();

        assert_eq!(
            stats,
            ChannelStats {
                total_subscribers: 1,
                total_videos: 2,
                total_views: 10,
                total_likes: 3,
            }
        );
    }
}
