//! Like/unlike and subscribe/unsubscribe.
//!
//! A toggle never reads-then-writes. It tries to remove the edge, then tries to
//! insert it, and if a concurrent request inserted it in between, tries the
//! remove once more. Each successful outcome is backed by exactly one store
//! mutation; the store's uniqueness constraint is the only lock.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{
    ReactionEdge, ReactionKey, SubscriptionEdge, SubscriptionKey, TargetRef, ToggleOutcome,
    ToggleState,
};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics;
use crate::repository::{EdgeStore, EntityStore};

/// An edge key the engine knows how to remove and insert
#[async_trait::async_trait]
trait Toggleable: Send + Sync {
    type Edge: Send;

    const LABEL: &'static str;

    async fn remove(&self, edges: &dyn EdgeStore) -> ServiceResult<Option<Self::Edge>>;

    async fn insert(&self, edges: &dyn EdgeStore) -> ServiceResult<Option<Self::Edge>>;
}

#[async_trait::async_trait]
impl Toggleable for ReactionKey {
    type Edge = ReactionEdge;

    const LABEL: &'static str = "reaction";

    async fn remove(&self, edges: &dyn EdgeStore) -> ServiceResult<Option<ReactionEdge>> {
        edges.remove_reaction(self).await
    }

    async fn insert(&self, edges: &dyn EdgeStore) -> ServiceResult<Option<ReactionEdge>> {
        edges.insert_reaction_if_absent(self).await
    }
}

#[async_trait::async_trait]
impl Toggleable for SubscriptionKey {
    type Edge = SubscriptionEdge;

    const LABEL: &'static str = "subscription";

    async fn remove(&self, edges: &dyn EdgeStore) -> ServiceResult<Option<SubscriptionEdge>> {
        edges.remove_subscription(self).await
    }

    async fn insert(&self, edges: &dyn EdgeStore) -> ServiceResult<Option<SubscriptionEdge>> {
        edges.insert_subscription_if_absent(self).await
    }
}

#[derive(Clone)]
pub struct ToggleEngine {
    entities: Arc<dyn EntityStore>,
    edges: Arc<dyn EdgeStore>,
}

impl ToggleEngine {
    pub fn new(entities: Arc<dyn EntityStore>, edges: Arc<dyn EdgeStore>) -> Self {
        Self { entities, edges }
    }

    /// Like the target if the actor has not, unlike it otherwise
    pub async fn toggle_reaction(
        &self,
        actor_id: Uuid,
        target: TargetRef,
    ) -> ServiceResult<ToggleOutcome<ReactionEdge>> {
        self.require_user(actor_id).await?;
        if self.entities.owner_of(target).await?.is_none() {
            return Err(ServiceError::NotFound(target.to_string()));
        }

        self.toggle(ReactionKey::new(actor_id, target)).await
    }

    /// Subscribe to the channel if not subscribed, unsubscribe otherwise
    pub async fn toggle_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> ServiceResult<ToggleOutcome<SubscriptionEdge>> {
        self.require_user(subscriber_id).await?;
        self.require_user(channel_id).await?;

        self.toggle(SubscriptionKey::new(subscriber_id, channel_id))
            .await
    }

    async fn require_user(&self, id: Uuid) -> ServiceResult<()> {
        match self.entities.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!("user {}", id))),
        }
    }

    async fn toggle<K: Toggleable>(&self, key: K) -> ServiceResult<ToggleOutcome<K::Edge>> {
        let edges = self.edges.as_ref();

        if let Some(edge) = key.remove(edges).await? {
            return Ok(Self::settled(K::LABEL, ToggleState::Removed, edge));
        }

        if let Some(edge) = key.insert(edges).await? {
            return Ok(Self::settled(K::LABEL, ToggleState::Added, edge));
        }

        // Lost a race: another request created the edge after our remove.
        debug!(edge = K::LABEL, "toggle insert found existing edge, retrying remove");
        if let Some(edge) = key.remove(edges).await? {
            metrics::record_toggle_retry(K::LABEL, "resolved");
            return Ok(Self::settled(K::LABEL, ToggleState::Removed, edge));
        }

        metrics::record_toggle_retry(K::LABEL, "conflict");
        warn!(edge = K::LABEL, "toggle did not settle after one retry");
        Err(ServiceError::Conflict(format!(
            "{} changed concurrently; retry the request",
            K::LABEL
        )))
    }

    fn settled<E>(label: &str, state: ToggleState, edge: E) -> ToggleOutcome<E> {
        metrics::record_toggle(label, state.as_str());
        ToggleOutcome { state, edge }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockEdgeStore, MockEntityStore};
    use crate::services::fixtures;
    use mockall::Sequence;

    fn engine_with_user_and_video() -> (ToggleEngine, Arc<crate::repository::InMemoryEdgeStore>, Uuid, TargetRef)
    {
        let (entities, edges) = fixtures::stores();
        let alice = fixtures::user("alice");
        let video = fixtures::video(alice.id, "intro", 0);
        let target = TargetRef::video(video.id);
        let actor = alice.id;
        entities.insert_user(alice);
        entities.insert_video(video);

        (ToggleEngine::new(entities, edges.clone()), edges, actor, target)
    }

    #[tokio::test]
    async fn test_toggle_sequence_alternates() {
        let (engine, edges, actor, target) = engine_with_user_and_video();

        for round in 1..=5 {
            let outcome = engine.toggle_reaction(actor, target).await.unwrap();
            let expected = if round % 2 == 1 {
                ToggleState::Added
            } else {
                ToggleState::Removed
            };
            assert_eq!(outcome.state, expected);
            assert_eq!(edges.reaction_len(), if round % 2 == 1 { 1 } else { 0 });
        }
    }

    #[tokio::test]
    async fn test_self_reaction_allowed() {
        let (engine, _, actor, target) = engine_with_user_and_video();

        let outcome = engine.toggle_reaction(actor, target).await.unwrap();

        assert_eq!(outcome.state, ToggleState::Added);
        assert_eq!(outcome.edge.actor_id, actor);
        assert_eq!(outcome.edge.target(), target);
    }

    #[tokio::test]
    async fn test_toggle_missing_target_is_not_found() {
        let (engine, edges, actor, _) = engine_with_user_and_video();

        let err = engine
            .toggle_reaction(actor, TargetRef::comment(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(edges.reaction_len(), 0);
    }

    #[tokio::test]
    async fn test_toggle_unknown_actor_is_not_found() {
        let (engine, _, _, target) = engine_with_user_and_video();

        let err = engine
            .toggle_reaction(Uuid::new_v4(), target)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subscription_toggle_and_self_subscribe() {
        let (entities, edges) = fixtures::stores();
        let alice = fixtures::user("alice");
        let bob = fixtures::user("bob");
        let (a, b) = (alice.id, bob.id);
        entities.insert_user(alice);
        entities.insert_user(bob);
        let engine = ToggleEngine::new(entities, edges.clone());

        assert_eq!(
            engine.toggle_subscription(a, b).await.unwrap().state,
            ToggleState::Added
        );
        assert_eq!(
            engine.toggle_subscription(a, a).await.unwrap().state,
            ToggleState::Added
        );
        assert_eq!(edges.subscription_len(), 2);
        assert_eq!(
            engine.toggle_subscription(a, b).await.unwrap().state,
            ToggleState::Removed
        );
        assert_eq!(edges.subscription_len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_leave_consistent_state() {
        let (engine, edges, actor, target) = engine_with_user_and_video();
        let engine = Arc::new(engine);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.toggle_reaction(actor, target).await })
            })
            .collect();

        let mut added = 0i64;
        let mut removed = 0i64;
        for result in futures::future::join_all(handles).await {
            match result.unwrap() {
                Ok(outcome) if outcome.state == ToggleState::Added => added += 1,
                Ok(_) => removed += 1,
                Err(ServiceError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let final_count = edges.reaction_len() as i64;
        assert!(final_count == 0 || final_count == 1);
        assert_eq!(added - removed, final_count);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscription_toggles_leave_consistent_state() {
        let (entities, edges) = fixtures::stores();
        let fan = fixtures::user("fan");
        let channel = fixtures::user("channel");
        let (fan_id, channel_id) = (fan.id, channel.id);
        entities.insert_user(fan);
        entities.insert_user(channel);
        let engine = Arc::new(ToggleEngine::new(entities, edges.clone()));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.toggle_subscription(fan_id, channel_id).await })
            })
            .collect();

        let mut added = 0i64;
        let mut removed = 0i64;
        for result in futures::future::join_all(handles).await {
            match result.unwrap() {
                Ok(outcome) if outcome.state == ToggleState::Added => added += 1,
                Ok(_) => removed += 1,
                Err(ServiceError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let final_count = edges.subscription_len() as i64;
        assert!(final_count == 0 || final_count == 1);
        assert_eq!(added - removed, final_count);
        assert_eq!(
            edges.count_subscribers(channel_id).await.unwrap(),
            final_count
        );
    }

    fn mock_entities() -> MockEntityStore {
        let mut entities = MockEntityStore::new();
        entities
            .expect_get_user()
            .returning(|_| Ok(Some(fixtures::user("racer"))));
        entities
            .expect_owner_of()
            .returning(|_| Ok(Some(Uuid::new_v4())));
        entities
    }

    #[tokio::test]
    async fn test_lost_insert_race_retries_remove_once() {
        let target = TargetRef::post(Uuid::new_v4());
        let actor = Uuid::new_v4();
        let mut edges = MockEdgeStore::new();
        let mut seq = Sequence::new();
        edges
            .expect_remove_reaction()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        edges
            .expect_insert_reaction_if_absent()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        edges
            .expect_remove_reaction()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|key| Ok(Some(ReactionEdge::new(key))));

        let engine = ToggleEngine::new(Arc::new(mock_entities()), Arc::new(edges));
        let outcome = engine.toggle_reaction(actor, target).await.unwrap();

        assert_eq!(outcome.state, ToggleState::Removed);
    }

    #[tokio::test]
    async fn test_unsettled_race_surfaces_conflict() {
        let mut edges = MockEdgeStore::new();
        edges
            .expect_remove_reaction()
            .times(2)
            .returning(|_| Ok(None));
        edges
            .expect_insert_reaction_if_absent()
            .times(1)
            .returning(|_| Ok(None));

        let engine = ToggleEngine::new(Arc::new(mock_entities()), Arc::new(edges));
        let err = engine
            .toggle_reaction(Uuid::new_v4(), TargetRef::video(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
