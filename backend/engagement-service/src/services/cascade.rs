//! Cleanup of dependent edges and comments when entities disappear.
//!
//! Every cascade in the service goes through [`CascadeCoordinator`]. Once the
//! primary record is deleted, any failure in the cascade is reported as
//! [`ServiceError::CascadeIncomplete`]; the orphan sweep repairs what such a
//! failure leaves behind.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::models::{TargetKind, TargetRef};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics;
use crate::repository::{EdgeStore, EntityStore};

/// What an owner-checked delete removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub entity_id: Uuid,
    pub kind: TargetKind,
    pub reactions_removed: u64,
    pub comments_removed: u64,
}

/// What the repair sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub orphaned_comments: u64,
    pub orphaned_reactions: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCleanupReport {
    pub subscriptions_removed: u64,
    pub reactions_removed: u64,
}

#[derive(Clone)]
pub struct CascadeCoordinator {
    entities: Arc<dyn EntityStore>,
    edges: Arc<dyn EdgeStore>,
}

impl CascadeCoordinator {
    pub fn new(entities: Arc<dyn EntityStore>, edges: Arc<dyn EdgeStore>) -> Self {
        Self { entities, edges }
    }

    /// Delete an entity on behalf of its owner, then cascade.
    ///
    /// Returns `NotFound` when the entity is missing (including when a
    /// concurrent delete won), `Forbidden` when `actor_id` is not the owner.
    pub async fn delete_entity(
        &self,
        actor_id: Uuid,
        target: TargetRef,
    ) -> ServiceResult<DeletionReport> {
        let owner_id = self
            .entities
            .owner_of(target)
            .await?
            .ok_or_else(|| ServiceError::NotFound(target.to_string()))?;

        if owner_id != actor_id {
            return Err(ServiceError::Forbidden(format!(
                "only the owner can delete {}",
                target
            )));
        }

        if !self.entities.delete_entity(target).await? {
            return Err(ServiceError::NotFound(target.to_string()));
        }

        let started = Instant::now();
        match self.on_entity_deleted(target).await {
            Ok(report) => {
                metrics::record_cascade_run(target.kind.as_str(), "success", started.elapsed());
                info!(
                    entity = %target,
                    reactions_removed = report.reactions_removed,
                    comments_removed = report.comments_removed,
                    "entity deleted"
                );
                Ok(report)
            }
            Err(err) => {
                metrics::record_cascade_run(target.kind.as_str(), "incomplete", started.elapsed());
                error!(entity = %target, error = %err, "cascade incomplete after delete");
                Err(ServiceError::cascade_incomplete(target.kind, target.id, err))
            }
        }
    }

    /// Remove everything that depends on an already-deleted entity
    pub async fn on_entity_deleted(&self, target: TargetRef) -> ServiceResult<DeletionReport> {
        let mut reactions_removed = self.edges.delete_reactions_by_target(target).await?;
        let mut comments_removed = 0;

        // Reactions are keyed on what the delete actually removed, so a
        // comment added after the video went away cannot keep its likes.
        if target.kind == TargetKind::Video {
            let comment_ids = self.entities.delete_comments_for_video(target.id).await?;
            reactions_removed += self
                .edges
                .delete_reactions_by_targets(TargetKind::Comment, &comment_ids)
                .await?;
            comments_removed = comment_ids.len() as u64;
        }

        metrics::record_cascade_removed("reaction", reactions_removed);
        metrics::record_cascade_removed("comment", comments_removed);

        Ok(DeletionReport {
            entity_id: target.id,
            kind: target.kind,
            reactions_removed,
            comments_removed,
        })
    }

    /// Hook for the user collaborator: drop the user's subscriptions in both
    /// directions and every reaction they authored
    pub async fn on_channel_deleted(&self, channel_id: Uuid) -> ServiceResult<ChannelCleanupReport> {
        let started = Instant::now();
        let result = async {
            let subscribers = self.edges.delete_subscriptions_by_channel(channel_id).await?;
            let subscriptions = self
                .edges
                .delete_subscriptions_by_subscriber(channel_id)
                .await?;
            let reactions = self.edges.delete_reactions_by_actor(channel_id).await?;
            Ok::<_, ServiceError>(ChannelCleanupReport {
                subscriptions_removed: subscribers + subscriptions,
                reactions_removed: reactions,
            })
        }
        .await;

        let status = if result.is_ok() { "success" } else { "incomplete" };
        metrics::record_cascade_run("channel", status, started.elapsed());

        let report = result?;
        metrics::record_cascade_removed("subscription", report.subscriptions_removed);
        metrics::record_cascade_removed("reaction", report.reactions_removed);
        info!(
            channel_id = %channel_id,
            subscriptions_removed = report.subscriptions_removed,
            reactions_removed = report.reactions_removed,
            "channel edges removed"
        );
        Ok(report)
    }

    /// Delete comments of missing videos, then reactions whose target is gone
    pub async fn sweep_orphans(&self) -> ServiceResult<SweepReport> {
        let started = Instant::now();

        let orphaned_comment_ids = self.entities.delete_orphaned_comments().await?;
        let mut orphaned_reactions = self
            .edges
            .delete_reactions_by_targets(TargetKind::Comment, &orphaned_comment_ids)
            .await?;

        let mut by_kind: HashMap<TargetKind, Vec<Uuid>> = HashMap::new();
        for target in self.edges.reaction_targets().await? {
            by_kind.entry(target.kind).or_default().push(target.id);
        }

        for (kind, ids) in by_kind {
            let existing = self.entities.existing_ids(kind, &ids).await?;
            let missing: Vec<Uuid> = ids
                .into_iter()
                .filter(|id| !existing.contains(id))
                .collect();
            orphaned_reactions += self.edges.delete_reactions_by_targets(kind, &missing).await?;
        }

        let report = SweepReport {
            orphaned_comments: orphaned_comment_ids.len() as u64,
            orphaned_reactions,
        };

        metrics::record_cascade_run("sweep", "success", started.elapsed());
        metrics::record_cascade_removed("comment", report.orphaned_comments);
        metrics::record_cascade_removed("reaction", report.orphaned_reactions);
        info!(
            orphaned_comments = report.orphaned_comments,
            orphaned_reactions = report.orphaned_reactions,
            "orphan sweep finished"
        );
        Ok(report)
    }
}
