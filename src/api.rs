use chrono::Utc;
use log::*;

use crate::{
	activity,
	config::Config,
	db::{self, Database, EdgeDetails, PersistenceHandle},
	entity::friendship,
	resolver::FriendResolver,
	trace,
};


/// The public face of the relationship engine. All operations take the id of
/// the acting user first and the counterpart second.
#[derive(Clone)]
pub struct Api {
	pub db: Database,
	pub resolver: FriendResolver,
	reject_duplicate_requests: bool,
}

impl Api {
	pub fn new(db: Database, config: &Config) -> Self {
		Self {
			resolver: FriendResolver::new(db.clone()),
			db,
			reject_duplicate_requests: config.reject_duplicate_requests.unwrap_or(false),
		}
	}

	/// Sends a friendship request from `actor_id` to `target_id`, carrying
	/// the given pivot fields. The new edge stays pending until the target
	/// approves it. Self-requests are rejected before anything is stored.
	pub async fn request(
		&self, actor_id: i64, target_id: i64, details: &EdgeDetails,
	) -> db::Result<friendship::Model> {
		if actor_id == target_id {
			return trace::err(db::Error::SelfFriendship(actor_id));
		}

		let now = Utc::now().timestamp_millis();
		let tx = self.db.transaction().await?;
		if self.reject_duplicate_requests {
			let outgoing = tx.query_outgoing(actor_id).await?;
			if outgoing.iter().any(|edge| edge.target_id == target_id) {
				return trace::err(db::Error::DuplicateFriendship(actor_id, target_id));
			}
		}
		let edge = tx
			.insert_friendship(actor_id, target_id, details, now)
			.await?;
		tx.commit().await?;

		// The new edge shows up in the actor's outgoing view and in the
		// target's pending-request list.
		self.resolver.invalidate(actor_id).await;
		self.resolver.invalidate(target_id).await;
		debug!(
			"User {} requested a friendship with user {}.",
			actor_id, target_id
		);
		Ok(edge)
	}

	/// Approves the pending request that `requester_id` sent to `actor_id`.
	/// Returns whether at least one edge was approved; finding none is not
	/// an error.
	pub async fn approve(&self, actor_id: i64, requester_id: i64) -> db::Result<bool> {
		let candidates = self.edges_between(requester_id, actor_id, true).await?;
		let now = Utc::now().timestamp_millis();

		let mut approved = false;
		for edge in &candidates {
			approved |= self.db.approve_friendship(edge.id, now).await?;
		}
		if approved {
			self.resolver.invalidate(actor_id).await;
			self.resolver.invalidate(requester_id).await;
			debug!(
				"User {} approved the friendship request of user {}.",
				actor_id, requester_id
			);
		}
		Ok(approved)
	}

	/// Turns down the pending request that `requester_id` sent to
	/// `actor_id`. The edge is soft-deleted and stays terminal; a retry
	/// takes a fresh request.
	pub async fn deny(&self, actor_id: i64, requester_id: i64) -> db::Result<bool> {
		let candidates = self.edges_between(requester_id, actor_id, true).await?;
		let now = Utc::now().timestamp_millis();

		let mut denied = false;
		for edge in &candidates {
			denied |= self.db.soft_delete_friendship(edge.id, now).await?;
		}
		if denied {
			self.resolver.invalidate(actor_id).await;
			self.resolver.invalidate(requester_id).await;
			debug!(
				"User {} denied the friendship request of user {}.",
				actor_id, requester_id
			);
		}
		Ok(denied)
	}

	/// Cuts every edge between `actor_id` and `target_id` that shows up in
	/// the actor's own view, approved or not. Returns whether at least one
	/// edge was cut; `false` means there was nothing to cut.
	pub async fn block(&self, actor_id: i64, target_id: i64) -> db::Result<bool> {
		let candidates = self.edges_between(actor_id, target_id, true).await?;
		let now = Utc::now().timestamp_millis();

		let mut blocked = false;
		for edge in &candidates {
			blocked |= self.db.soft_delete_friendship(edge.id, now).await?;
		}
		if blocked {
			self.resolver.invalidate(actor_id).await;
			self.resolver.invalidate(target_id).await;
			info!("User {} blocked user {}.", actor_id, target_id);
		}
		Ok(blocked)
	}

	/// Whether `candidate_id`'s resolved view holds an edge back to
	/// `actor_id`. Read-only; pending edges the candidate initiated
	/// themselves count, the way their view counts them.
	pub async fn is_friends_with(&self, actor_id: i64, candidate_id: i64) -> db::Result<bool> {
		let matches = self.edges_between(candidate_id, actor_id, false).await?;
		Ok(!matches.is_empty())
	}

	/// The ids of the users the actor is actively friends with right now.
	pub async fn current_friends(&self, actor_id: i64) -> db::Result<Vec<i64>> {
		self.current_friends_at(actor_id, Utc::now().timestamp_millis())
			.await
	}

	/// Like `current_friends`, with an explicit clock.
	pub async fn current_friends_at(&self, actor_id: i64, now: i64) -> db::Result<Vec<i64>> {
		let view = self.resolver.friends(actor_id).await?;
		let active = activity::current_edges(&view, now);
		Ok(activity::counterparts(actor_id, &active))
	}

	/// The requests still awaiting the actor's decision.
	pub async fn pending_requests(&self, actor_id: i64) -> db::Result<Vec<friendship::Model>> {
		self.db.query_incoming_pending(actor_id).await
	}

	/// The edges in `owner_id`'s resolved view whose other side is
	/// `other_id`. Every match is returned, not just the first, so that
	/// stray duplicate rows get processed rather than linger. Mutating
	/// callers pass `fresh` to drop the cached view first and scan current
	/// state.
	async fn edges_between(
		&self, owner_id: i64, other_id: i64, fresh: bool,
	) -> db::Result<Vec<friendship::Model>> {
		if fresh {
			self.resolver.invalidate(owner_id).await;
		}
		let view = self.resolver.friends(owner_id).await?;
		Ok(view
			.iter()
			.filter(|edge| edge.counterpart_of(owner_id) == other_id)
			.cloned()
			.collect())
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::test;

	#[tokio::test]
	async fn test_request_creates_pending_edge() {
		let api = test::load_api("request").await;

		let edge = api
			.request(
				1,
				2,
				&EdgeDetails {
					name: Some("buddy".to_owned()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(edge.source_id, 1);
		assert_eq!(edge.target_id, 2);
		assert!(edge.is_pending());

		let pending = api.pending_requests(2).await.unwrap();
		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].id, edge.id);
		assert_eq!(pending[0].name.as_deref(), Some("buddy"));

		// Pending on both ends: not a friendship yet from the target's side.
		assert!(!api.is_friends_with(1, 2).await.unwrap());
		assert!(api.current_friends(2).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_self_request_is_rejected() {
		let api = test::load_api("self-request").await;

		let result = api.request(1, 1, &EdgeDetails::default()).await;
		assert!(matches!(
			*result.unwrap_err(),
			db::Error::SelfFriendship(1)
		));
		assert!(api.current_friends(1).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_duplicate_requests_follow_config() {
		let db = test::load_database("duplicates").await;
		let permissive = Api::new(db.clone(), &Config::default());
		let strict = Api::new(
			db,
			&Config {
				reject_duplicate_requests: Some(true),
				..Default::default()
			},
		);

		permissive
			.request(1, 2, &EdgeDetails::default())
			.await
			.unwrap();
		// The default tolerates a second pending edge over the same pair.
		permissive
			.request(1, 2, &EdgeDetails::default())
			.await
			.unwrap();

		let result = strict.request(1, 2, &EdgeDetails::default()).await;
		assert!(matches!(
			*result.unwrap_err(),
			db::Error::DuplicateFriendship(1, 2)
		));
	}
}
