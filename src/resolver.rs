//! Resolves the merged friend view of a user: the edges they initiated
//! themselves (pending ones included) together with the approved edges that
//! were initiated at them. Views are memoized per user until a mutation
//! invalidates them.

use std::{collections::HashMap, sync::Arc};

use log::*;
use tokio::sync::Mutex;

use crate::{
	db::{Database, PersistenceHandle, Result},
	entity::friendship,
};


#[derive(Clone)]
pub struct FriendResolver {
	db: Database,
	cache: Arc<Mutex<HashMap<i64, Arc<Vec<friendship::Model>>>>>,
}

impl FriendResolver {
	pub fn new(db: Database) -> Self {
		Self {
			db,
			cache: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	/// The merged friend view of the user. Served from cache when one is
	/// present, computed and cached otherwise.
	///
	/// The union is taken by edge identity, not by counterpart: a pending
	/// self-initiated edge and an approved reverse edge between the same
	/// pair are different rows, and both belong in the view.
	pub async fn friends(&self, user_id: i64) -> Result<Arc<Vec<friendship::Model>>> {
		{
			let cache = self.cache.lock().await;
			if let Some(resolved) = cache.get(&user_id) {
				return Ok(resolved.clone());
			}
		}

		let outgoing = self.db.query_outgoing(user_id).await?;
		let incoming = self.db.query_incoming(user_id, true).await?;
		let mut merged: Vec<friendship::Model> = Vec::with_capacity(outgoing.len() + incoming.len());
		merged.extend(outgoing);
		for edge in incoming {
			if !merged.iter().any(|known| known.id == edge.id) {
				merged.push(edge);
			}
		}

		let resolved = Arc::new(merged);
		self.cache
			.lock()
			.await
			.insert(user_id, resolved.clone());
		debug!("Resolved friend view of user {}.", user_id);
		Ok(resolved)
	}

	/// Drops the cached view of the user so the next read recomputes it.
	/// Calling this without a cached view present is a no-op.
	pub async fn invalidate(&self, user_id: i64) {
		let mut cache = self.cache.lock().await;
		if cache.remove(&user_id).is_some() {
			debug!("Invalidated friend view of user {}.", user_id);
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::{db::EdgeDetails, test};

	#[tokio::test]
	async fn test_merged_view_and_cache() {
		let db = test::load_database("resolver").await;
		let resolver = FriendResolver::new(db.clone());

		// User 1 sent a request to 2 (still pending), and approved one from 3.
		let outgoing = db
			.insert_friendship(1, 2, &EdgeDetails::default(), 1000)
			.await
			.unwrap();
		let incoming = db
			.insert_friendship(3, 1, &EdgeDetails::default(), 2000)
			.await
			.unwrap();
		db.approve_friendship(incoming.id, 3000).await.unwrap();
		// A pending incoming request stays out of the view.
		db.insert_friendship(4, 1, &EdgeDetails::default(), 4000)
			.await
			.unwrap();

		let view = resolver.friends(1).await.unwrap();
		let ids: Vec<i64> = view.iter().map(|e| e.id).collect();
		assert_eq!(ids, vec![outgoing.id, incoming.id]);

		// Without invalidation, a new edge isn't picked up yet.
		let late = db
			.insert_friendship(1, 5, &EdgeDetails::default(), 5000)
			.await
			.unwrap();
		assert_eq!(resolver.friends(1).await.unwrap().len(), 2);

		resolver.invalidate(1).await;
		let refreshed = resolver.friends(1).await.unwrap();
		assert!(refreshed.iter().any(|e| e.id == late.id));
	}

	#[tokio::test]
	async fn test_invalidate_is_idempotent() {
		let db = test::load_database("resolver-invalidate").await;
		let resolver = FriendResolver::new(db);

		// Nothing cached yet; neither call may fail.
		resolver.invalidate(1).await;
		resolver.invalidate(1).await;

		assert!(resolver.friends(1).await.unwrap().is_empty());
		resolver.invalidate(1).await;
		resolver.invalidate(1).await;
	}
}
