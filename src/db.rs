mod install;

use std::{fmt, path::PathBuf, time::Duration};

use ::serde::{Deserialize, Serialize};
use async_trait::async_trait;
use sea_orm::{prelude::*, sea_query::*, *};
use thiserror::Error;

use crate::{
	entity::friendship,
	trace::{self, Traceable, Traced},
};


const DATABASE_VERSION: (u8, u16, u16) = (0, 1, 0);

#[derive(Clone)]
pub struct Database {
	orm: DatabaseConnection,
}

pub struct Transaction(pub(crate) sea_orm::DatabaseTransaction);

#[derive(Debug, Error)]
pub enum Error {
	OrmError(sea_orm::DbErr),
	/// A user tried to befriend themselves.
	SelfFriendship(i64),
	/// A live edge between the same ordered pair already exists.
	DuplicateFriendship(i64, i64),
}

pub type Result<T> = trace::Result<T, self::Error>;

/// The pivot fields a new friendship request carries. The window fields are
/// milliseconds since the UNIX epoch.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EdgeDetails {
	pub name: Option<String>,
	pub other_name: Option<String>,
	pub start: Option<i64>,
	pub end: Option<i64>,
}


#[async_trait]
pub trait PersistenceHandle {
	type Inner: ConnectionTrait;

	fn inner(&self) -> &Self::Inner;


	/// Inserts a new, unapproved edge from `source_id` to `target_id`.
	async fn insert_friendship(
		&self, source_id: i64, target_id: i64, details: &EdgeDetails, now: i64,
	) -> Result<friendship::Model> {
		let result = friendship::Entity::insert(friendship::ActiveModel {
			id: NotSet,
			source_id: Set(source_id),
			target_id: Set(target_id),
			name: Set(details.name.clone()),
			other_name: Set(details.other_name.clone()),
			start: Set(details.start),
			end: Set(details.end),
			approved_at: Set(None),
			created_at: Set(now),
			updated_at: Set(now),
			deleted_at: Set(None),
		})
		.exec(self.inner())
		.await?;

		Ok(friendship::Model {
			id: result.last_insert_id,
			source_id,
			target_id,
			name: details.name.clone(),
			other_name: details.other_name.clone(),
			start: details.start,
			end: details.end,
			approved_at: None,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		})
	}

	/// Marks the edge as approved, in one statement keyed by the edge id so
	/// that two racing callers can not both win. An edge that has already
	/// been approved or soft-deleted is left untouched. The approval
	/// timestamp is written at most once in an edge's lifetime.
	async fn approve_friendship(&self, friendship_id: i64, now: i64) -> Result<bool> {
		let result = friendship::Entity::update_many()
			.col_expr(friendship::Column::ApprovedAt, Expr::value(now))
			.col_expr(friendship::Column::UpdatedAt, Expr::value(now))
			.filter(friendship::Column::Id.eq(friendship_id))
			.filter(friendship::Column::ApprovedAt.is_null())
			.filter(friendship::Column::DeletedAt.is_null())
			.exec(self.inner())
			.await?;
		Ok(result.rows_affected > 0)
	}

	/// Takes the edge out of every future query without erasing the row.
	/// Terminal: a soft-deleted edge is never revived.
	async fn soft_delete_friendship(&self, friendship_id: i64, now: i64) -> Result<bool> {
		let result = friendship::Entity::update_many()
			.col_expr(friendship::Column::DeletedAt, Expr::value(now))
			.col_expr(friendship::Column::UpdatedAt, Expr::value(now))
			.filter(friendship::Column::Id.eq(friendship_id))
			.filter(friendship::Column::DeletedAt.is_null())
			.exec(self.inner())
			.await?;
		Ok(result.rows_affected > 0)
	}

	async fn find_friendship(&self, friendship_id: i64) -> Result<Option<friendship::Model>> {
		Ok(friendship::Entity::find()
			.filter(friendship::Column::Id.eq(friendship_id))
			.filter(friendship::Column::DeletedAt.is_null())
			.one(self.inner())
			.await?)
	}

	/// All live edges the user initiated, pending ones included. Ordered by
	/// creation time so that results are deterministic.
	async fn query_outgoing(&self, user_id: i64) -> Result<Vec<friendship::Model>> {
		Ok(friendship::Entity::find()
			.filter(friendship::Column::SourceId.eq(user_id))
			.filter(friendship::Column::DeletedAt.is_null())
			.order_by_asc(friendship::Column::CreatedAt)
			.order_by_asc(friendship::Column::Id)
			.all(self.inner())
			.await?)
	}

	/// All live edges aimed at the user; only the approved ones if
	/// `approved_only` is set.
	async fn query_incoming(
		&self, user_id: i64, approved_only: bool,
	) -> Result<Vec<friendship::Model>> {
		let mut query = friendship::Entity::find()
			.filter(friendship::Column::TargetId.eq(user_id))
			.filter(friendship::Column::DeletedAt.is_null());
		if approved_only {
			query = query.filter(friendship::Column::ApprovedAt.is_not_null());
		}
		Ok(query
			.order_by_asc(friendship::Column::CreatedAt)
			.order_by_asc(friendship::Column::Id)
			.all(self.inner())
			.await?)
	}

	/// The requests still awaiting the user's decision.
	async fn query_incoming_pending(&self, user_id: i64) -> Result<Vec<friendship::Model>> {
		Ok(friendship::Entity::find()
			.filter(friendship::Column::TargetId.eq(user_id))
			.filter(friendship::Column::DeletedAt.is_null())
			.filter(friendship::Column::ApprovedAt.is_null())
			.order_by_asc(friendship::Column::CreatedAt)
			.order_by_asc(friendship::Column::Id)
			.all(self.inner())
			.await?)
	}
}


impl Database {
	async fn check_version(&self) -> Result<()> {
		let stat = Statement::from_string(
			self.orm.get_database_backend(),
			"SELECT major, minor, patch FROM version".to_owned(),
		);
		match self.orm.query_one(stat).await {
			Ok(result) => {
				let row = result.expect("missing version data");
				let major: i32 = row.try_get_by_index(0)?;
				let minor: i32 = row.try_get_by_index(1)?;
				let patch: i32 = row.try_get_by_index(2)?;
				if Self::is_outdated(major as _, minor as _, patch as _) {
					Self::upgrade();
				}
				Ok(())
			}
			Err(e) =>
				if e.to_string().contains("no such table") {
					self.install().await
				} else {
					Err(e)?
				},
		}
	}

	async fn install(&self) -> Result<()> {
		self.orm.execute_unprepared(install::QUERY).await?;
		Ok(())
	}

	fn is_outdated(major: u8, minor: u16, patch: u16) -> bool {
		major < DATABASE_VERSION.0 || minor < DATABASE_VERSION.1 || patch < DATABASE_VERSION.2
	}

	pub async fn load(path: PathBuf) -> Result<Self> {
		let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
		opts.idle_timeout(Duration::from_secs(10));
		opts.acquire_timeout(Duration::from_secs(1));
		let orm = sea_orm::Database::connect(opts)
			.await
			.map_err(|e| self::Error::OrmError(e))?;

		let this = Self { orm };
		this.check_version().await?;
		Ok(this)
	}

	pub async fn transaction(&self) -> Result<Transaction> {
		let tx = self.orm.begin().await?;
		Ok(Transaction(tx))
	}

	fn upgrade() { panic!("No database upgrade implemented yet!"); }
}

impl Transaction {
	pub async fn commit(self) -> Result<()> {
		self.0.commit().await?;
		Ok(())
	}
}

impl PersistenceHandle for Database {
	type Inner = sea_orm::DatabaseConnection;

	fn inner(&self) -> &Self::Inner { &self.orm }
}

impl PersistenceHandle for Transaction {
	type Inner = sea_orm::DatabaseTransaction;

	fn inner(&self) -> &Self::Inner { &self.0 }
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::OrmError(e) => write!(f, "{}", e),
			Self::SelfFriendship(user_id) =>
				write!(f, "user {} can not befriend themselves", user_id),
			Self::DuplicateFriendship(source_id, target_id) => write!(
				f,
				"a friendship from user {} to user {} already exists",
				source_id, target_id
			),
		}
	}
}

impl From<sea_orm::DbErr> for Error {
	fn from(other: sea_orm::DbErr) -> Self { Self::OrmError(other) }
}

impl From<sea_orm::DbErr> for Traced<Error> {
	fn from(other: sea_orm::DbErr) -> Self { Error::OrmError(other).trace() }
}
