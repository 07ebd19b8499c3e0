//! A 'friendship' is a directed edge from the user that asked for it to the
//! user it is aimed at. It only counts as a mutual relationship once the
//! target has approved it, and either side can revoke it again on their own.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "friendship")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = true)]
	pub id: i64,
	/// The user that sent the request.
	pub source_id: i64,
	/// The user the request is aimed at.
	pub target_id: i64,
	/// What the source calls the target.
	pub name: Option<String>,
	/// What the target calls the source.
	pub other_name: Option<String>,
	/// Start of the validity window, in milliseconds since the UNIX epoch.
	/// Unbounded at this side if not set.
	pub start: Option<i64>,
	/// End of the validity window.
	pub end: Option<i64>,
	/// The moment the target approved the request. Not set means the request
	/// is still pending.
	pub approved_at: Option<i64>,
	pub created_at: i64,
	pub updated_at: i64,
	/// A set value takes the edge out of every query without erasing the row.
	pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
	/// The id of the other side of the edge, as seen from `user_id`'s view.
	pub fn counterpart_of(&self, user_id: i64) -> i64 {
		if self.source_id == user_id {
			self.target_id
		} else {
			self.source_id
		}
	}

	pub fn is_pending(&self) -> bool { self.approved_at.is_none() }
}
