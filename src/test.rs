use log::*;
use tempfile::NamedTempFile;

use crate::{api::Api, config::Config, db::Database};


pub async fn load_database(filename: &str) -> Database {
	let temp_file = NamedTempFile::with_prefix(filename).unwrap();
	let db = Database::load(temp_file.path().to_owned())
		.await
		.expect("unable to load database");
	debug!("Loaded database at {}", temp_file.path().display());
	// Leak it on purpose so that the temp file may live until the end of all tests
	Box::into_raw(Box::new(temp_file));
	db
}

/// Sets up an `Api` over a fresh database, with the default configuration.
pub async fn load_api(filename: &str) -> Api {
	let db = load_database(filename).await;
	Api::new(db, &Config::default())
}
