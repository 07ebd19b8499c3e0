use std::{
	fmt,
	fs::File,
	io::{self, prelude::*},
	path::Path,
};

use lazy_static::lazy_static;
use log::*;
use once_cell::sync::OnceCell;
use serde::*;


/// The file path of the configuration file
#[cfg(target_family = "unix")]
pub const CONFIG_FILE_PATH: &str = "/etc/amity/config.toml";
#[cfg(target_family = "windows")]
pub const CONFIG_FILE_PATH: &str = "C:\\Program Files\\amity\\config.toml";

#[derive(Clone, Deserialize)]
pub struct Config {
	pub database_path: String,

	/// When set, a second request over a live edge between the same ordered
	/// pair is rejected instead of stored alongside it.
	pub reject_duplicate_requests: Option<bool>,
}


impl Default for Config {
	fn default() -> Self {
		Self {
			database_path: String::default(),
			reject_duplicate_requests: None,
		}
	}
}

impl Config {
	pub fn load<P>(path: P) -> Option<Self>
	where
		P: AsRef<Path> + fmt::Debug,
	{
		let mut file = match File::open(&path) {
			Err(e) => match e.kind() {
				io::ErrorKind::NotFound => {
					error!("Config file {:?} not found!", path);
					return None;
				}
				_ => {
					error!("Unable to open config file {:?}: {}", path, e);
					return None;
				}
			},
			Ok(f) => f,
		};

		let mut content = String::new();
		match file.read_to_string(&mut content) {
			Err(e) => {
				error!("Unable to read config file {:?}: {}", path, e);
				return None;
			}
			Ok(_) => {}
		}

		match toml::from_str(&content) {
			Err(e) => {
				error!("Unable to parse config file {:?}: {}", path, e);
				None
			}
			Ok(c) => Some(c),
		}
	}
}


lazy_static! {
	pub static ref CONFIG: OnceCell<Config> = OnceCell::new();
}


#[cfg(test)]
mod tests {
	use std::io::Write;

	use tempfile::NamedTempFile;

	use super::*;

	#[test]
	fn test_load_config_file() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "database_path = \"/var/lib/amity/db.sqlite\"").unwrap();
		writeln!(file, "reject_duplicate_requests = true").unwrap();

		let config = Config::load(file.path()).expect("unable to parse config");
		assert_eq!(config.database_path, "/var/lib/amity/db.sqlite");
		assert_eq!(config.reject_duplicate_requests, Some(true));

		assert!(Config::load("/nonexistent/amity.toml").is_none());
	}
}
