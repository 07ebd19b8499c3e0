pub const QUERY: &'static str = r#"
	BEGIN;

	CREATE TABLE version (
		major INTEGER NOT NULL,
		minor INTEGER NOT NULL,
		patch INTEGER NOT NULL
	);
	INSERT INTO version VALUES (0, 1, 0);

	CREATE TABLE friendship (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		source_id INTEGER NOT NULL,
		target_id INTEGER NOT NULL,
		name TEXT,
		other_name TEXT,
		"start" INTEGER,
		"end" INTEGER,
		approved_at INTEGER,
		created_at INTEGER NOT NULL,
		updated_at INTEGER NOT NULL,
		deleted_at INTEGER
	);

	CREATE INDEX friendship_source ON friendship(source_id);
	CREATE INDEX friendship_target ON friendship(target_id);

	COMMIT;
"#;
