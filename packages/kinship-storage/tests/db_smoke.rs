use kinship_config::Postgres;
use kinship_storage::db::Db;
use kinship_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres. Set KINSHIP_PG_DSN to run."]
async fn db_connects_and_bootstraps_twice() {
	let Some(base_dsn) = kinship_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps_twice; set KINSHIP_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	db.ensure_schema().await.expect("Schema bootstrap must be repeatable.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'contacts'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set KINSHIP_PG_DSN to run."]
async fn contact_shape_is_enforced_by_schema() {
	let Some(base_dsn) = kinship_testkit::env_dsn() else {
		eprintln!("Skipping contact_shape_is_enforced_by_schema; set KINSHIP_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let insert = r#"
		INSERT INTO contacts (email, phone_number, linked_id, link_precedence)
		VALUES ($1, $2, $3, $4)
	"#;

	for (email, phone_number, linked_id, precedence) in [
		(None::<&str>, None::<&str>, None::<i64>, "primary"),
		(Some("a@x.com"), None, Some(1), "primary"),
		(Some("a@x.com"), None, None, "secondary"),
		(Some("a@x.com"), None, None, "tertiary"),
	] {
		let result = sqlx::query(insert)
			.bind(email)
			.bind(phone_number)
			.bind(linked_id)
			.bind(precedence)
			.execute(&db.pool)
			.await;

		assert!(
			result.is_err(),
			"Expected ({email:?}, {phone_number:?}, {linked_id:?}, {precedence}) to be rejected."
		);
	}

	let ok = sqlx::query(insert)
		.bind(Some("a@x.com"))
		.bind(None::<&str>)
		.bind(None::<i64>)
		.bind("primary")
		.execute(&db.pool)
		.await;

	assert!(ok.is_ok(), "Expected a valid primary to insert cleanly: {ok:?}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
