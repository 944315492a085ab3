use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::{Table, Value};

use kinship_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_table() -> Table {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn section<'a>(root: &'a mut Table, path: &[&str]) -> &'a mut Table {
	let mut current = root;

	for key in path {
		current = current
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	current
}

fn render(table: &Table) -> String {
	toml::to_string(table).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("kinship_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> kinship_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = kinship_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");

	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(render(&sample_table())).expect("Sample config must load.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:8080");
	assert_eq!(cfg.storage.postgres.pool_max_conns, 8);
	assert_eq!(cfg.identify.max_retries, 3);
	assert!(cfg.identify.flatten_on_merge);
	assert!(cfg.security.bind_localhost_only);
}

#[test]
fn identify_section_is_optional() {
	let mut table = sample_table();

	table.remove("identify");

	let cfg = load_payload(render(&table)).expect("Config without [identify] must load.");

	assert_eq!(cfg.identify.max_retries, 3);
	assert_eq!(cfg.identify.base_backoff_ms, 50);
	assert_eq!(cfg.identify.max_backoff_ms, 2_000);
	assert_eq!(cfg.identify.timeout_ms, 10_000);
	assert!(cfg.identify.flatten_on_merge);
}

#[test]
fn partial_identify_section_keeps_defaults() {
	let mut table = sample_table();
	let mut identify = Table::new();

	identify.insert("flatten_on_merge".to_string(), Value::Boolean(false));
	table.insert("identify".to_string(), Value::Table(identify));

	let cfg = load_payload(render(&table)).expect("Partial [identify] must load.");

	assert!(!cfg.identify.flatten_on_merge);
	assert_eq!(cfg.identify.timeout_ms, 10_000);
}

#[test]
fn blank_log_level_falls_back_to_info() {
	let mut table = sample_table();

	section(&mut table, &["service"]).insert("log_level".to_string(), Value::String("  ".into()));

	let cfg = load_payload(render(&table)).expect("Blank log level must load.");

	assert_eq!(cfg.service.log_level, "info");
}

#[test]
fn http_bind_must_be_non_empty() {
	let mut table = sample_table();

	section(&mut table, &["service"]).insert("http_bind".to_string(), Value::String(" ".into()));

	expect_validation(render(&table), "service.http_bind must be non-empty.");
}

#[test]
fn dsn_must_be_non_empty() {
	let mut table = sample_table();

	section(&mut table, &["storage", "postgres"])
		.insert("dsn".to_string(), Value::String(String::new()));

	expect_validation(render(&table), "storage.postgres.dsn must be non-empty.");
}

#[test]
fn pool_max_conns_must_be_positive() {
	let mut table = sample_table();

	section(&mut table, &["storage", "postgres"])
		.insert("pool_max_conns".to_string(), Value::Integer(0));

	expect_validation(render(&table), "storage.postgres.pool_max_conns must be greater than zero.");
}

#[test]
fn timeout_must_be_positive() {
	let mut table = sample_table();

	section(&mut table, &["identify"]).insert("timeout_ms".to_string(), Value::Integer(0));

	expect_validation(render(&table), "identify.timeout_ms must be greater than zero.");
}

#[test]
fn base_backoff_must_not_exceed_max_backoff() {
	let mut table = sample_table();
	let identify = section(&mut table, &["identify"]);

	identify.insert("base_backoff_ms".to_string(), Value::Integer(500));
	identify.insert("max_backoff_ms".to_string(), Value::Integer(100));

	expect_validation(
		render(&table),
		"identify.base_backoff_ms must not exceed identify.max_backoff_ms.",
	);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("kinship_config_test_missing.toml");
	let err = kinship_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error kind: {err:?}");
}

#[test]
fn malformed_file_reports_parse_error() {
	let err =
		load_payload("[service\nhttp_bind = 1".to_string()).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error kind: {err:?}");
}
