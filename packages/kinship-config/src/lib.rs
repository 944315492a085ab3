mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Identify, Postgres, Security, Service, Storage};

use std::{fs, path::Path};

const DEFAULT_LOG_LEVEL: &str = "info";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.identify.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "identify.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.identify.base_backoff_ms > cfg.identify.max_backoff_ms {
		return Err(Error::Validation {
			message: "identify.base_backoff_ms must not exceed identify.max_backoff_ms."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = DEFAULT_LOG_LEVEL.to_string();
	}
}
