mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Collaborator, Config, Generation, Postgres, Security, Service, Storage, Worker};

use std::{fs, path::Path};

pub const TRANSPORT_PROCESS: &str = "process";
pub const TRANSPORT_HTTP: &str = "http";

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
	for (label, value) in
		[("service.http_bind", &cfg.service.http_bind), ("service.admin_bind", &cfg.service.admin_bind)]
	{
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
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

	validate_collaborator(&cfg.collaborator)?;

	let generation = &cfg.generation;

	if generation.summary_model.trim().is_empty() {
		return Err(Error::Validation {
			message: "generation.summary_model must be non-empty.".to_string(),
		});
	}

	for (label, value) in [
		("generation.quiz_question_count", generation.quiz_question_count),
		("generation.chat_history_limit", generation.chat_history_limit),
		("generation.recent_conversations_limit", generation.recent_conversations_limit),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if generation.extraction_wait_ms > 0 && generation.extraction_poll_ms == 0 {
		return Err(Error::Validation {
			message:
				"generation.extraction_poll_ms must be greater than zero when generation.extraction_wait_ms is set."
					.to_string(),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}

	// A generation job may wait for extraction before calling the collaborator.
	let busy_seconds = cfg
		.collaborator
		.timeout_ms
		.saturating_add(generation.extraction_wait_ms)
		.div_ceil(1_000);

	if cfg.worker.lease_seconds <= 0 || (cfg.worker.lease_seconds as u64) <= busy_seconds {
		return Err(Error::Validation {
			message: "worker.lease_seconds must be greater than collaborator.timeout_ms plus generation.extraction_wait_ms in seconds."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_collaborator(collaborator: &Collaborator) -> Result<()> {
	match collaborator.transport.as_str() {
		TRANSPORT_PROCESS =>
			if collaborator.program.trim().is_empty() {
				return Err(Error::Validation {
					message: "collaborator.program must be non-empty when collaborator.transport is process."
						.to_string(),
				});
			},
		TRANSPORT_HTTP =>
			if collaborator.url.trim().is_empty() {
				return Err(Error::Validation {
					message: "collaborator.url must be non-empty when collaborator.transport is http."
						.to_string(),
				});
			},
		_ => {
			return Err(Error::Validation {
				message: "collaborator.transport must be one of process or http.".to_string(),
			});
		},
	}

	if collaborator.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "collaborator.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if collaborator.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "collaborator.default_headers values must be strings.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.collaborator.transport = cfg.collaborator.transport.trim().to_ascii_lowercase();

	if cfg.collaborator.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.collaborator.api_key = None;
	}
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}
	if cfg
		.security
		.admin_auth_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.admin_auth_token = None;
	}
}
