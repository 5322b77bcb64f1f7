use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub collaborator: Collaborator,
	#[serde(default)]
	pub generation: Generation,
	#[serde(default)]
	pub worker: Worker,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// How the generation collaborator is reached.
///
/// `process` spawns `program` with `args` and speaks one JSON message each way over
/// stdin/stdout. `http` POSTs the same message to `url`.
#[derive(Debug, Deserialize)]
pub struct Collaborator {
	pub transport: String,
	#[serde(default)]
	pub program: String,
	#[serde(default)]
	pub args: Vec<String>,
	#[serde(default)]
	pub url: String,
	pub api_key: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Generation {
	/// Label stored alongside summaries when the collaborator does not report its model.
	pub summary_model: String,
	pub quiz_question_count: u32,
	pub chat_history_limit: u32,
	pub recent_conversations_limit: u32,
	/// Upper bound on how long a generation request waits for a pending PDF extraction.
	/// Zero fails immediately with an extraction-pending error.
	pub extraction_wait_ms: u64,
	pub extraction_poll_ms: u64,
}
impl Default for Generation {
	fn default() -> Self {
		Self {
			summary_model: "gemini-2.5-flash".to_string(),
			quiz_question_count: 10,
			chat_history_limit: 10,
			recent_conversations_limit: 5,
			extraction_wait_ms: 5_000,
			extraction_poll_ms: 250,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Worker {
	pub poll_interval_ms: u64,
	pub lease_seconds: i64,
}
impl Default for Worker {
	fn default() -> Self {
		Self { poll_interval_ms: 500, lease_seconds: 300 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
	pub admin_auth_token: Option<String>,
}
