pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("NOTES_PG_DSN is not a valid Postgres DSN: {0}")]
	InvalidDsn(sqlx::Error),
	#[error("No admin database accepted a connection: {0}")]
	AdminUnreachable(sqlx::Error),
	#[error("Failed to create test database {name}: {source}")]
	Create { name: String, source: sqlx::Error },
	#[error("Failed to drop test database {name}: {source}")]
	Drop { name: String, source: sqlx::Error },
	#[error("Failed to start a cleanup runtime: {0}")]
	Runtime(#[from] std::io::Error),
}
