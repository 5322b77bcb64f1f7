//! Disposable Postgres databases for integration tests.
//!
//! Each [`TestDatabase`] lives on the server named by `NOTES_PG_DSN` and is dropped again by
//! [`TestDatabase::cleanup`], or by `Drop` when a test panics first.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "NOTES_PG_DSN";

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];
const NAME_PREFIX: &str = "notes_test_";

pub struct TestDatabase {
	name: String,
	dsn: String,
	admin: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let (admin, mut conn) = open_admin(&base).await?;
		let name = format!("{NAME_PREFIX}{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|source| Error::Create { name: name.clone(), source })?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.admin).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let admin = self.admin.clone();
		// The test's runtime may already be shutting down, so cleanup gets its own.
		let worker = thread::spawn(move || -> Result<()> {
			let runtime = Builder::new_current_thread().enable_all().build()?;

			runtime.block_on(drop_database(&name, &admin))
		});

		match worker.join() {
			Ok(Ok(())) => {},
			Ok(Err(err)) => eprintln!("Test database cleanup failed: {err}."),
			Err(_) => eprintln!("Test database cleanup thread panicked."),
		}
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

async fn open_admin(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::AdminUnreachable(last_err.unwrap_or(sqlx::Error::PoolClosed)))
}

async fn drop_database(name: &str, admin: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin).await.map_err(Error::AdminUnreachable)?;

	// Pools held by the test may still have idle connections open.
	sqlx::query(
		"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await
	.map_err(|source| Error::Drop { name: name.to_string(), source })?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.await
		.map_err(|source| Error::Drop { name: name.to_string(), source })?;

	Ok(())
}

