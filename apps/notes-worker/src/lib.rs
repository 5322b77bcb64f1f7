pub mod worker;

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use notes_service::NotesService;
use notes_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = notes_cli::VERSION,
	rename_all = "kebab",
	styles = notes_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Run a single poll iteration and exit.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = notes_config::load(&args.config)?;

	notes_cli::init_tracing(&config.service.log_level);

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let poll_interval = Duration::from_millis(config.worker.poll_interval_ms);
	let state = worker::WorkerState { service: NotesService::new(config, db), poll_interval };

	if args.once {
		worker::run_once(&state).await?;

		return Ok(());
	}

	worker::run_worker(state).await
}
