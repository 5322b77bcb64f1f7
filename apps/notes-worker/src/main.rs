use clap::Parser;

use notes_worker::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	notes_worker::run(Args::parse()).await
}
