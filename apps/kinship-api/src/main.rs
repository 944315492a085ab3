use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = kinship_api::Args::parse();

	kinship_api::run(args).await
}
