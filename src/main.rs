mod cli;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, PackageArgs, PublishArgs};
use tfc_publish::{PublishRequest, TfcClient, list_archive, output, package_directory, publish};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Publish(args) => run_publish(args).await?,
        Command::Package(args) => run_package(args)?,
    }

    Ok(())
}

async fn run_publish(args: PublishArgs) -> Result<()> {
    let token = args.api_token()?;
    let settings = args.settings();
    let request = PublishRequest::new(args.source, args.organization, args.workspace, token)?;

    let client = TfcClient::with_base_url(settings.address.clone(), settings.timeout)?;

    tracing::info!(
        organization = %request.organization,
        workspace = %request.workspace,
        source = %request.source_directory.display(),
        "publishing configuration"
    );

    let report = publish(&client, &request, &settings).await?;

    println!("{}", output::render_report(&report, args.format)?);
    Ok(())
}

fn run_package(args: PackageArgs) -> Result<()> {
    let artifact = package_directory(&args.source, &args.output_dir)
        .wrap_err_with(|| format!("packaging {}", args.source.display()))?;

    let entries = list_archive(artifact.path())?;
    let path = artifact.keep();

    println!("{}", output::archive_tree(&path.display().to_string(), &entries));
    Ok(())
}
