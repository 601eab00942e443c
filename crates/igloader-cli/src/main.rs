mod cli;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, OutputFormat};
use igloader_core::{UploadSummary, Uploader};
use output::{TerminalProgress, print_banner, print_error, print_summary};

#[tokio::main]
async fn main() {
    // Load .env file if present; a missing file is not an error
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();
    observability::init_tracing(cli.verbose, cli.quiet, format == OutputFormat::Text);

    match run(&cli).await {
        Ok(summary) if summary.is_success() => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<UploadSummary> {
    let format = cli.format.unwrap_or_default();
    let uploader =
        Uploader::new(&cli.target, cli.upload_options()).context("Cannot use target server")?;

    if format == OutputFormat::Text {
        let masked = uploader.options().masked_token();
        print_banner(
            &cli.igpack,
            uploader.client().base_url().as_str(),
            masked.as_deref(),
        );
    }

    let mut progress = TerminalProgress::new(format);
    let summary = uploader
        .upload_pack(&cli.igpack, &mut progress)
        .await
        .context("Upload aborted")?;

    print_summary(&summary, format)?;
    Ok(summary)
}
