use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    nichecat::logging::init().context("init logging")?;

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let cli = nichecat::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        nichecat::cli::Command::Covers(args) => {
            nichecat::covers::run(&cli.catalog, args).context("covers")?;
        }
        nichecat::cli::Command::Generate(args) => {
            nichecat::generate::run(&cli.catalog, args).context("generate")?;
        }
        nichecat::cli::Command::Retag(args) => {
            nichecat::retag::run(&cli.catalog, args).context("retag")?;
        }
    }

    Ok(())
}
