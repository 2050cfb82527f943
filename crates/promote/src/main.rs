//! promote - move a latest tag to a newer candidate image
//!
//! Entry point for both local runs and GitHub Actions steps.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use promote_core::{error_annotation, GithubOutput, OutputSink, Request, StdoutOutput};
use promote_registry::{CredentialStore, RegistryClient};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = run(cli).await;
    if let Some(annotation) = result.as_ref().err().and_then(failure_annotation) {
        println!("{}", annotation);
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let request = Request::from_inputs(&cli.inputs.into())?;

    let credentials = CredentialStore::from_docker_config()
        .context("Failed to load registry credentials")?;
    let registry = RegistryClient::new()?.with_credentials(credentials);

    let outputs: Box<dyn OutputSink> = match GithubOutput::from_env() {
        Some(sink) => {
            tracing::debug!("Writing outputs to {}", sink.path().display());
            Box::new(sink)
        }
        None => Box::new(StdoutOutput),
    };

    let summary = promote_core::run(&registry, &request, outputs.as_ref()).await?;
    tracing::debug!(
        "{} of {} repositories promoted",
        summary.promoted_count(),
        summary.outcomes.len()
    );
    Ok(())
}

/// Workflow command surfacing a failure as an annotation under GitHub Actions
fn failure_annotation(error: &anyhow::Error) -> Option<String> {
    let in_actions = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");
    in_actions.then(|| error_annotation(&format!("{:#}", error)))
}

/// Initialize tracing with appropriate verbosity
///
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("info"),
                1 => EnvFilter::new("debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    // Logs go to stderr so stdout stays free for outputs
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
