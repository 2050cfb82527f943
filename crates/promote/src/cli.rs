//! CLI argument parsing with clap
//!
//! Every input can also be supplied through the GitHub Actions convention
//! `INPUT_<NAME>`, so the binary runs unchanged as an action step.

use clap::{Args, Parser};
use promote_core::Inputs;

/// Promote a container image from a candidate tag to a latest tag
#[derive(Parser, Debug)]
#[command(name = "promote")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub inputs: InputArgs,
}

/// Promotion inputs, kept as raw strings for validation by promote-core
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Repositories to promote, one per line (`#` starts a comment)
    #[arg(long, env = "INPUT_REPOSITORY", default_value = "")]
    pub repository: String,

    /// Tag holding the promotion candidate
    #[arg(long, env = "INPUT_CANDIDATE-TAG", default_value = "")]
    pub candidate_tag: String,

    /// Tag to move when the candidate is newer
    #[arg(long, env = "INPUT_LATEST-TAG", default_value = "")]
    pub latest_tag: String,

    /// Where to read the version: `label:<name>` or `env:<name>`
    #[arg(long, env = "INPUT_VERSION-SOURCE", default_value = "")]
    pub version_source: String,

    /// Allow a prerelease candidate to replace a non-prerelease latest
    #[arg(long, env = "INPUT_PROMOTE-PRERELEASE", default_value = "false")]
    pub promote_prerelease: String,

    /// Coerce loose version strings instead of requiring strict semver
    #[arg(long, env = "INPUT_COERCE-SEMVER", default_value = "false")]
    pub coerce_semver: String,

    /// Platform used to pick a manifest from multi-platform images
    #[arg(long, env = "INPUT_MANIFEST-PLATFORM", default_value = "linux/amd64")]
    pub manifest_platform: String,
}

impl From<InputArgs> for Inputs {
    fn from(args: InputArgs) -> Self {
        Self {
            repository: args.repository,
            candidate_tag: args.candidate_tag,
            latest_tag: args.latest_tag,
            version_source: args.version_source,
            promote_prerelease: args.promote_prerelease,
            coerce_semver: args.coerce_semver,
            manifest_platform: args.manifest_platform,
        }
    }
}
