use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use igloader_core::UploadOptions;

#[derive(Parser, Debug)]
#[command(name = "igloader")]
#[command(about = "Upload (JSON-encoded) conformance resources from a FHIR IG pack to a FHIR server")]
#[command(version)]
#[command(
    after_help = "If the ACCESS_TOKEN environment variable is defined, its value is used as an OAuth bearer token for the FHIR API."
)]
pub struct Cli {
    /// IG pack file (e.g. us-core-v3.1.1-package.tgz)
    #[arg(short, long, env = "IGLOADER_IGPACK", value_name = "PATH")]
    pub igpack: PathBuf,

    /// FHIR API base URL of the target server (e.g. http://localhost:8080/r4)
    #[arg(short, long, env = "IGLOADER_TARGET", value_name = "URL")]
    pub target: String,

    /// OAuth bearer token for the FHIR API
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds (no timeout by default)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Resource type to leave out, may be repeated (e.g. --skip-type ImplementationGuide)
    #[arg(long = "skip-type", value_name = "TYPE")]
    pub skip_types: Vec<String>,

    /// Stop after the first failed upload (422 rejections do not stop the run)
    #[arg(long)]
    pub fail_fast: bool,

    /// Output format
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Progress lines and a summary table
    #[default]
    Text,
    /// A single JSON summary on stdout
    Json,
}

impl Cli {
    pub fn upload_options(&self) -> UploadOptions {
        let mut options = UploadOptions::new()
            .with_access_token(self.access_token.clone())
            .with_skip_types(self.skip_types.iter().cloned())
            .with_fail_fast(self.fail_fast);
        if let Some(secs) = self.timeout {
            options = options.with_request_timeout(Duration::from_secs(secs));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_required_args() {
        let cli = Cli::try_parse_from([
            "igloader",
            "--igpack",
            "us-core-v3.1.1-package.tgz",
            "--target",
            "http://localhost:8080/r4",
        ])
        .unwrap();

        assert_eq!(cli.igpack, PathBuf::from("us-core-v3.1.1-package.tgz"));
        assert_eq!(cli.target, "http://localhost:8080/r4");
        assert!(cli.format.is_none());
        assert!(!cli.fail_fast);
    }

    #[test]
    fn test_parse_options() {
        let cli = Cli::try_parse_from([
            "igloader",
            "-i",
            "pack.tgz",
            "-t",
            "https://fhir.example.org",
            "--access-token",
            "abc123",
            "--timeout",
            "30",
            "--skip-type",
            "ImplementationGuide",
            "--skip-type",
            "CapabilityStatement",
            "--fail-fast",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);

        let options = cli.upload_options();
        assert_eq!(options.access_token.as_deref(), Some("abc123"));
        assert_eq!(options.request_timeout, Some(Duration::from_secs(30)));
        assert!(options.skips("ImplementationGuide"));
        assert!(options.skips("CapabilityStatement"));
        assert!(options.fail_fast);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from([
            "igloader", "-i", "pack.tgz", "-t", "http://x", "-q", "-v",
        ]);
        assert!(result.is_err());
    }
}
