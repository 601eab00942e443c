use std::io::Write;
use std::path::Path;

use colored::Colorize;
use igloader_core::{PlannedUpload, ResourceReport, UploadPlan, UploadProgress, UploadSummary};
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_banner(igpack: &Path, target: &str, masked_token: Option<&str>) {
    println!("Processing JSON content from IG pack ...");
    println!("{}  {}", "IG pack:     ".cyan(), igpack.display());
    println!("{}  {}", "Target URL:  ".cyan(), target);
    println!(
        "{}  {}",
        "Access token:".cyan(),
        masked_token.unwrap_or("(none)")
    );
    println!();
}

/// UTC; the local offset cannot be read soundly once the runtime's worker
/// threads exist.
fn timestamp() -> String {
    let format = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default()
}

/// Live per-resource progress on the terminal. Silent in JSON mode.
pub struct TerminalProgress {
    enabled: bool,
}

impl TerminalProgress {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            enabled: matches!(format, OutputFormat::Text),
        }
    }
}

impl UploadProgress for TerminalProgress {
    fn plan_ready(&mut self, plan: &UploadPlan) {
        if !self.enabled {
            return;
        }
        let unsupported = plan.unsupported_types();
        if !unsupported.is_empty() {
            print_warning(&format!(
                "unsupported resource type(s) detected: {}",
                unsupported.join(", ")
            ));
        }
        println!(
            "{} resource(s) in {} archive entries",
            plan.uploads.len(),
            plan.entries
        );
    }

    fn resource_started(&mut self, position: usize, total: usize, upload: &PlannedUpload) {
        if !self.enabled {
            return;
        }
        print!(
            "{}  Uploading {} ({}/{}) : ",
            timestamp(),
            upload.entry,
            position,
            total
        );
        let _ = std::io::stdout().flush();
    }

    fn resource_finished(&mut self, report: &ResourceReport<'_>) {
        if !self.enabled {
            return;
        }
        match report.result {
            Ok(accepted) => {
                let reference = accepted
                    .location
                    .as_deref()
                    .map(location_reference)
                    .unwrap_or_else(|| report.route.reference());
                println!(
                    "{} {}",
                    reference.cyan(),
                    accepted.status.to_string().green()
                );
            }
            Err(error) => {
                let status = error
                    .status()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "error".to_string());
                println!("{}", status.red());
                print_error(&format!("{} {} failed: {}", report.method, report.url, error));
            }
        }
    }
}

/// `Type/id` out of a Location header such as
/// `http://host/r4/ValueSet/123/_history/1`.
fn location_reference(location: &str) -> String {
    let path = location.split("/_history/").next().unwrap_or(location);
    let mut segments = path.trim_end_matches('/').rsplit('/');
    match (segments.next(), segments.next()) {
        (Some(id), Some(rt)) if !id.is_empty() && !rt.is_empty() => format!("{rt}/{id}"),
        _ => location.to_string(),
    }
}

pub fn print_summary(summary: &UploadSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => print_text_summary(summary),
    }
    Ok(())
}

fn print_text_summary(summary: &UploadSummary) {
    println!();

    let mut details = vec![format!("{} skipped", summary.skipped)];
    if summary.excluded > 0 {
        details.push(format!("{} excluded", summary.excluded));
    }
    let details = details.join(", ");

    if summary.failures.is_empty() {
        print_success(&format!(
            "Uploaded {} of {} resource(s) ({})",
            summary.succeeded, summary.attempted, details
        ));
    } else {
        print_error(&format!(
            "{} of {} resource(s) failed ({})",
            summary.failed, summary.attempted, details
        ));
        print_failure_table(summary);
    }

    if summary.stopped_early() {
        print_warning(&format!(
            "Stopped early: {} resource(s) not attempted",
            summary.not_attempted
        ));
    }
}

fn print_failure_table(summary: &UploadSummary) {
    let mut builder = Builder::default();
    builder.push_record(["Entry", "Method", "URL", "Error"]);
    for failure in &summary.failures {
        builder.push_record([
            failure.entry.clone(),
            failure.method.to_string(),
            failure.url.clone(),
            failure.error.to_string(),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    eprintln!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_reference() {
        assert_eq!(
            location_reference("http://localhost:8080/r4/ValueSet/123/_history/1"),
            "ValueSet/123"
        );
        assert_eq!(location_reference("ConceptMap/42"), "ConceptMap/42");
        assert_eq!(location_reference("nothing"), "nothing");
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        // e.g. 2026-10-18 09:41:07.123Z
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert!(ts.ends_with('Z'));
    }
}
