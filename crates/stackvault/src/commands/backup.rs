//! `backup` handler: one full run plus its report.

use std::fmt::Write as _;
use std::time::Duration;

use bytesize::ByteSize;
use tabled::Tabled;

use stackvault_core::{ContentOutcome, PlatformBackupOutcome, RunReport, StackOutcome};

use crate::cli::{BackupArgs, GlobalOpts};
use crate::config::RunOverrides;
use crate::error::CliError;
use crate::output::{self, Tone, paint};

use super::Session;

#[derive(Tabled)]
struct StackRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Stack")]
    name: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Compose")]
    compose: String,
    #[tabled(rename = "Files")]
    files: usize,
}

impl From<&StackOutcome> for StackRow {
    fn from(outcome: &StackOutcome) -> Self {
        match outcome {
            StackOutcome::Saved(a) => {
                let compose = match a.content {
                    ContentOutcome::Written { bytes } => {
                        ByteSize::b(u64::try_from(bytes).unwrap_or(u64::MAX)).to_string()
                    }
                    ContentOutcome::Absent { reason } => format!("none ({reason})"),
                };
                let files = 1
                    + usize::from(a.content_file.is_some())
                    + usize::from(a.provenance_file.is_some());
                Self {
                    id: a.stack_id,
                    name: a.stack_name.clone(),
                    endpoint: a.endpoint.clone(),
                    compose,
                    files,
                }
            }
            StackOutcome::Failed {
                stack_id,
                stack_name,
                endpoint,
                error,
            } => Self {
                id: *stack_id,
                name: stack_name.clone(),
                endpoint: endpoint.clone(),
                compose: format!("write failed: {error}"),
                files: 0,
            },
        }
    }
}

/// Wall time rounded to milliseconds.
fn elapsed(report: &RunReport) -> Duration {
    let d = Duration::try_from_secs_f64(report.elapsed_secs).unwrap_or_default();
    Duration::new(d.as_secs(), d.subsec_millis() * 1_000_000)
}

fn detail(report: &RunReport, cleanup_enabled: bool, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Backup {} -> {}", report.date, report.run_dir.display());

    let platform = match &report.platform_backup {
        PlatformBackupOutcome::Saved { bytes, .. } => {
            paint(&format!("saved ({})", ByteSize::b(*bytes)), Tone::Good, color)
        }
        PlatformBackupOutcome::Failed { error } => {
            paint(&format!("failed: {error}"), Tone::Warn, color)
        }
    };
    let _ = writeln!(out, "  Platform export  {platform}");
    let _ = writeln!(out, "  Endpoints        {}", report.endpoint_count);

    let failed = report.failed_count();
    let failed = if failed == 0 {
        String::new()
    } else {
        paint(&format!(", {failed} failed"), Tone::Bad, color)
    };
    let _ = writeln!(
        out,
        "  Stacks           {} saved ({} with compose file){failed}",
        report.saved_count(),
        report.content_count(),
    );

    let cleanup = match (&report.cleanup_error, cleanup_enabled) {
        (Some(err), _) => paint(&format!("failed: {err}"), Tone::Warn, color),
        (None, true) => format!("removed {} old backup(s)", report.removed.len()),
        (None, false) => "disabled".into(),
    };
    let _ = writeln!(out, "  Cleanup          {cleanup}");
    let _ = write!(
        out,
        "  Elapsed          {}",
        humantime::format_duration(elapsed(report))
    );

    if !report.stacks.is_empty() {
        let rows: Vec<StackRow> = report.stacks.iter().map(StackRow::from).collect();
        let _ = write!(out, "\n\n{}", output::render_table(&rows));
    }
    out
}

pub async fn handle(args: BackupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let overrides = RunOverrides {
        output_dir: args.output_dir,
        backup_password: args.backup_password,
        cleanup: args.cleanup,
        retention_days: args.retention_days,
        concurrency: args.concurrency,
        require_platform_backup: args.require_platform_backup,
    };
    let session = Session::open(global, &overrides)?;
    let cleanup_enabled = session.service.config().retention.is_some();

    let report = session.service.run().await.map_err(|e| session.fail(e))?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| detail(r, cleanup_enabled, color),
        |r| r.run_dir.display().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
