//! `clean` handler: retention without a backup run.

use std::path::Path;
use std::time::SystemTime;

use tabled::Tabled;

use stackvault_core::{BackupRun, retention};

use crate::cli::{CleanArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RemovedRow {
    #[tabled(rename = "Directory")]
    path: String,
}

fn to_row(path: &Path) -> RemovedRow {
    RemovedRow {
        path: path.display().to_string(),
    }
}

pub async fn handle(args: CleanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config::RetentionScope {
        root,
        policy,
        profile,
    } = config::resolve_retention(global, args.output_dir, args.retention_days)?;
    // Today's run may still be in progress.
    let today = BackupRun::today(&root).dir();

    if !args.dry_run {
        let prompt = format!(
            "Remove backups under {} older than {} days?",
            root.display(),
            policy.max_age_days()
        );
        if !util::confirm(&prompt, "clean", global.yes)? {
            return Ok(());
        }
    }

    let removed = retention::clean(&root, policy, SystemTime::now(), Some(&today), args.dry_run)
        .await
        .map_err(|e| CliError::from_core(e, &profile))?;

    if removed.is_empty() {
        if !global.quiet {
            eprintln!("Nothing older than {} days under {}", policy.max_age_days(), root.display());
        }
        return Ok(());
    }

    let out = output::render_list(global.output, &removed, |p| to_row(p), |p| {
        p.display().to_string()
    })?;
    output::print_output(&out, global.quiet);
    if args.dry_run && !global.quiet {
        eprintln!("Dry run: {} directories would be removed", removed.len());
    }
    Ok(())
}
