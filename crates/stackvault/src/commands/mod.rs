//! Command dispatch: bridges CLI args -> core service -> output formatting.

pub mod backup;
pub mod clean;
pub mod config_cmd;
pub mod endpoints;
pub mod stacks;
pub mod util;

use stackvault_core::BackupService;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, RunOverrides};
use crate::error::CliError;

/// Dispatch a command that works on backups to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Backup(args) => backup::handle(args, global).await,
        Command::Stacks(args) => stacks::handle(args, global).await,
        Command::Endpoints(args) => endpoints::handle(args, global).await,
        Command::Clean(args) => clean::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            use clap::CommandFactory;

            let mut cmd = crate::cli::Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "stackvault", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// A service bound to the active profile, plus that profile's name.
pub(crate) struct Session {
    pub service: BackupService,
    pub profile: String,
}

impl Session {
    pub fn open(global: &GlobalOpts, overrides: &RunOverrides) -> Result<Self, CliError> {
        let (backup_config, profile) = config::resolve_backup_config(global, overrides)?;
        tracing::debug!(
            profile = %profile,
            url = %backup_config.url,
            output_dir = %backup_config.output_dir.display(),
            "resolved configuration"
        );
        let service =
            BackupService::new(backup_config).map_err(|e| CliError::from_core(e, &profile))?;
        Ok(Self { service, profile })
    }

    pub fn fail(&self, err: stackvault_core::CoreError) -> CliError {
        CliError::from_core(err, &self.profile)
    }
}
