//! `stacks` handlers.

use tabled::Tabled;

use stackvault_core::{EndpointDirectory, Stack};

use crate::cli::{GlobalOpts, StacksArgs, StacksCommand};
use crate::config::RunOverrides;
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct StackRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Source")]
    source: String,
}

fn to_row(stack: &Stack, endpoints: &EndpointDirectory) -> StackRow {
    StackRow {
        id: stack.id,
        name: stack.name.clone(),
        kind: stack.stack_type.to_string(),
        endpoint: endpoints.name_for(stack.endpoint_id).into_owned(),
        source: stack
            .git_url()
            .map_or_else(|| "inline".into(), |url| format!("git {url}")),
    }
}

pub async fn handle(args: StacksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StacksCommand::List => {
            let session = Session::open(global, &RunOverrides::default())?;
            let endpoints = session.service.endpoints().await.map_err(|e| session.fail(e))?;
            let mut stacks = session.service.stacks().await.map_err(|e| session.fail(e))?;
            stacks.sort_by_key(|s| s.id);

            let out = output::render_list(
                global.output,
                &stacks,
                |s| to_row(s, &endpoints),
                |s| s.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
