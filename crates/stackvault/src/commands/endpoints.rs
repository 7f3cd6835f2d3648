//! `endpoints` handlers.

use tabled::Tabled;

use stackvault_core::{Endpoint, endpoint_folder};

use crate::cli::{EndpointsArgs, EndpointsCommand, GlobalOpts};
use crate::config::RunOverrides;
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Folder")]
    folder: String,
}

fn to_row(e: &Endpoint) -> EndpointRow {
    EndpointRow {
        id: e.id,
        name: e.name.clone(),
        folder: endpoint_folder(&e.name),
    }
}

pub async fn handle(args: EndpointsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        EndpointsCommand::List => {
            let session = Session::open(global, &RunOverrides::default())?;
            let directory = session.service.endpoints().await.map_err(|e| session.fail(e))?;
            let endpoints = directory.endpoints();

            let out = output::render_list(global.output, &endpoints, to_row, |e| e.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
