mod auth;
mod show;
mod values;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trix::auth::{CodeSource, LoopbackReceiver, TerminalPrompt};
use trix::{Result, Settings};

pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "trix")]
#[command(about = "Read and write a Google Sheets spreadsheet", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the XDG config location)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Receive the authorization code on this loopback port instead of pasting it
    #[arg(long, global = true)]
    pub loopback_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let settings = self.load_settings()?;

        match &self.command {
            Commands::Auth { reset } => {
                auth::execute(&settings, self.code_source(), *reset).await
            }
            Commands::Get {
                spreadsheet_id,
                range,
            } => values::get(&settings, self.code_source(), spreadsheet_id, range).await,
            Commands::Update {
                spreadsheet_id,
                range,
                values,
            } => {
                values::update(&settings, self.code_source(), spreadsheet_id, range, values).await
            }
            Commands::Append {
                spreadsheet_id,
                cells,
            } => values::append(&settings, self.code_source(), spreadsheet_id, cells).await,
            Commands::Show { resource } => resource.execute(&settings),
        }
    }

    fn load_settings(&self) -> Result<Settings> {
        match &self.settings {
            Some(path) => Settings::load(path),
            None => Settings::load_default(),
        }
    }

    fn code_source(&self) -> Box<dyn CodeSource> {
        match self.loopback_port {
            Some(port) => Box::new(LoopbackReceiver::new(port)),
            None => Box::new(TerminalPrompt),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize and cache a credential
    Auth {
        /// Discard the cached credential first
        #[arg(long)]
        reset: bool,
    },
    /// Print the values in a range as JSON
    Get {
        spreadsheet_id: String,
        /// A1 range, e.g. "RSVP!A1:C5"
        range: String,
    },
    /// Overwrite a range with a JSON array of rows
    Update {
        spreadsheet_id: String,
        range: String,
        /// e.g. '[["Ada", 2, "none"]]'
        values: String,
    },
    /// Append one row below the existing data
    Append {
        spreadsheet_id: String,
        #[arg(required = true)]
        cells: Vec<String>,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
