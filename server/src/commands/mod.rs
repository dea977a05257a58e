use clap::Subcommand;

use crate::Result;

pub(crate) mod seed;
pub(crate) mod serve;
pub(crate) mod validate;

#[derive(Subcommand, Default)]
pub(crate) enum Command {
    /// Run the HTTP API (the default)
    #[default]
    Serve,
    /// Load the sample data into the configured database, then exit
    Seed,
    /// Check the bundled sample data
    Validate,
}

impl Command {
    pub(crate) async fn run(&self) -> Result<()> {
        match &self {
            Command::Serve => serve::serve().await,
            Command::Seed => seed::seed().await,
            Command::Validate => validate::validate(),
        }
    }
}
