use crate::prelude::*;
use clap::Parser;

mod client;
mod error;
mod gateway;
mod prelude;
mod store;
mod wallet;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Draft Solidity smart contracts from templates with a generative AI model"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "KOFTA_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the prompt gateway HTTP server
    Serve(crate::gateway::App),

    /// Interactive template client
    Client(crate::client::App),

    /// Generate a contract for one template and print it
    Generate(crate::client::GenerateOptions),

    /// List the built-in contract templates
    Templates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    let default_level = if app.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    color_eyre::install()?;

    match app.command {
        SubCommands::Serve(sub_app) => crate::gateway::run(sub_app, app.global).await,
        SubCommands::Client(sub_app) => crate::client::run(sub_app, app.global).await,
        SubCommands::Generate(options) => crate::client::generate_once(options, app.global).await,
        SubCommands::Templates => {
            crate::client::print_templates();
            Ok(())
        }
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
