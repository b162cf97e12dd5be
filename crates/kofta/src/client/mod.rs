pub(crate) mod gateway;
pub(crate) mod handler;

use crate::prelude::{eprintln, println, *};
use crate::store::{AuthProvider, SqliteStore};
use crate::wallet::{RpcWallet, SolcCompiler};
use colored::Colorize;
use gateway::{GatewayClient, DEFAULT_GATEWAY_URL};
use handler::{Client, Output};
use kofta_core::command::{self, Command};
use kofta_core::prompt::GenerationRequest;
use kofta_core::session::{Session, GENERATION_FAILED};
use kofta_core::template;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, clap::Args)]
pub struct App {
    /// Base URL of the prompt gateway
    #[arg(long, env = "KOFTA_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway: String,

    /// JSON-RPC endpoint of the wallet node used for deployments
    #[arg(long, env = "KOFTA_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Solidity compiler used before deploying
    #[arg(long, env = "KOFTA_SOLC", default_value = "solc")]
    pub solc: String,

    /// Delay between transaction receipt polls, in milliseconds
    #[arg(long, default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Number of receipt polls before a deployment is given up
    #[arg(long, default_value = "60")]
    pub max_polls: u32,

    /// Path of the deployment database
    #[arg(long, env = "KOFTA_DB")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct GenerateOptions {
    /// Template number or name (see `kofta templates`)
    pub template: String,

    /// Base URL of the prompt gateway
    #[arg(long, env = "KOFTA_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway: String,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let db_path = match app.db {
        Some(path) => path,
        None => SqliteStore::default_path()?,
    };

    if global.verbose {
        eprintln!("Gateway: {}", app.gateway);
        eprintln!("Database: {}", db_path.display());
        eprintln!(
            "Wallet: {}",
            app.rpc_url.as_deref().unwrap_or("not configured")
        );
    }

    let store = SqliteStore::open(&db_path)
        .map_err(|e| eyre!("Failed to open {}: {}", db_path.display(), e))?;
    let wallet = app
        .rpc_url
        .as_deref()
        .map(|url| {
            RpcWallet::new(url, SolcCompiler::new(&app.solc))
                .with_polling(Duration::from_millis(app.poll_interval_ms), app.max_polls)
        });

    let client = Client {
        gateway: GatewayClient::new(&app.gateway),
        wallet,
        store,
    };

    let mut session = Session::new();
    match client.store.current_user() {
        Ok(Some(user)) => {
            println!("Signed in as {}", user.label());
            session.sign_in(user);
        }
        Ok(None) => {}
        Err(err) => log::error!("Error reading signed-in user: {err}"),
    }

    println!("{}", "./KOFTA".bold());
    println!("Type `templates` to list templates or `help` for all commands.");

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut line = String::new();

    loop {
        prompt(&session)?;

        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let command = match command::parse(trimmed) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message.yellow());
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        let outputs = client.dispatch(&mut session, command).await;
        render(&outputs);
    }

    Ok(())
}

/// Generate a contract for one template and print it to stdout.
pub async fn generate_once(options: GenerateOptions, _global: crate::Global) -> Result<()> {
    let name = template::resolve(&options.template)
        .ok_or_else(|| eyre!("Unknown template: {}", options.template))?;
    let request = GenerationRequest::new(&name)?;

    let gateway = GatewayClient::new(&options.gateway);
    let mut session = Session::new();
    let outputs = handler::request_contract(&gateway, &mut session, request.into()).await;

    match session.result() {
        Some(generated) => {
            println!("{}", generated.contract);
            Ok(())
        }
        None => Err(eyre!(failure_message(&outputs))),
    }
}

/// The alert to report once when a one-shot command fails.
fn failure_message(outputs: &[Output]) -> String {
    outputs
        .iter()
        .find_map(|output| match output {
            Output::Alert(message) => Some(message.clone()),
            _ => None,
        })
        .unwrap_or_else(|| GENERATION_FAILED.to_string())
}

pub fn print_templates() {
    render(&[Output::Templates]);
}

fn prompt(session: &Session) -> Result<()> {
    let mut stdout = std::io::stdout();
    let marker = match session.account() {
        Some(_) => "kofta*> ",
        None => "kofta> ",
    };
    write!(stdout, "{} {}", f!("[XP {}]", session.xp()).cyan(), marker)?;
    stdout.flush()?;
    Ok(())
}

fn render(outputs: &[Output]) {
    for output in outputs {
        match output {
            Output::Line(text) => println!("{text}"),
            Output::Success(text) => println!("{}", text.green().bold()),
            Output::Alert(text) => eprintln!("{}", text.red().bold()),
            Output::Contract { template, contract } => {
                println!("{}", f!("Generated Smart Contract: {template}").bold());
                println!();
                println!("{contract}");
                println!();
            }
            Output::Templates => {
                let mut table = new_table();
                table.add_row(prettytable::row!["#", "Template"]);
                for (index, name) in template::all().iter().enumerate() {
                    table.add_row(prettytable::row![index + 1, name]);
                }
                table.printstd();
            }
            Output::History(records) if records.is_empty() => {
                println!("No deployments recorded yet.");
            }
            Output::History(records) => {
                let mut table = new_table();
                table.add_row(prettytable::row!["Id", "Template", "Address", "Deployed By", "Created"]);
                for (id, record) in records {
                    table.add_row(prettytable::row![
                        id,
                        record.template,
                        record.address,
                        record.deployed_by,
                        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
                    ]);
                }
                table.printstd();
            }
        }
    }
}
