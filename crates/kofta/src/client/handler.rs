//! Command dispatch for the template client.
//!
//! Every user action arrives as a [`Command`] and is applied to one explicit
//! [`Session`]. Collaborator failures are caught here and turned into
//! [`Output::Alert`] notices; nothing propagates past this module.

use super::gateway::Generator;
use crate::prelude::*;
use crate::store::{AuthProvider, DeploymentStore};
use crate::wallet::{Wallet, NO_ACCOUNT};
use chrono::Utc;
use kofta_core::command::{Command, HELP};
use kofta_core::deploy::DeploymentRecord;
use kofta_core::prompt::ContractRequest;
use kofta_core::session::{
    DeployPlan, GenerationOutcome, Session, DEPLOY_FAILED, DEPLOY_SUCCEEDED, GENERATION_FAILED,
    XP_PER_GENERATION,
};

pub const INSTALL_WALLET: &str =
    "Please connect a wallet provider (--rpc-url or KOFTA_RPC_URL)!";

/// What the user should see after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Line(String),
    Success(String),
    Alert(String),
    Contract { template: String, contract: String },
    Templates,
    History(Vec<(i64, DeploymentRecord)>),
}

/// The client's collaborators. `wallet` is `None` when no provider is
/// configured.
pub struct Client<G, W, S> {
    pub gateway: G,
    pub wallet: Option<W>,
    pub store: S,
}

impl<G, W, S> Client<G, W, S>
where
    G: Generator,
    W: Wallet,
    S: DeploymentStore + AuthProvider,
{
    pub async fn dispatch(&self, session: &mut Session, command: Command) -> Vec<Output> {
        match command {
            Command::Templates => vec![Output::Templates],
            Command::Generate(request) => request_contract(&self.gateway, session, request).await,
            Command::Show => match session.result() {
                Some(generated) => vec![Output::Contract {
                    template: generated.template.clone(),
                    contract: generated.contract.clone(),
                }],
                None => vec![Output::Line("No contract generated yet.".to_string())],
            },
            Command::Xp => vec![
                Output::Line(f!("Current XP: {}", session.xp())),
                Output::Line("Point redeem feature coming soon!".to_string()),
            ],
            Command::Connect => self.connect_wallet(session).await,
            Command::Disconnect => match session.disconnect_wallet() {
                Some(account) => vec![Output::Line(f!("Wallet {account} disconnected."))],
                None => vec![Output::Line("No wallet connected.".to_string())],
            },
            Command::Wallet => match session.account() {
                Some(account) => vec![Output::Line(f!("Account: {account}"))],
                None => vec![Output::Line("No wallet connected.".to_string())],
            },
            Command::Login {
                email,
                display_name,
            } => self.sign_in(session, &email, display_name.as_deref()),
            Command::Logout => self.sign_out(session),
            Command::WhoAmI => match session.user() {
                Some(user) => vec![Output::Line(f!("Signed in as {} <{}>", user.label(), user.email))],
                None => vec![Output::Line("Not signed in.".to_string())],
            },
            Command::Deploy => deploy_contract(self.wallet.as_ref(), &self.store, session).await,
            Command::History => match self.store.list() {
                Ok(records) => vec![Output::History(records)],
                Err(err) => {
                    log::error!("Error reading deployments: {err}");
                    vec![Output::Alert("Failed to load deployments.".to_string())]
                }
            },
            Command::Help => vec![Output::Line(HELP.to_string())],
            Command::Quit => Vec::new(),
        }
    }

    async fn connect_wallet(&self, session: &mut Session) -> Vec<Output> {
        let Some(wallet) = &self.wallet else {
            return vec![Output::Alert(INSTALL_WALLET.to_string())];
        };

        match wallet.accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    session.connect_wallet(account.clone());
                    vec![Output::Success(f!("Wallet connected: {account}"))]
                }
                None => vec![Output::Alert(NO_ACCOUNT.to_string())],
            },
            Err(err) => {
                log::error!("Failed to connect to wallet: {err}");
                vec![Output::Alert("Failed to connect to wallet.".to_string())]
            }
        }
    }

    fn sign_in(&self, session: &mut Session, email: &str, display_name: Option<&str>) -> Vec<Output> {
        match self.store.sign_in(email, display_name) {
            Ok(user) => {
                let line = f!("Signed in as {}", user.label());
                session.sign_in(user);
                vec![Output::Success(line)]
            }
            Err(err) => {
                log::error!("Error signing in: {err}");
                vec![Output::Alert("Failed to sign in.".to_string())]
            }
        }
    }

    fn sign_out(&self, session: &mut Session) -> Vec<Output> {
        match self.store.sign_out() {
            Ok(()) => {
                session.sign_out();
                vec![Output::Line("Signed out.".to_string())]
            }
            Err(err) => {
                log::error!("Error signing out: {err}");
                vec![Output::Alert("Failed to sign out.".to_string())]
            }
        }
    }
}

/// Run one generation cycle: `Loading`, one gateway call, then back to idle
/// whatever the outcome.
pub async fn request_contract<G: Generator>(
    gateway: &G,
    session: &mut Session,
    request: ContractRequest,
) -> Vec<Output> {
    if let Err(err) = session.begin_generation(&request) {
        return vec![Output::Alert(err.to_string())];
    }

    let outcome = gateway.generate(&request).await.map_err(|e| e.to_string());

    match session.finish_generation(outcome) {
        Ok(GenerationOutcome::Generated { template, xp }) => {
            let contract = session
                .result()
                .map(|generated| generated.contract.clone())
                .unwrap_or_default();
            log::debug!("Received contract for '{template}' ({} chars)", contract.len());
            vec![
                Output::Contract { template, contract },
                Output::Success(f!("+{XP_PER_GENERATION} XP (total {xp})")),
            ]
        }
        Ok(GenerationOutcome::Failed { reason }) => {
            log::error!("Error fetching contract: {reason}");
            vec![Output::Alert(GENERATION_FAILED.to_string())]
        }
        Err(err) => vec![Output::Alert(err.to_string())],
    }
}

/// Deploy the current contract and record it.
///
/// Refused before any collaborator is touched when nothing has been generated.
/// A deployment whose record cannot be stored stays on-chain; the address is
/// logged so it can be recorded by hand.
pub async fn deploy_contract<W: Wallet, S: DeploymentStore>(
    wallet: Option<&W>,
    store: &S,
    session: &mut Session,
) -> Vec<Output> {
    let plan = match session.begin_deploy() {
        Ok(plan) => plan,
        Err(err) => return vec![Output::Alert(err.to_string())],
    };

    let (error, outputs) = match deploy_and_record(wallet, store, &plan).await {
        Ok(record) => (
            None,
            vec![
                Output::Success(DEPLOY_SUCCEEDED.to_string()),
                Output::Line(f!("Contract deployed to: {}", record.address)),
            ],
        ),
        Err(err) => {
            log::error!("Error deploying contract: {err}");
            (
                Some(DEPLOY_FAILED),
                vec![Output::Alert(DEPLOY_FAILED.to_string())],
            )
        }
    };

    if let Err(err) = session.finish_deploy(error) {
        log::error!("Deploy finished out of order: {err}");
    }

    outputs
}

async fn deploy_and_record<W: Wallet, S: DeploymentStore>(
    wallet: Option<&W>,
    store: &S,
    plan: &DeployPlan,
) -> Result<DeploymentRecord, Error> {
    let wallet = wallet.ok_or_else(|| Error::Wallet(INSTALL_WALLET.to_string()))?;
    let deployment = wallet.deploy(&plan.contract).await?;
    log::info!("Contract deployed to: {}", deployment.address);

    let record = plan.record(&deployment.address, &deployment.sender, Utc::now());
    store.add(&record).map_err(|err| {
        log::error!(
            "Contract at {} is deployed but was not recorded: {err}",
            record.address
        );
        err
    })?;

    Ok(record)
}
