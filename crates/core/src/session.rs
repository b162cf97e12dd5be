//! Client session state machine.
//!
//! A [`Session`] owns everything one client session knows: the connected
//! wallet account, the signed-in user, the current generated contract, the
//! last error and the XP counter. Every transition is a plain method; the
//! imperative shell performs the network I/O between a `begin_*` call and the
//! matching `finish_*` call.
//!
//! Per request cycle the phase moves `Idle -> Loading -> Idle`, and a
//! deployment moves `Idle -> Deploying -> Idle`. A new cycle is refused with
//! [`SessionError::Busy`] unless the session is idle, which keeps at most one
//! request in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deploy::DeploymentRecord;
use crate::prompt::ContractRequest;

/// XP awarded for every successful generation.
pub const XP_PER_GENERATION: u64 = 100;

pub const GENERATION_FAILED: &str = "Failed to fetch contract. Please try again later.";
pub const GENERATE_FIRST: &str = "Please generate a contract first";
pub const DEPLOY_FAILED: &str = "Failed to deploy contract. Please check console for details.";
pub const DEPLOY_SUCCEEDED: &str = "Contract deployed successfully!";

/// A signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub display_name: Option<String>,
}

impl User {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Waiting on the gateway for the named template.
    Loading(String),
    Deploying,
}

/// The contract currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub template: String,
    pub contract: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A request is already in progress")]
    Busy,
    #[error("Please generate a contract first")]
    NothingToDeploy,
    #[error("No generation is in progress")]
    NotLoading,
    #[error("No deployment is in progress")]
    NotDeploying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated { template: String, xp: u64 },
    /// `reason` is diagnostic detail for the log, never shown to the user.
    Failed { reason: String },
}

/// Everything a deployment needs, captured when the deployment starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    pub template: String,
    pub contract: String,
    pub account: Option<String>,
}

impl DeployPlan {
    /// Build the store record for a finished deployment.
    ///
    /// The connected account wins over the address the wallet reports as the
    /// sender, matching what the user sees as "their" wallet.
    pub fn record(
        &self,
        address: &str,
        sender: &str,
        created_at: DateTime<Utc>,
    ) -> DeploymentRecord {
        DeploymentRecord {
            template: self.template.clone(),
            address: address.to_string(),
            deployed_by: self.account.clone().unwrap_or_else(|| sender.to_string()),
            created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    account: Option<String>,
    user: Option<User>,
    result: Option<Generated>,
    last_error: Option<String>,
    xp: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            account: None,
            user: None,
            result: None,
            last_error: None,
            xp: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading(_))
    }

    pub fn result(&self) -> Option<&Generated> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Enter `Loading` for `request`. Clears the previous error.
    pub fn begin_generation(&mut self, request: &ContractRequest) -> Result<(), SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::Busy);
        }

        self.phase = Phase::Loading(request.label().to_string());
        self.last_error = None;
        Ok(())
    }

    /// Leave `Loading` with the gateway's answer.
    ///
    /// The loading state is cleared on every path. A success replaces the
    /// displayed contract and awards [`XP_PER_GENERATION`]; a failure (including
    /// an empty contract) keeps the last good contract on display and records
    /// [`GENERATION_FAILED`] as the current error.
    pub fn finish_generation(
        &mut self,
        outcome: Result<String, String>,
    ) -> Result<GenerationOutcome, SessionError> {
        let template = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Loading(template) => template,
            other => {
                self.phase = other;
                return Err(SessionError::NotLoading);
            }
        };

        let outcome = match outcome {
            Ok(contract) if contract.trim().is_empty() => {
                Err("gateway returned an empty contract".to_string())
            }
            other => other,
        };

        match outcome {
            Ok(contract) => {
                self.result = Some(Generated {
                    template: template.clone(),
                    contract,
                });
                self.last_error = None;
                self.xp += XP_PER_GENERATION;
                Ok(GenerationOutcome::Generated {
                    template,
                    xp: self.xp,
                })
            }
            Err(reason) => {
                self.last_error = Some(GENERATION_FAILED.to_string());
                Ok(GenerationOutcome::Failed { reason })
            }
        }
    }

    /// Enter `Deploying` with the current contract.
    ///
    /// Refused with [`SessionError::NothingToDeploy`] before anything else
    /// happens when no contract has been generated yet.
    pub fn begin_deploy(&mut self) -> Result<DeployPlan, SessionError> {
        let Some(generated) = &self.result else {
            return Err(SessionError::NothingToDeploy);
        };

        if self.phase != Phase::Idle {
            return Err(SessionError::Busy);
        }

        let plan = DeployPlan {
            template: generated.template.clone(),
            contract: generated.contract.clone(),
            account: self.account.clone(),
        };
        self.phase = Phase::Deploying;
        Ok(plan)
    }

    /// Leave `Deploying`. `error` is the user-facing notice on failure.
    pub fn finish_deploy(&mut self, error: Option<&str>) -> Result<(), SessionError> {
        if self.phase != Phase::Deploying {
            return Err(SessionError::NotDeploying);
        }

        self.phase = Phase::Idle;
        self.last_error = error.map(str::to_string);
        Ok(())
    }

    pub fn connect_wallet(&mut self, account: String) {
        self.account = Some(account);
    }

    pub fn disconnect_wallet(&mut self) -> Option<String> {
        self.account.take()
    }

    pub fn sign_in(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) -> Option<User> {
        self.user.take()
    }
}
