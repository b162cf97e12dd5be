use crate::prelude::*;
use kofta_core::deploy::{extract_source, parse_solc_binaries, select_deployable};
use kofta_core::rpc::{self, JsonRpcResponse};
use serde_json::{json, Value};
use std::future::Future;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

pub const NO_ACCOUNT: &str = "No wallet account available";

/// A contract that made it on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: String,
    /// The account that sent the creation transaction.
    pub sender: String,
}

/// Account listing and contract deployment, the two things the client needs
/// from a wallet.
pub trait Wallet: Send + Sync {
    fn accounts(&self) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    fn deploy(&self, source: &str) -> impl Future<Output = Result<Deployment, Error>> + Send;
}

/// Turns Solidity source into hex creation bytecode.
pub trait Compiler: Send + Sync {
    fn compile(&self, source: &str) -> impl Future<Output = Result<String, Error>> + Send;
}

/// Compiles with a local `solc` binary.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    program: String,
}

impl SolcCompiler {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Compiler for SolcCompiler {
    async fn compile(&self, source: &str) -> Result<String, Error> {
        let source = extract_source(source);
        if source.is_empty() {
            return Err(Error::Compile("No Solidity source to compile".to_string()));
        }

        let mut child = tokio::process::Command::new(&self.program)
            .args(["--bin", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Compile(f!("Failed to run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .await
                .map_err(|e| Error::Compile(f!("Failed to write source to {}: {}", self.program, e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Compile(f!("Failed to wait for {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(Error::Compile(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let contracts = parse_solc_binaries(&stdout);
        let contract = select_deployable(&contracts)
            .ok_or_else(|| Error::Compile("No deployable contract in source".to_string()))?;

        log::debug!(
            "Compiled {} ({} bytes of bytecode)",
            contract.name,
            contract.bytecode.len() / 2
        );

        Ok(contract.bytecode.clone())
    }
}

/// A wallet backed by a JSON-RPC node that holds unlocked accounts, such as a
/// local development node.
#[derive(Debug)]
pub struct RpcWallet<C> {
    http: reqwest::Client,
    url: String,
    compiler: C,
    next_id: AtomicU64,
    poll_interval: Duration,
    max_polls: u32,
}

impl<C: Compiler> RpcWallet<C> {
    pub fn new(url: &str, compiler: C) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            compiler,
            next_id: AtomicU64::new(1),
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
        }
    }

    /// Tune how receipts are awaited after the creation transaction is sent.
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::debug!("JSON-RPC {method} (id {id})");

        let response = self
            .http
            .post(&self.url)
            .json(&rpc::request(id, method, params))
            .send()
            .await
            .map_err(|e| Error::Wallet(f!("{method} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Wallet(f!(
                "{method} returned status {}",
                response.status()
            )));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| Error::Wallet(f!("Invalid {method} response: {e}")))?;

        rpc::into_result(body).map_err(Error::Wallet)
    }
}

impl<C: Compiler> Wallet for RpcWallet<C> {
    async fn accounts(&self) -> Result<Vec<String>, Error> {
        let result = self.call("eth_accounts", json!([])).await?;
        rpc::parse_accounts(&result).map_err(Error::Wallet)
    }

    async fn deploy(&self, source: &str) -> Result<Deployment, Error> {
        let sender = self
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Wallet(NO_ACCOUNT.to_string()))?;

        let bytecode = self.compiler.compile(source).await?;

        let tx_hash = self
            .call("eth_sendTransaction", rpc::deploy_params(&sender, &bytecode))
            .await?;
        let tx_hash = tx_hash
            .as_str()
            .ok_or_else(|| Error::Wallet(f!("Unexpected transaction hash: {tx_hash}")))?
            .to_string();

        log::info!("Deploying contract in transaction {tx_hash}");

        for _ in 0..self.max_polls {
            let receipt = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if let Some(address) = rpc::receipt_contract_address(&receipt).map_err(Error::Wallet)? {
                return Ok(Deployment { address, sender });
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(Error::Wallet(f!(
            "Transaction {tx_hash} was not mined after {} polls",
            self.max_polls
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    struct FixedCompiler(&'static str);

    impl Compiler for FixedCompiler {
        async fn compile(&self, _source: &str) -> Result<String, Error> {
            Ok(self.0.to_string())
        }
    }

    fn wallet(server: &mockito::ServerGuard) -> RpcWallet<FixedCompiler> {
        RpcWallet::new(&server.url(), FixedCompiler("6080"))
            .with_polling(Duration::from_millis(1), 3)
    }

    async fn mock_method(
        server: &mut mockito::ServerGuard,
        method: &str,
        result: Value,
    ) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": method})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_accounts() {
        let mut server = mockito::Server::new_async().await;
        let _accounts = mock_method(&mut server, "eth_accounts", json!(["0xabc"])).await;

        let accounts = wallet(&server).accounts().await.unwrap();
        assert_eq!(accounts, vec!["0xabc".to_string()]);
    }

    #[tokio::test]
    async fn test_deploy_sends_bytecode_and_reads_receipt() {
        let mut server = mockito::Server::new_async().await;
        let _accounts = mock_method(&mut server, "eth_accounts", json!(["0xabc"])).await;
        let send = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_sendTransaction",
                "params": [{"from": "0xabc", "data": "0x6080"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 2, "result": "0xfeed"}).to_string())
            .expect(1)
            .create_async()
            .await;
        let _receipt = mock_method(
            &mut server,
            "eth_getTransactionReceipt",
            json!({"status": "0x1", "contractAddress": "0xc0ffee"}),
        )
        .await;

        let deployment = wallet(&server)
            .deploy("pragma solidity ^0.8.0; contract ERC20 {}")
            .await
            .unwrap();

        assert_eq!(
            deployment,
            Deployment {
                address: "0xc0ffee".to_string(),
                sender: "0xabc".to_string()
            }
        );
        send.assert_async().await;
    }

    #[tokio::test]
    async fn test_deploy_without_accounts_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _accounts = mock_method(&mut server, "eth_accounts", json!([])).await;
        let send = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_sendTransaction"})))
            .expect(0)
            .create_async()
            .await;

        let err = wallet(&server).deploy("contract A {}").await.unwrap_err();
        assert_eq!(err, Error::Wallet(NO_ACCOUNT.to_string()));
        send.assert_async().await;
    }

    #[tokio::test]
    async fn test_deploy_rejected_by_wallet() {
        let mut server = mockito::Server::new_async().await;
        let _accounts = mock_method(&mut server, "eth_accounts", json!(["0xabc"])).await;
        let _send = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_sendTransaction"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"jsonrpc": "2.0", "id": 2, "error": {"code": 4001, "message": "User rejected the request."}})
                    .to_string(),
            )
            .create_async()
            .await;

        let err = wallet(&server).deploy("contract A {}").await.unwrap_err();
        assert_eq!(
            err,
            Error::Wallet("JSON-RPC error 4001: User rejected the request.".to_string())
        );
    }

    #[tokio::test]
    async fn test_deploy_gives_up_when_never_mined() {
        let mut server = mockito::Server::new_async().await;
        let _accounts = mock_method(&mut server, "eth_accounts", json!(["0xabc"])).await;
        let _send = mock_method(&mut server, "eth_sendTransaction", json!("0xfeed")).await;
        let receipt = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_getTransactionReceipt"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 3, "result": null}).to_string())
            .expect(3)
            .create_async()
            .await;

        let err = wallet(&server).deploy("contract A {}").await.unwrap_err();
        assert!(matches!(err, Error::Wallet(ref detail) if detail.contains("not mined")));
        receipt.assert_async().await;
    }

    #[tokio::test]
    async fn test_solc_missing_binary_is_a_compile_error() {
        let compiler = SolcCompiler::new("kofta-no-such-solc");
        let err = compiler.compile("contract A {}").await.unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
    }
}
