//! Ethereum JSON-RPC 2.0 envelopes and result readers.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

pub fn request(id: u64, method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id,
        method: method.to_string(),
        params,
    }
}

/// `eth_sendTransaction` params for a contract creation from `from`.
pub fn deploy_params(from: &str, bytecode: &str) -> Value {
    let data = if bytecode.starts_with("0x") {
        bytecode.to_string()
    } else {
        format!("0x{bytecode}")
    };

    json!([{ "from": from, "data": data }])
}

/// Unwrap a response into its `result`, or describe the failure.
///
/// A JSON `null` result is returned as `Value::Null`; callers that poll (for
/// example receipts) treat that as "not yet".
pub fn into_result(response: JsonRpcResponse) -> Result<Value, String> {
    if let Some(error) = response.error {
        return Err(format!("JSON-RPC error {}: {}", error.code, error.message));
    }

    Ok(response.result.unwrap_or(Value::Null))
}

/// Read an `eth_accounts` result.
pub fn parse_accounts(result: &Value) -> Result<Vec<String>, String> {
    let accounts = result
        .as_array()
        .ok_or_else(|| format!("expected an account list, got {result}"))?;

    Ok(accounts
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

/// Read the contract address out of an `eth_getTransactionReceipt` result.
///
/// `Ok(None)` means the transaction is still pending. A mined receipt with a
/// failed status is an error.
pub fn receipt_contract_address(receipt: &Value) -> Result<Option<String>, String> {
    if receipt.is_null() {
        return Ok(None);
    }

    if receipt.get("status").and_then(Value::as_str) == Some("0x0") {
        return Err("contract creation transaction reverted".to_string());
    }

    match receipt.get("contractAddress").and_then(Value::as_str) {
        Some(address) => Ok(Some(address.to_string())),
        None => Err("receipt has no contract address".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope() {
        let value = serde_json::to_value(request(7, "eth_accounts", json!([]))).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_accounts", "params": []})
        );
    }

    #[test]
    fn test_deploy_params_prefixes_bytecode() {
        assert_eq!(
            deploy_params("0xabc", "6080"),
            json!([{"from": "0xabc", "data": "0x6080"}])
        );
        assert_eq!(
            deploy_params("0xabc", "0x6080"),
            json!([{"from": "0xabc", "data": "0x6080"}])
        );
    }

    #[test]
    fn test_into_result_error() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 4001, "message": "User rejected the request."}
        }))
        .unwrap();

        assert_eq!(
            into_result(response).unwrap_err(),
            "JSON-RPC error 4001: User rejected the request."
        );
    }

    #[test]
    fn test_parse_accounts() {
        assert_eq!(
            parse_accounts(&json!(["0xabc", "0xdef"])).unwrap(),
            vec!["0xabc".to_string(), "0xdef".to_string()]
        );
        assert!(parse_accounts(&json!([])).unwrap().is_empty());
        assert!(parse_accounts(&json!("0xabc")).is_err());
    }

    #[test]
    fn test_receipt_pending() {
        assert_eq!(receipt_contract_address(&Value::Null), Ok(None));
    }

    #[test]
    fn test_receipt_mined() {
        let receipt = json!({"status": "0x1", "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3"});
        assert_eq!(
            receipt_contract_address(&receipt),
            Ok(Some("0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string()))
        );
    }

    #[test]
    fn test_receipt_reverted() {
        let receipt = json!({"status": "0x0", "contractAddress": null});
        assert!(receipt_contract_address(&receipt).is_err());
    }
}
