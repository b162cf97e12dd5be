use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deployed contract as stored in the `contracts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub template: String,
    pub address: String,
    pub deployed_by: String,
    pub created_at: DateTime<Utc>,
}

/// Compiled output for one contract in a Solidity source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledContract {
    pub name: String,
    /// Hex-encoded creation bytecode without a `0x` prefix.
    pub bytecode: String,
}

/// Lines that open a Solidity source unit, most specific first.
const SOURCE_STARTERS: [&str; 9] = [
    "// SPDX",
    "pragma ",
    "import ",
    "contract ",
    "abstract ",
    "interface ",
    "library ",
    "//",
    "/*",
];

/// Extract Solidity source from a model response.
///
/// Generated text is stored and displayed verbatim; this is only applied on
/// the way to the compiler. Strips markdown fences and the commentary around
/// the code. Starters only count at the beginning of a line, so prose that
/// mentions "the contract" is never mistaken for source.
pub fn extract_source(response: &str) -> String {
    let trimmed = response.trim();

    if trimmed.is_empty() {
        return String::new();
    }

    let mut text = trimmed;
    let mut closed_fence = false;

    // Prefer the body of the first fenced block when one is present
    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
        let body = &after_fence[body_start..];
        text = match body.find("```") {
            Some(end) => {
                closed_fence = true;
                &body[..end]
            }
            None => body,
        };
    }

    if let Some(pos) = SOURCE_STARTERS
        .iter()
        .find_map(|starter| line_starting_with(text, starter))
    {
        text = &text[pos..];
    }

    // Without a closing fence nothing marks the end of the code
    if !closed_fence {
        if let Some(end) = text.rfind('}') {
            text = &text[..=end];
        }
    }

    text.trim().to_string()
}

/// Byte offset of the first line whose content begins with `starter`.
fn line_starting_with(text: &str, starter: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_start();
        if content.starts_with(starter) {
            return Some(offset + line.len() - content.len());
        }
        offset += line.len();
    }
    None
}

/// Parse the output of `solc --bin` into its compiled contracts.
///
/// The compiler prints one block per contract:
///
/// ```text
/// ======= <stdin>:Token =======
/// Binary:
/// 6080604052...
/// ```
///
/// Interfaces and abstract contracts produce an empty binary line; those are
/// returned with an empty `bytecode`.
pub fn parse_solc_binaries(output: &str) -> Vec<CompiledContract> {
    let mut contracts = Vec::new();
    let mut lines = output.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.trim();
        let Some(header) = line
            .strip_prefix("=======")
            .and_then(|rest| rest.strip_suffix("======="))
        else {
            continue;
        };

        let name = header
            .trim()
            .rsplit(':')
            .next()
            .unwrap_or_default()
            .to_string();

        let mut bytecode = String::new();
        while let Some(next) = lines.peek() {
            let next = next.trim();
            if next.starts_with("=======") {
                break;
            }
            lines.next();
            if next.is_empty() || next.ends_with(':') {
                continue;
            }
            bytecode = next.to_string();
        }

        contracts.push(CompiledContract { name, bytecode });
    }

    contracts
}

/// Pick the contract to deploy from a compiled source unit.
///
/// Generated sources usually declare helpers and interfaces first and the main
/// contract last, so the last contract with creation bytecode wins.
pub fn select_deployable(contracts: &[CompiledContract]) -> Option<&CompiledContract> {
    contracts
        .iter()
        .rev()
        .find(|contract| !contract.bytecode.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_camel_case() {
        let record = DeploymentRecord {
            template: "ERC20 Token".to_string(),
            address: "0xdef".to_string(),
            deployed_by: "0xabc".to_string(),
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["deployedBy"], "0xabc");
        assert_eq!(value["createdAt"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_extract_source_plain_passes_through() {
        let source = "pragma solidity ^0.8.0;\ncontract ERC20 {}";
        assert_eq!(extract_source(source), source);
    }

    #[test]
    fn test_extract_source_strips_fence_and_commentary() {
        let response = "Here is your contract:\n\n```solidity\n// SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\ncontract Token {}\n```\n\nThis contract implements...";
        assert_eq!(
            extract_source(response),
            "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\ncontract Token {}"
        );
    }

    #[test]
    fn test_extract_source_unclosed_fence() {
        let response = "```\npragma solidity ^0.8.0;\ncontract Token {}";
        assert_eq!(
            extract_source(response),
            "pragma solidity ^0.8.0;\ncontract Token {}"
        );
    }

    #[test]
    fn test_extract_source_ignores_starter_words_in_prose() {
        let response = "Here is the contract you asked for:\n\npragma solidity ^0.8.0;\ncontract A {}";
        assert_eq!(
            extract_source(response),
            "pragma solidity ^0.8.0;\ncontract A {}"
        );
    }

    #[test]
    fn test_extract_source_prefers_license_line() {
        let response = "This library of helpers:\n  // SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\nlibrary Math {}";
        assert_eq!(
            extract_source(response),
            "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.0;\nlibrary Math {}"
        );
    }

    #[test]
    fn test_extract_source_drops_trailing_commentary_without_fence() {
        let response = "pragma solidity ^0.8.0;\ncontract A {\n    uint256 value;\n}\n\nThis contract stores a value.";
        assert_eq!(
            extract_source(response),
            "pragma solidity ^0.8.0;\ncontract A {\n    uint256 value;\n}"
        );
    }

    #[test]
    fn test_extract_source_empty() {
        assert_eq!(extract_source(" \n "), "");
    }

    #[test]
    fn test_parse_solc_binaries() {
        let output = "\n======= <stdin>:IERC20 =======\nBinary:\n\n======= <stdin>:Token =======\nBinary:\n6080604052348015600f57600080fd5b50\n";
        let contracts = parse_solc_binaries(output);

        assert_eq!(
            contracts,
            vec![
                CompiledContract {
                    name: "IERC20".to_string(),
                    bytecode: String::new()
                },
                CompiledContract {
                    name: "Token".to_string(),
                    bytecode: "6080604052348015600f57600080fd5b50".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_select_deployable_prefers_last_with_bytecode() {
        let contracts = vec![
            CompiledContract {
                name: "SafeMath".to_string(),
                bytecode: "60aa".to_string(),
            },
            CompiledContract {
                name: "Token".to_string(),
                bytecode: "60bb".to_string(),
            },
            CompiledContract {
                name: "IToken".to_string(),
                bytecode: String::new(),
            },
        ];

        assert_eq!(select_deployable(&contracts).unwrap().name, "Token");
        assert!(select_deployable(&[]).is_none());
    }
}
