//! Wire types for the Gemini `generateContent` endpoint.
//!
//! Only the fields the gateway reads or writes are modeled; everything else in
//! the upstream payload is ignored during deserialization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Request body for `POST /v1beta/models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

/// Build a single-turn request carrying `prompt` as the only user part.
pub fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(prompt.to_string()),
            }],
        }],
    }
}

/// Concatenate the text parts of the first candidate.
///
/// Returns an error describing why no text is available: no candidates at all
/// (usually a blocked prompt) or a candidate without text parts.
pub fn extract_text(response: &GenerateContentResponse) -> Result<String, String> {
    let Some(candidate) = response.candidates.first() else {
        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
            .unwrap_or("no candidates returned");
        return Err(format!("Gemini returned no candidates: {reason}"));
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(format!(
            "Gemini candidate contained no text (finish reason: {reason})"
        ));
    }

    Ok(text)
}
