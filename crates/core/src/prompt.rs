use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Rejections for request bodies that fail boundary validation.
///
/// The `Display` text is what the gateway returns in its `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("templateName is required")]
    MissingTemplateName,
    #[error("name and type are required")]
    MissingCustomFields,
}

/// A validated request to draft a contract for a named template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    template_name: String,
}

impl GenerationRequest {
    pub fn new(template_name: &str) -> Result<Self, ValidationError> {
        non_blank(template_name)
            .map(|name| Self {
                template_name: name.to_string(),
            })
            .ok_or(ValidationError::MissingTemplateName)
    }

    /// Validate an untyped JSON body of the form `{"templateName": string}`.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let name = string_field(body, "templateName").ok_or(ValidationError::MissingTemplateName)?;
        Self::new(name)
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }
}

/// A validated request for a contract described by the custom contract form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomContractRequest {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    requirements: Option<String>,
}

impl CustomContractRequest {
    pub fn new(
        name: &str,
        kind: &str,
        requirements: Option<&str>,
    ) -> Result<Self, ValidationError> {
        match (non_blank(name), non_blank(kind)) {
            (Some(name), Some(kind)) => Ok(Self {
                name: name.to_string(),
                kind: kind.to_string(),
                requirements: requirements.and_then(non_blank).map(str::to_string),
            }),
            _ => Err(ValidationError::MissingCustomFields),
        }
    }

    /// Validate an untyped JSON body of the form
    /// `{"name": string, "type": string, "requirements": string?}`.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let name = string_field(body, "name").ok_or(ValidationError::MissingCustomFields)?;
        let kind = string_field(body, "type").ok_or(ValidationError::MissingCustomFields)?;
        Self::new(name, kind, string_field(body, "requirements"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn requirements(&self) -> Option<&str> {
        self.requirements.as_deref()
    }
}

/// Anything the client can ask the gateway to draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractRequest {
    Template(GenerationRequest),
    Custom(CustomContractRequest),
}

impl ContractRequest {
    /// The name recorded against a generated contract.
    pub fn label(&self) -> &str {
        match self {
            ContractRequest::Template(request) => request.template_name(),
            ContractRequest::Custom(request) => request.name(),
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            ContractRequest::Template(request) => build_prompt(request),
            ContractRequest::Custom(request) => build_custom_prompt(request),
        }
    }
}

impl From<GenerationRequest> for ContractRequest {
    fn from(request: GenerationRequest) -> Self {
        ContractRequest::Template(request)
    }
}

impl From<CustomContractRequest> for ContractRequest {
    fn from(request: CustomContractRequest) -> Self {
        ContractRequest::Custom(request)
    }
}

/// Build the completion prompt for a template request.
pub fn build_prompt(request: &GenerationRequest) -> String {
    format!(
        "Generate a solidity smart contract for {}",
        request.template_name()
    )
}

/// Build the completion prompt for a custom contract request.
pub fn build_custom_prompt(request: &CustomContractRequest) -> String {
    let mut prompt = format!(
        "Generate a solidity smart contract named {} of type {}",
        request.name(),
        request.kind()
    );

    if let Some(requirements) = request.requirements() {
        prompt.push_str(". Requirements: ");
        prompt.push_str(requirements);
    }

    prompt
}

fn string_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
