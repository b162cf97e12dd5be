use super::completion::{self, CompletionModel};
use crate::prelude::*;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use kofta_core::prompt::{CustomContractRequest, GenerationRequest, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// The only upstream failure message callers ever see.
pub const UPSTREAM_FAILURE: &str = "Failed to fetch contract. Please try again later.";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ContractResponse {
    pub contract: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router<M: CompletionModel>(model: M) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generateContract", post(generate_contract::<M>))
        .route("/createCustomContract", post(create_custom_contract::<M>))
        .layer(cors)
        .with_state(Arc::new(model))
}

async fn generate_contract<M: CompletionModel>(
    State(model): State<Arc<M>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ContractResponse>, Error> {
    let request = validate(payload, GenerationRequest::from_json)?;
    let contract = completion::generate(model.as_ref(), &request.into()).await?;
    Ok(Json(ContractResponse { contract }))
}

async fn create_custom_contract<M: CompletionModel>(
    State(model): State<Arc<M>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ContractResponse>, Error> {
    let request = validate(payload, CustomContractRequest::from_json)?;
    let contract = completion::generate(model.as_ref(), &request.into()).await?;
    Ok(Json(ContractResponse { contract }))
}

/// Check the body once at the boundary. Unparseable JSON counts as a missing
/// field, so every malformed request gets the same 400 body.
fn validate<T>(
    payload: Result<Json<Value>, JsonRejection>,
    parse: impl FnOnce(&Value) -> Result<T, ValidationError>,
) -> Result<T, Error> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            log::debug!("Rejected request body: {rejection}");
            Value::Null
        }
    };

    parse(&body).map_err(Error::from)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message),
            other => {
                log::error!("Error fetching contract: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UPSTREAM_FAILURE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
