//! HTTP error mapping
//!
//! Every failure leaves the service as `{"error": code, "message": ..}` plus
//! code-specific detail fields (`expected`, `recent`, `duplicates`, ...).

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use shield_core::ledger::WalletError;
use shield_core::proof::{PayloadError, PayloadIssue};
use shield_core::{CodecError, LedgerError, ProofError, CODEC_ERROR_PREFIX};
use tracing::warn;

use crate::upstream::UpstreamError;

pub const CODE_INVALID_ENCODING: &str = "invalid_encoding";
pub const CODE_INVALID_PAYLOAD: &str = "invalid_payload";
pub const CODE_NEGATIVE_CHANGE: &str = "negative_change";
pub const CODE_MISSING_CHANGE_FIELDS: &str = "missing_change_fields";
pub const CODE_OUTPUT_SET_MISMATCH: &str = "output_set_mismatch";
pub const CODE_UNKNOWN_CIRCUIT: &str = "unknown_circuit";
pub const CODE_UNAUTHORIZED: &str = "unauthorized";
pub const CODE_FEATURE_DISABLED: &str = "feature_disabled";
pub const CODE_MINT_FROZEN: &str = "mint_frozen";
pub const CODE_MINT_NOT_FOUND: &str = "mint_not_found";
pub const CODE_ROOT_MISMATCH: &str = "root_mismatch";
pub const CODE_NULLIFIER_CONFLICT: &str = "nullifier_conflict";
pub const CODE_UNKNOWN_ROOT: &str = "unknown_root";
pub const CODE_NULLIFIER_REUSED: &str = "nullifier_reused";
pub const CODE_UPSTREAM_UNREACHABLE: &str = "upstream_unreachable";
pub const CODE_PROOF_FAILED: &str = "proof_failed";
pub const CODE_PROVER_TIMEOUT: &str = "prover_timeout";
pub const CODE_INTERNAL: &str = "internal_error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Map<String, Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::bad_request(CODE_INVALID_PAYLOAD, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, CODE_UNAUTHORIZED, "missing or invalid credentials")
    }

    pub fn mint_not_found(mint: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, CODE_MINT_NOT_FOUND, format!("mint {mint} not found"))
            .with("mint", json!(mint))
    }

    pub fn internal(err: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, CODE_INTERNAL, err)
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = self.details;
        body.insert("error".into(), json!(self.code));
        body.insert("message".into(), json!(self.message));
        (self.status, Json(Value::Object(body))).into_response()
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        ApiError::bad_request(CODE_INVALID_ENCODING, err.to_string())
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        let code = if err.is_encoding() {
            CODE_INVALID_ENCODING
        } else {
            CODE_INVALID_PAYLOAD
        };
        let issue = match &err.issue {
            PayloadIssue::Missing => "missing",
            PayloadIssue::WrongType(_) => "wrong_type",
            PayloadIssue::Encoding(_) => "encoding",
            PayloadIssue::TooFew(_) => "too_few",
            PayloadIssue::TooMany(_) => "too_many",
            PayloadIssue::NotInSet(_) => "not_in_set",
            PayloadIssue::OutOfRange => "out_of_range",
        };
        ApiError::bad_request(code, err.to_string())
            .with("field", json!(err.field))
            .with("issue", json!(issue))
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        ApiError::invalid_payload(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::MintNotFound(mint) => ApiError::mint_not_found(&mint),
            LedgerError::InvalidMint => ApiError::invalid_payload(message),
            LedgerError::RootMismatch { expected, recent } => {
                ApiError::new(StatusCode::CONFLICT, CODE_ROOT_MISMATCH, message)
                    .with("expected", json!(expected))
                    .with("recent", json!(recent))
            }
            LedgerError::NullifierConflict { duplicates } => {
                ApiError::new(StatusCode::CONFLICT, CODE_NULLIFIER_CONFLICT, message)
                    .with("duplicates", json!(duplicates))
            }
            LedgerError::OutputSetMismatch {
                commitments,
                amount_commitments,
            } => ApiError::bad_request(CODE_OUTPUT_SET_MISMATCH, message)
                .with("commitments", json!(commitments))
                .with("amountCommitments", json!(amount_commitments)),
            LedgerError::MintFrozen(mint) => ApiError::new(StatusCode::FORBIDDEN, CODE_MINT_FROZEN, message)
                .with("mint", json!(mint)),
        }
    }
}

impl From<ProofError> for ApiError {
    fn from(err: ProofError) -> Self {
        let message = err.to_string();
        if !err.is_client_error() {
            warn!(error = %message, "proof pipeline failed");
        }
        match err {
            ProofError::InvalidPayload(e) => e.into(),
            ProofError::NegativeChange { note_amount, required } => {
                ApiError::bad_request(CODE_NEGATIVE_CHANGE, message)
                    .with("noteAmount", json!(note_amount.to_string()))
                    .with("required", json!(required.to_string()))
            }
            ProofError::MissingChangeFields(fields) => {
                ApiError::bad_request(CODE_MISSING_CHANGE_FIELDS, message).with("fields", json!(fields))
            }
            ProofError::UnknownRoot {
                claimed,
                expected,
                recent,
            } => ApiError::new(StatusCode::CONFLICT, CODE_UNKNOWN_ROOT, message)
                .with("claimed", json!(claimed))
                .with("expected", json!(expected))
                .with("recent", json!(recent)),
            ProofError::NullifierReused { duplicates } => {
                ApiError::new(StatusCode::CONFLICT, CODE_NULLIFIER_REUSED, message)
                    .with("duplicates", json!(duplicates))
            }
            ProofError::MintNotFound(mint) => ApiError::mint_not_found(&mint),
            ProofError::MintFrozen(mint) => {
                ApiError::new(StatusCode::FORBIDDEN, CODE_MINT_FROZEN, message).with("mint", json!(mint))
            }
            ProofError::FeatureDisabled { mint, feature } => {
                ApiError::new(StatusCode::FORBIDDEN, CODE_FEATURE_DISABLED, message)
                    .with("mint", json!(mint))
                    .with("feature", json!(feature))
            }
            ProofError::ProverTimeout(_) => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, CODE_PROVER_TIMEOUT, message)
            }
            ProofError::ProverFailure(_) | ProofError::Derivation(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, CODE_PROOF_FAILED, message)
            }
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Ledger(e) => e.into(),
            other => ApiError::new(StatusCode::BAD_GATEWAY, CODE_UPSTREAM_UNREACHABLE, other.to_string()),
        }
    }
}

/// `Json` extractor whose rejections use the service's error body
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let message = rejection.body_text();
    if message.contains(CODEC_ERROR_PREFIX) {
        ApiError::bad_request(CODE_INVALID_ENCODING, message)
    } else {
        ApiError::invalid_payload(message)
    }
}
