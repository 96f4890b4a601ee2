use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::domain::{OtpVerificationRequest, ProspectSubmission};
use super::provider::OtpProvider;
use super::repository::{ProspectStore, StoreError};
use super::service::{LeadQualificationService, QualificationError, SubmissionOutcome};

const DISQUALIFIED_MESSAGE: &str =
    "Thank you for your interest. Our team will reach out if there is a fit.";
const OTP_SENT_MESSAGE: &str = "OTP sent successfully";
const SEND_FAILED_MESSAGE: &str = "Failed to send OTP. Please try again later.";
const VERIFIED_MESSAGE: &str = "OTP verified successfully";
const SESSION_NOT_FOUND_MESSAGE: &str = "Session not found. Please start over.";
const INVALID_OTP_MESSAGE: &str = "Invalid OTP. Please try again.";
const VERIFY_FAILED_MESSAGE: &str = "Unable to verify OTP right now. Please try again later.";
const UNEXPECTED_MESSAGE: &str = "Something went wrong. Please try again later.";

/// JSON envelope shared by the form endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified: Option<bool>,
    pub message: String,
}

impl LeadResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            qualified: None,
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>, qualified: Option<bool>) -> Self {
        Self {
            success: true,
            qualified,
            message: message.into(),
        }
    }
}

/// Malformed or mistyped bodies keep the JSON envelope and the extractor's status code.
fn rejected_body(rejection: JsonRejection) -> Response {
    (
        rejection.status(),
        Json(LeadResponse::failure(rejection.body_text())),
    )
        .into_response()
}

/// Router builder exposing the prospect form endpoints.
pub fn lead_router<S, P>(service: Arc<LeadQualificationService<S, P>>) -> Router
where
    S: ProspectStore + 'static,
    P: OtpProvider + 'static,
{
    Router::new()
        .route("/send-otp", post(send_otp_handler::<S, P>))
        .route("/verify-otp", post(verify_otp_handler::<S, P>))
        .route("/api/v1/prospects/:phone", get(status_handler::<S, P>))
        .with_state(service)
}

pub(crate) async fn send_otp_handler<S, P>(
    State(service): State<Arc<LeadQualificationService<S, P>>>,
    payload: Result<Json<ProspectSubmission>, JsonRejection>,
) -> Response
where
    S: ProspectStore + 'static,
    P: OtpProvider + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };

    match service.submit(submission).await {
        Ok(SubmissionOutcome::Disqualified(_)) => (
            StatusCode::OK,
            Json(LeadResponse::success(DISQUALIFIED_MESSAGE, Some(false))),
        )
            .into_response(),
        Ok(SubmissionOutcome::OtpSent(_)) => (
            StatusCode::OK,
            Json(LeadResponse::success(OTP_SENT_MESSAGE, Some(true))),
        )
            .into_response(),
        // Form validation failures are reported in-band with a 200.
        Err(QualificationError::Validation(violation)) => (
            StatusCode::OK,
            Json(LeadResponse::failure(violation.to_string())),
        )
            .into_response(),
        Err(QualificationError::Provider(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LeadResponse::failure(SEND_FAILED_MESSAGE)),
        )
            .into_response(),
        Err(other) => {
            error!(error = %other, "prospect submission failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LeadResponse::failure(UNEXPECTED_MESSAGE)),
            )
                .into_response()
        }
    }
}

pub(crate) async fn verify_otp_handler<S, P>(
    State(service): State<Arc<LeadQualificationService<S, P>>>,
    payload: Result<Json<OtpVerificationRequest>, JsonRejection>,
) -> Response
where
    S: ProspectStore + 'static,
    P: OtpProvider + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };

    let (status, body) = match service.verify(request).await {
        Ok(_) => (StatusCode::OK, LeadResponse::success(VERIFIED_MESSAGE, None)),
        Err(QualificationError::Validation(violation)) => (
            StatusCode::BAD_REQUEST,
            LeadResponse::failure(violation.to_string()),
        ),
        Err(QualificationError::SessionNotFound) => (
            StatusCode::BAD_REQUEST,
            LeadResponse::failure(SESSION_NOT_FOUND_MESSAGE),
        ),
        Err(QualificationError::InvalidOtp) => (
            StatusCode::BAD_REQUEST,
            LeadResponse::failure(INVALID_OTP_MESSAGE),
        ),
        Err(QualificationError::Provider(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            LeadResponse::failure(VERIFY_FAILED_MESSAGE),
        ),
        Err(other) => {
            error!(error = %other, "otp verification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                LeadResponse::failure(UNEXPECTED_MESSAGE),
            )
        }
    };

    (status, Json(body)).into_response()
}

pub(crate) async fn status_handler<S, P>(
    State(service): State<Arc<LeadQualificationService<S, P>>>,
    Path(phone): Path<String>,
) -> Response
where
    S: ProspectStore + 'static,
    P: OtpProvider + 'static,
{
    match service.get(&phone) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(QualificationError::Store(StoreError::NotFound)) => (
            StatusCode::NOT_FOUND,
            Json(LeadResponse::failure("prospect not found")),
        )
            .into_response(),
        Err(other) => {
            error!(error = %other, "prospect lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LeadResponse::failure(UNEXPECTED_MESSAGE)),
            )
                .into_response()
        }
    }
}
