//! Prospect qualification and SMS OTP verification.
//!
//! A submission is validated, checked against the revenue-tier rule, and either parked as a
//! `BadLead` or handed to the OTP provider. The follow-up verification promotes the prospect to
//! `Lead` or marks it `BadLead` depending on the provider's answer.

pub mod domain;
pub mod intake;
pub mod policy;
pub mod provider;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    OtpVerificationRequest, ProspectRecord, ProspectStatus, ProspectStatusView,
    ProspectSubmission, SessionId,
};
pub use intake::{IntakeGuard, IntakeViolation};
pub use policy::{QualificationDecision, QualificationPolicy};
pub use provider::{OtpProvider, OtpSession, OtpVerification, ProviderError, TwoFactorClient};
pub use repository::{InMemoryProspectStore, ProspectStore, StoreError};
pub use router::{lead_router, LeadResponse};
pub use service::{LeadQualificationService, QualificationError, SubmissionOutcome};
