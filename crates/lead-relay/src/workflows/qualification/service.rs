use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};

use super::domain::{OtpVerificationRequest, ProspectRecord, ProspectStatus, ProspectSubmission};
use super::intake::{IntakeGuard, IntakeViolation};
use super::policy::{QualificationDecision, QualificationPolicy};
use super::provider::{OtpProvider, OtpVerification, ProviderError};
use super::repository::{ProspectStore, StoreError};
use crate::config::QualificationConfig;
use crate::telemetry::mask_phone;

/// Service composing intake validation, the revenue rule, the OTP provider, and the store.
pub struct LeadQualificationService<S, P> {
    guard: IntakeGuard,
    policy: QualificationPolicy,
    store: Arc<S>,
    provider: Arc<P>,
    locks: PhoneLocks,
}

/// What happened to an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Disqualified(ProspectRecord),
    OtpSent(ProspectRecord),
}

impl SubmissionOutcome {
    pub fn is_qualified(&self) -> bool {
        matches!(self, SubmissionOutcome::OtpSent(_))
    }

    pub fn record(&self) -> &ProspectRecord {
        match self {
            SubmissionOutcome::Disqualified(record) | SubmissionOutcome::OtpSent(record) => record,
        }
    }
}

impl<S, P> LeadQualificationService<S, P>
where
    S: ProspectStore + 'static,
    P: OtpProvider + 'static,
{
    pub fn new(store: Arc<S>, provider: Arc<P>, config: &QualificationConfig) -> Self {
        Self::with_policy(QualificationPolicy::from(config), store, provider)
    }

    pub fn with_policy(policy: QualificationPolicy, store: Arc<S>, provider: Arc<P>) -> Self {
        Self {
            guard: IntakeGuard,
            policy,
            store,
            provider,
            locks: PhoneLocks::default(),
        }
    }

    /// Validate and qualify a prospect, dispatching an OTP when the revenue tier qualifies.
    ///
    /// Disqualified prospects are stored as `BadLead` straight away. Qualified prospects are
    /// stored as `Pending` only after the provider accepts the send; a failed send leaves the
    /// store untouched.
    pub async fn submit(
        &self,
        submission: ProspectSubmission,
    ) -> Result<SubmissionOutcome, QualificationError> {
        self.guard.check_submission(&submission)?;
        let masked = mask_phone(&submission.phone);
        let _slot = self.locks.acquire(&submission.phone).await;

        match self.policy.decide(&submission.monthly_revenue) {
            QualificationDecision::Disqualified => {
                let record =
                    ProspectRecord::from_submission(submission, ProspectStatus::BadLead, None);
                self.store.put(record.clone())?;
                info!(
                    phone = %masked,
                    tier = %record.monthly_revenue,
                    "prospect disqualified by revenue tier"
                );
                Ok(SubmissionOutcome::Disqualified(record))
            }
            QualificationDecision::Qualified => {
                let session = self
                    .provider
                    .send_otp(&submission.phone)
                    .await
                    .inspect_err(|err| {
                        warn!(phone = %masked, error = %err, "otp dispatch failed")
                    })?;

                let record = ProspectRecord::from_submission(
                    submission,
                    ProspectStatus::Pending,
                    Some(session.session_id),
                );
                self.store.put(record.clone())?;
                info!(phone = %masked, "otp dispatched; prospect pending verification");
                Ok(SubmissionOutcome::OtpSent(record))
            }
        }
    }

    /// Check a code against the stored provider session and settle the prospect's status.
    ///
    /// A provider fault leaves the stored status as it was.
    pub async fn verify(
        &self,
        request: OtpVerificationRequest,
    ) -> Result<ProspectRecord, QualificationError> {
        self.guard.check_verification(&request)?;
        let masked = mask_phone(&request.phone);
        let _slot = self.locks.acquire(&request.phone).await;

        let mut record = self
            .store
            .get(&request.phone)?
            .ok_or(QualificationError::SessionNotFound)?;
        let session_id = record
            .session_id
            .clone()
            .ok_or(QualificationError::SessionNotFound)?;

        let verification = self
            .provider
            .verify_otp(&session_id, &request.otp)
            .await
            .inspect_err(|err| {
                warn!(
                    phone = %masked,
                    status = record.status.label(),
                    error = %err,
                    "otp verification unavailable; status left unchanged"
                )
            })?;

        match verification {
            OtpVerification::Matched => {
                record.transition(ProspectStatus::Lead);
                self.store.put(record.clone())?;
                info!(phone = %masked, "otp matched; prospect promoted to lead");
                Ok(record)
            }
            OtpVerification::Mismatched { details } => {
                record.transition(ProspectStatus::BadLead);
                self.store.put(record)?;
                info!(
                    phone = %masked,
                    provider_details = %details,
                    "otp mismatch; prospect marked bad lead"
                );
                Err(QualificationError::InvalidOtp)
            }
        }
    }

    /// Fetch the current record for a phone number.
    pub fn get(&self, phone: &str) -> Result<ProspectRecord, QualificationError> {
        let record = self.store.get(phone)?.ok_or(StoreError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the qualification service.
#[derive(Debug, thiserror::Error)]
pub enum QualificationError {
    #[error(transparent)]
    Validation(#[from] IntakeViolation),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("no OTP session found for this phone number")]
    SessionNotFound,
    #[error("OTP did not match")]
    InvalidOtp,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-phone async locks so a send and a verify for the same number never interleave.
#[derive(Default)]
struct PhoneLocks {
    slots: Mutex<HashMap<String, PhoneEntry>>,
}

/// Mutex for one phone plus the number of tasks holding or awaiting it.
#[derive(Default)]
struct PhoneEntry {
    mutex: Arc<AsyncMutex<()>>,
    users: usize,
}

impl PhoneLocks {
    async fn acquire(&self, phone: &str) -> PhoneSlot<'_> {
        let mutex = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = slots.entry(phone.to_string()).or_default();
            entry.users += 1;
            Arc::clone(&entry.mutex)
        };

        // Registered before waiting so a cancelled acquire still releases its count.
        let mut slot = PhoneSlot {
            locks: self,
            phone: phone.to_string(),
            guard: None,
        };
        slot.guard = Some(mutex.lock_owned().await);
        slot
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct PhoneSlot<'a> {
    locks: &'a PhoneLocks,
    phone: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PhoneSlot<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut slots = self.locks.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = slots.get_mut(&self.phone) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                slots.remove(&self.phone);
            }
        }
    }
}
