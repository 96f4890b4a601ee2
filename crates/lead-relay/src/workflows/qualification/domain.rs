use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque handle issued by the OTP provider when a code is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Raw prospect form as posted to `/send-otp`.
///
/// Missing fields deserialize as empty strings so intake validation, not the JSON
/// extractor, decides what a bad submission looks like.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub monthly_revenue: String,
}

/// Code entry posted to `/verify-otp`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpVerificationRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub otp: String,
}

/// Where a prospect sits in the qualification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProspectStatus {
    Pending,
    Lead,
    BadLead,
}

impl ProspectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProspectStatus::Pending => "Pending",
            ProspectStatus::Lead => "Lead",
            ProspectStatus::BadLead => "BadLead",
        }
    }
}

/// Stored state for one phone number. A new submission replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub monthly_revenue: String,
    pub session_id: Option<SessionId>,
    pub status: ProspectStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProspectRecord {
    pub(crate) fn from_submission(
        submission: ProspectSubmission,
        status: ProspectStatus,
        session_id: Option<SessionId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: submission.name,
            email: submission.email,
            phone: submission.phone,
            monthly_revenue: submission.monthly_revenue,
            session_id,
            status,
            submitted_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn transition(&mut self, status: ProspectStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn status_view(&self) -> ProspectStatusView {
        ProspectStatusView {
            phone: self.phone.clone(),
            name: self.name.clone(),
            status: self.status.label(),
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
        }
    }
}

/// Externally visible slice of a record; omits the e-mail address and provider session.
#[derive(Debug, Clone, Serialize)]
pub struct ProspectStatusView {
    pub phone: String,
    pub name: String,
    pub status: &'static str,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
