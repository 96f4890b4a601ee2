use std::sync::OnceLock;

use regex::Regex;

use super::domain::{OtpVerificationRequest, ProspectSubmission};

/// Ten ASCII digits, leading 6-9 (Indian mobile numbering).
const MOBILE_PATTERN: &str = r"^[6-9][0-9]{9}$";

fn mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(MOBILE_PATTERN).expect("mobile pattern compiles"))
}

/// Validation errors raised before the store or provider is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("All fields are required")]
    MissingFields { fields: Vec<&'static str> },
    #[error("Please enter a valid 10-digit mobile number")]
    InvalidPhone,
    #[error("Phone number and OTP are required")]
    MissingVerificationFields,
}

/// Guard applied to raw form input.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn check_submission(
        &self,
        submission: &ProspectSubmission,
    ) -> Result<(), IntakeViolation> {
        let fields = [
            ("name", submission.name.as_str()),
            ("email", submission.email.as_str()),
            ("phone", submission.phone.as_str()),
            ("monthly_revenue", submission.monthly_revenue.as_str()),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(IntakeViolation::MissingFields { fields: missing });
        }

        if !is_valid_mobile(&submission.phone) {
            return Err(IntakeViolation::InvalidPhone);
        }

        Ok(())
    }

    pub fn check_verification(
        &self,
        request: &OtpVerificationRequest,
    ) -> Result<(), IntakeViolation> {
        if request.phone.trim().is_empty() || request.otp.trim().is_empty() {
            return Err(IntakeViolation::MissingVerificationFields);
        }
        Ok(())
    }
}

pub fn is_valid_mobile(phone: &str) -> bool {
    mobile_pattern().is_match(phone)
}
