use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::config::QualificationConfig;
use crate::workflows::qualification::domain::{ProspectRecord, ProspectSubmission, SessionId};
use crate::workflows::qualification::provider::{
    OtpProvider, OtpSession, OtpVerification, ProviderError,
};
use crate::workflows::qualification::repository::{
    InMemoryProspectStore, ProspectStore, StoreError,
};
use crate::workflows::qualification::{lead_router, LeadQualificationService};

pub(super) const PHONE: &str = "9876543210";
pub(super) const SESSION: &str = "SID1";
pub(super) const CODE: &str = "482913";

pub(super) fn submission(phone: &str, monthly_revenue: &str) -> ProspectSubmission {
    ProspectSubmission {
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: phone.to_string(),
        monthly_revenue: monthly_revenue.to_string(),
    }
}

/// Provider double that answers from a fixed script and records every call.
pub(super) struct ScriptedProvider {
    session: String,
    code: String,
    fail_send: bool,
    fail_verify: bool,
    sends: Mutex<Vec<String>>,
    verifies: Mutex<Vec<(SessionId, String)>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            session: SESSION.to_string(),
            code: CODE.to_string(),
            fail_send: false,
            fail_verify: false,
            sends: Mutex::new(Vec::new()),
            verifies: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedProvider {
    pub(super) fn failing_send() -> Self {
        Self {
            fail_send: true,
            ..Self::default()
        }
    }

    pub(super) fn failing_verify() -> Self {
        Self {
            fail_verify: true,
            ..Self::default()
        }
    }

    pub(super) fn sends(&self) -> Vec<String> {
        self.sends.lock().expect("provider mutex poisoned").clone()
    }

    pub(super) fn verifies(&self) -> Vec<(SessionId, String)> {
        self.verifies.lock().expect("provider mutex poisoned").clone()
    }
}

#[async_trait]
impl OtpProvider for ScriptedProvider {
    async fn send_otp(&self, phone: &str) -> Result<OtpSession, ProviderError> {
        self.sends
            .lock()
            .expect("provider mutex poisoned")
            .push(phone.to_string());
        if self.fail_send {
            return Err(ProviderError::Rejected("Invalid API key".to_string()));
        }
        Ok(OtpSession {
            session_id: SessionId(self.session.clone()),
        })
    }

    async fn verify_otp(
        &self,
        session_id: &SessionId,
        code: &str,
    ) -> Result<OtpVerification, ProviderError> {
        self.verifies
            .lock()
            .expect("provider mutex poisoned")
            .push((session_id.clone(), code.to_string()));
        if self.fail_verify {
            return Err(ProviderError::Transport("connection reset".to_string()));
        }
        if session_id.0 == self.session && code == self.code {
            Ok(OtpVerification::Matched)
        } else {
            Ok(OtpVerification::Mismatched {
                details: "OTP Mismatch".to_string(),
            })
        }
    }
}

pub(super) type TestService = LeadQualificationService<InMemoryProspectStore, ScriptedProvider>;

pub(super) fn build_service_with(
    provider: ScriptedProvider,
) -> (TestService, Arc<InMemoryProspectStore>, Arc<ScriptedProvider>) {
    let store = Arc::new(InMemoryProspectStore::default());
    let provider = Arc::new(provider);
    let service = LeadQualificationService::new(
        store.clone(),
        provider.clone(),
        &QualificationConfig::default(),
    );
    (service, store, provider)
}

pub(super) fn build_service() -> (TestService, Arc<InMemoryProspectStore>, Arc<ScriptedProvider>)
{
    build_service_with(ScriptedProvider::default())
}

pub(super) fn stored(store: &InMemoryProspectStore, phone: &str) -> ProspectRecord {
    store
        .get(phone)
        .expect("lookup succeeds")
        .expect("record present")
}

pub(super) struct UnavailableStore;

impl ProspectStore for UnavailableStore {
    fn put(&self, _record: ProspectRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn get(&self, _phone: &str) -> Result<Option<ProspectRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    lead_router(Arc::new(service))
}
