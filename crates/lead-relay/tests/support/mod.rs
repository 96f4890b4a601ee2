//! In-process stand-in for the 2Factor SMS API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lead_relay::config::OtpProviderConfig;
use serde_json::json;
use url::Url;

pub const API_KEY: &str = "integration-key";
pub const VALID_CODE: &str = "123456";
/// Sends to this number answer with a plain-text 500.
pub const OUTAGE_PHONE: &str = "9999999999";
/// Sends to this number answer 200 with a non-JSON body.
pub const GARBLED_PHONE: &str = "8888888888";

#[derive(Clone, Default)]
pub struct FakeProvider {
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeProvider {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

pub fn session_for(phone: &str) -> String {
    format!("SID-{phone}")
}

async fn handle(State(fake): State<FakeProvider>, Path(rest): Path<String>) -> Response {
    let rest = rest.trim_start_matches('/').to_string();
    fake.calls
        .lock()
        .expect("calls mutex poisoned")
        .push(rest.clone());

    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        [key, ..] if *key != API_KEY => reply("Error", "Invalid API Key - Check Your API Key"),
        [_, "SMS", "VERIFY", session, otp] => {
            if *otp == VALID_CODE && session.starts_with("SID-") {
                reply("Success", "OTP Matched")
            } else {
                reply("Error", "OTP Mismatch")
            }
        }
        [_, "SMS", phone, "AUTOGEN"] if *phone == OUTAGE_PHONE => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response()
        }
        [_, "SMS", phone, "AUTOGEN"] if *phone == GARBLED_PHONE => {
            (StatusCode::OK, "<html>maintenance</html>").into_response()
        }
        [_, "SMS", phone, "AUTOGEN"] => reply("Success", &session_for(phone)),
        _ => (StatusCode::NOT_FOUND, "unknown endpoint").into_response(),
    }
}

fn reply(status: &str, details: &str) -> Response {
    Json(json!({ "Status": status, "Details": details })).into_response()
}

/// Serve the fake on an ephemeral port and return its base URL.
pub async fn spawn_fake_provider() -> (Url, FakeProvider) {
    let fake = FakeProvider::default();
    let app = Router::new()
        .route("/API/V1/*rest", get(handle))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake provider");
    let addr = listener.local_addr().expect("fake provider address");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("fake provider serves");
    });

    let base = Url::parse(&format!("http://{addr}/API/V1")).expect("valid base url");
    (base, fake)
}

pub fn provider_config(base_url: Url, api_key: &str) -> OtpProviderConfig {
    OtpProviderConfig {
        api_key: api_key.to_string(),
        base_url,
        timeout: Duration::from_secs(5),
    }
}
