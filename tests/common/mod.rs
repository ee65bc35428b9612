//! Shared helpers for integration tests.
//!
//! - `log_capture`: thread-local tracing capture
//! - mock endpoint builders for sources pointed at a wiremock server

#![allow(dead_code)]

pub mod log_capture;

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use statcard::core::fetch_plan::EndpointTemplates;
use statcard::sources::SourceContext;

/// Templates for one resource on the mock server; `None` disables the fallback.
pub fn templates(server: &MockServer, primary: &str, fallback: Option<&str>) -> EndpointTemplates {
    EndpointTemplates {
        primary: Some(format!("{}/{primary}/{{identity}}", server.uri())),
        fallback: Some(fallback.map_or_else(String::new, |f| {
            format!("{}/{f}/{{identity}}", server.uri())
        })),
    }
}

/// CodeChef context whose profile and recent chains both hit `server`.
pub fn codechef_context(server: &MockServer, identity: &str) -> SourceContext {
    SourceContext::new(identity)
        .with_endpoints("profile", templates(server, "profile", Some("profile-fallback")))
        .with_endpoints("recent", templates(server, "recent", Some("recent-fallback")))
}

/// Mount a JSON response expected exactly `times` times.
pub async fn mount_json(server: &MockServer, route: &str, status: u16, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Mount a failing response expected exactly `times` times.
pub async fn mount_status(server: &MockServer, route: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}
