//! Retry-policy tests against a local mock HTTP server.
//!
//! Both remote clients promise "at most 3 attempts with a fixed delay"; these
//! tests pin that bound from the outside by counting requests the mock server
//! actually received.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pipeline::analysis_client::{AnalysisClient, Analyzer};
use pipeline::fetcher::{ResumeFetcher, ResumeSource};
use pipeline::models::applicant::ApplicantIdentity;

fn identity() -> ApplicantIdentity {
    ApplicantIdentity {
        name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        linkedin: Some("https://linkedin.com/in/asha".to_string()),
        mobile_number: "9876543210".to_string(),
    }
}

#[tokio::test]
async fn fetcher_makes_exactly_three_attempts_against_failing_host() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resumes/1.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = ResumeFetcher::new();
    let result = fetcher
        .fetch_text(&format!("{}/resumes/1.pdf", server.uri()))
        .await;

    assert!(result.is_err());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "expected exactly 3 attempts");
}

#[tokio::test]
async fn analysis_client_makes_exactly_three_attempts_against_failing_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(format!("{}/webhook", server.uri()));
    let result = client.analyze(&identity(), "resume text").await;

    assert!(result.is_err());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "expected exactly 3 attempts");
}

#[tokio::test]
async fn analysis_client_retries_on_unparsable_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "output": "I could not produce JSON" }])),
        )
        .mount(&server)
        .await;

    let client = AnalysisClient::new(format!("{}/webhook", server.uri()));
    let result = client.analyze(&identity(), "resume text").await;

    assert!(result.is_err());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3, "parse failures should be retried too");
}

#[tokio::test]
async fn analysis_client_unwraps_listed_and_fenced_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "output": "```json\n{\"ats_score\": 82, \"skills\": [\"Rust\"]}\n```" }
        ])))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(format!("{}/webhook", server.uri()));
    let result = client.analyze(&identity(), "resume text").await.unwrap();

    assert_eq!(result.ats_score, Some(82.0));
    assert_eq!(result.skills, vec!["Rust"]);

    // the request carried the identity header as the form-encoded `input`
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.starts_with("input="));
}
