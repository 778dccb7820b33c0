use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::json;
use studio_engine::{
    resolve_session, ApiError, ArtifactRecord, BackendApi, ClientSettings, ReqwestClient,
    SessionRecord,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReqwestClient {
    ReqwestClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .unwrap()
}

fn files(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(path, code)| (path.to_string(), code.to_string()))
        .collect()
}

#[tokio::test]
async fn missing_session_resolves_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolved = resolve_session(&client(&server), "gone").await.unwrap();
    assert_eq!(resolved, None);
}

#[tokio::test]
async fn other_session_failures_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/s1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = resolve_session(&client(&server), "s1").await.unwrap_err();
    assert_eq!(err, ApiError::Http { status: 503 });
}

#[tokio::test]
async fn inline_artifact_files_are_used_directly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s1",
            "messages": [
                {"role": "user", "content": "make it", "created_at": "2024-01-01T00:00:00Z"},
                {"role": "assistant", "content": "done"}
            ],
            "latest_artifact": {"id": "a1", "files": {"/App.tsx": "x"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/artifacts/a1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolved = resolve_session(&client(&server), "s1")
        .await
        .unwrap()
        .expect("session");
    assert_eq!(resolved.session_id, "s1");
    assert_eq!(resolved.messages.len(), 2);
    assert_eq!(
        resolved.messages[0].created_at.as_deref(),
        Some("2024-01-01T00:00:00Z")
    );
    let artifact = resolved.artifact.expect("artifact");
    assert_eq!(artifact.id, "a1");
    assert_eq!(artifact.files, files(&[("/App.tsx", "x")]));
}

#[tokio::test]
async fn artifact_without_files_is_fetched_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [],
            "artifacts": [{"id": "a1"}, {"id": 2}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/artifacts/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2,
            "files": [{"path": "/App.tsx", "code": "y"}, {"path": "/index.ts", "code": "z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = resolve_session(&client(&server), "s1")
        .await
        .unwrap()
        .expect("session");
    assert_eq!(resolved.session_id, "s1");
    let artifact = resolved.artifact.expect("artifact");
    assert_eq!(artifact.id, "2");
    assert_eq!(artifact.files, files(&[("/App.tsx", "y"), ("/index.ts", "z")]));
}

#[tokio::test]
async fn failed_artifact_fetch_keeps_the_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/sessions/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "latest_artifact": {"id": "a1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/artifacts/a1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolved = resolve_session(&client(&server), "s1")
        .await
        .unwrap()
        .expect("session");
    assert_eq!(resolved.messages.len(), 1);
    assert_eq!(resolved.artifact, None);
}

struct StaticApi {
    session: Option<SessionRecord>,
}

#[async_trait::async_trait]
impl BackendApi for StaticApi {
    async fn fetch_session(&self, _session_id: &str) -> Result<Option<SessionRecord>, ApiError> {
        Ok(self.session.clone())
    }

    async fn fetch_artifact(&self, _artifact_id: &str) -> Result<ArtifactRecord, ApiError> {
        Err(ApiError::Timeout)
    }
}

#[tokio::test]
async fn session_without_artifacts_resolves_transcript_only() {
    let api = StaticApi {
        session: Some(SessionRecord {
            id: None,
            messages: Vec::new(),
            artifacts: Vec::new(),
            latest_artifact: None,
        }),
    };
    let resolved = resolve_session(&api, "s5").await.unwrap().expect("session");
    assert_eq!(resolved.session_id, "s5");
    assert_eq!(resolved.artifact, None);
}
