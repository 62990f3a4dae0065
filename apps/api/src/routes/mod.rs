pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/view", get(handlers::handle_view))
        .route("/api/v1/libraries", get(handlers::handle_libraries))
        .route(
            "/api/v1/session/job-description",
            put(handlers::handle_set_job_description),
        )
        .route("/api/v1/session/resume", put(handlers::handle_set_resume))
        .route("/api/v1/session/upload", post(handlers::handle_upload))
        .route("/api/v1/session/classify", post(handlers::handle_classify))
        .route(
            "/api/v1/history",
            get(handlers::handle_history).delete(handlers::handle_clear_history),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::tests::test_config;
    use crate::llm_client::tests::{candidate_body, client_for, fake_gemini, Captured};
    use crate::loader::LibraryReadiness;
    use crate::matching::{Classifier, GeminiClassifier};
    use crate::session::tests::{build_session, ScriptedClassifier, CANNED};

    const JD: &str = "Senior Full Stack Engineer... React, Node.js...";
    const RESUME: &str = "Jane Roe. Skills: React, Redux, Node.js, Express.js";

    async fn app_with(readiness: LibraryReadiness, classifier: Arc<dyn Classifier>) -> Router {
        let (session, _) = build_session(readiness, classifier).await;
        build_router(AppState {
            session,
            config: test_config(),
        })
    }

    async fn gemini_app(status: StatusCode, body: String) -> (Router, Captured) {
        let (base, captured) = fake_gemini(status, body).await;
        let classifier = Arc::new(GeminiClassifier::new(client_for(&base)));
        (app_with(LibraryReadiness::Ready, classifier).await, captured)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(request.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_request(filename: &str, content_type: &str, content: &[u8]) -> Request<Body> {
        let boundary = "matcher-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/session/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(LibraryReadiness::Ready, ScriptedClassifier::new(vec![])).await;
        let response = send(&app, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["libraries"]["state"], "ready");
        assert_eq!(body["historyEntries"], 0);
    }

    #[tokio::test]
    async fn test_health_degraded_when_libraries_failed() {
        let app = app_with(
            LibraryReadiness::Failed("timed out".to_string()),
            ScriptedClassifier::new(vec![]),
        )
        .await;
        let body = json_body(send(&app, Method::GET, "/health", None).await).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["libraries"]["reason"], "timed out");
    }

    #[tokio::test]
    async fn test_classify_scenario_renders_report_and_history() {
        let (app, captured) = gemini_app(StatusCode::OK, candidate_body(CANNED)).await;

        send(&app, Method::PUT, "/api/v1/session/job-description", Some(json!({"text": JD}))).await;
        send(&app, Method::PUT, "/api/v1/session/resume", Some(json!({"text": RESUME}))).await;

        let response = send(&app, Method::POST, "/api/v1/session/classify", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["report"]["score"], 72.0);
        assert_eq!(view["report"]["band"], "good");
        assert_eq!(view["history"]["items"].as_array().unwrap().len(), 1);
        assert_eq!(view["history"]["items"][0]["score"], 72.0);

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let prompt = captured[0].1["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(prompt.contains(JD));
        assert!(prompt.contains(RESUME));
    }

    #[tokio::test]
    async fn test_api_500_shows_banner_and_adds_no_history() {
        let (app, _) = gemini_app(StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()).await;

        let response = send(&app, Method::POST, "/api/v1/session/classify", None).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "API_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("500"));

        let view = json_body(send(&app, Method::GET, "/api/v1/view", None).await).await;
        assert!(view["errorMessage"].as_str().unwrap().contains("500"));
        assert!(view["report"].is_null());
        assert_eq!(view["history"]["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_blank_resume_rejected_without_call() {
        let (app, captured) = gemini_app(StatusCode::OK, candidate_body(CANNED)).await;

        send(&app, Method::PUT, "/api/v1/session/resume", Some(json!({"text": "  \n "}))).await;
        let response = send(&app, Method::POST, "/api/v1/session/classify", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_text_file_updates_resume() {
        let app = app_with(LibraryReadiness::Ready, ScriptedClassifier::new(vec![])).await;

        let response = app
            .clone()
            .oneshot(multipart_request("cv.txt", "text/plain", RESUME.as_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["resumeText"], RESUME);
    }

    #[tokio::test]
    async fn test_upload_unsupported_format() {
        let app = app_with(LibraryReadiness::Ready, ScriptedClassifier::new(vec![])).await;

        let response = app
            .clone()
            .oneshot(multipart_request("photo.png", "image/png", b"not a resume"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let view = json_body(send(&app, Method::GET, "/api/v1/view", None).await).await;
        assert!(view["errorMessage"]
            .as_str()
            .unwrap()
            .contains("Unsupported file type"));
    }

    #[tokio::test]
    async fn test_upload_while_loading_is_disabled() {
        let app = app_with(LibraryReadiness::Loading, ScriptedClassifier::new(vec![])).await;

        let view = json_body(send(&app, Method::GET, "/api/v1/view", None).await).await;
        assert_eq!(view["upload"]["enabled"], false);

        let response = app
            .clone()
            .oneshot(multipart_request("cv.txt", "text/plain", RESUME.as_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let view = json_body(send(&app, Method::GET, "/api/v1/view", None).await).await;
        assert_ne!(view["resumeText"], RESUME);
        assert_eq!(view["errorMessage"], "Document library not fully loaded.");
    }

    #[tokio::test]
    async fn test_upload_without_file_part_replaces_banner() {
        let app = app_with(LibraryReadiness::Ready, ScriptedClassifier::new(vec![])).await;
        app.clone()
            .oneshot(multipart_request("photo.png", "image/png", b"not a resume"))
            .await
            .unwrap();

        let boundary = "matcher-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"notes\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/session/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let view = json_body(send(&app, Method::GET, "/api/v1/view", None).await).await;
        assert_eq!(view["errorMessage"], "Upload must include a 'file' part");
    }

    #[tokio::test]
    async fn test_history_list_and_clear() {
        let classifier =
            ScriptedClassifier::new(vec![Ok(crate::session::tests::canned_report())]);
        let app = app_with(LibraryReadiness::Ready, classifier).await;

        send(&app, Method::POST, "/api/v1/session/classify", None).await;
        let history = json_body(send(&app, Method::GET, "/api/v1/history", None).await).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["report"]["matchScorePercent"], 72.0);

        let response = send(&app, Method::DELETE, "/api/v1/history", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let history = json_body(send(&app, Method::GET, "/api/v1/history", None).await).await;
        assert!(history.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_libraries_endpoint_reports_state() {
        let app = app_with(LibraryReadiness::Ready, ScriptedClassifier::new(vec![])).await;
        let body = json_body(send(&app, Method::GET, "/api/v1/libraries", None).await).await;
        assert_eq!(body["state"], "ready");

        let body =
            json_body(send(&app, Method::GET, "/api/v1/libraries?wait=true", None).await).await;
        assert_eq!(body["state"], "ready");
    }
}
