use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use scribble_config::OllamaConfig;
use scribble_core::{GuessResult, Guesser, InferenceError, ModelStatus};

use crate::image::strip_data_uri;
use crate::normalize::parse_reply;
use crate::prompt::GUESS_PROMPT;

/// Deadline for the model listing call; it never loads a model.
const TAGS_TIMEOUT: Duration = Duration::from_secs(10);

/// Guesser backed by a local Ollama vision model.
///
/// Holds no per-request state; concurrent calls each get their own
/// exchange and their own deadline.
#[derive(Clone)]
pub struct OllamaGuesser {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    temperature: f32,
    num_predict: u32,
    keep_alive: String,
}

impl OllamaGuesser {
    pub fn new() -> Self {
        Self::from_config(&OllamaConfig::default())
    }

    pub fn from_config(config: &OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            timeout: config.timeout(),
            temperature: config.temperature(),
            num_predict: config.max_output_tokens(),
            keep_alive: config.keep_alive().to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_request<'a>(&'a self, image_b64: &'a str) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model,
            messages: vec![OllamaChatMessage {
                role: "user",
                content: GUESS_PROMPT,
                images: vec![image_b64],
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.num_predict,
            },
            keep_alive: &self.keep_alive,
        }
    }

    /// Send a request and decode a JSON success body, classifying every
    /// failure on the way.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, InferenceError> {
        let response = request.send().await.map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| self.body_error(&e))?;
            return Err(error_from_status(status, &body));
        }

        let bytes = response.bytes().await.map_err(|e| self.body_error(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            InferenceError::unknown(format!("Failed to parse Ollama response: {e}"))
        })
    }

    fn transport_error(&self, err: &reqwest::Error) -> InferenceError {
        let reason = error_chain(err);
        if err.is_timeout() {
            InferenceError::timeout(format!("Ollama request timed out: {reason}"))
        } else if err.is_connect() || err.is_request() || err.is_body() {
            InferenceError::network(format!("Could not reach Ollama at {}: {reason}", self.base_url))
        } else {
            InferenceError::unknown(reason)
        }
    }

    /// The connection broke after the status line arrived.
    fn body_error(&self, err: &reqwest::Error) -> InferenceError {
        let reason = error_chain(err);
        if err.is_timeout() {
            InferenceError::timeout(format!("Ollama request timed out: {reason}"))
        } else {
            InferenceError::network(format!(
                "Lost connection to Ollama at {} while reading the reply: {reason}",
                self.base_url
            ))
        }
    }
}

impl Default for OllamaGuesser {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `fut` under a hard deadline. On expiry the future is dropped, which
/// aborts the in-flight HTTP request.
async fn with_deadline<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, InferenceError>>,
) -> Result<T, InferenceError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(InferenceError::timeout(format!(
            "Ollama did not respond within {limit:?}"
        ))),
    }
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaChatMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
    keep_alive: &'a str,
}

#[derive(Serialize)]
struct OllamaChatMessage<'a> {
    role: &'static str,
    content: &'a str,
    images: Vec<&'a str>,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaReplyMessage>,
    #[serde(default)]
    response: Option<String>,
    /// Nanoseconds. Kept loose so an odd value never sinks the reply.
    #[serde(default)]
    total_duration: Option<Value>,
}

#[derive(Deserialize)]
struct OllamaReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OllamaChatResponse {
    /// Prefer `message.content`, fall back to `response`.
    fn reply_text(&self) -> &str {
        let content = self.message.as_ref().and_then(|m| m.content.as_deref());
        match content {
            Some(text) if !text.trim().is_empty() => text,
            _ => self.response.as_deref().unwrap_or(""),
        }
    }

    fn duration_ms(&self) -> u64 {
        self.total_duration.as_ref().map_or(0, nanos_to_ms)
    }
}

fn nanos_to_ms(value: &Value) -> u64 {
    if let Some(nanos) = value.as_u64() {
        return nanos.saturating_add(500_000) / 1_000_000;
    }
    match value.as_f64() {
        Some(nanos) if nanos.is_finite() && nanos > 0.0 => (nanos / 1_000_000.0).round() as u64,
        _ => 0,
    }
}

#[derive(Deserialize)]
struct OllamaErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Deserialize)]
struct OllamaModelTag {
    name: String,
}

/// Map a completed-but-unsuccessful exchange to an error kind.
fn error_from_status(status: StatusCode, body: &str) -> InferenceError {
    let message = serde_json::from_str::<OllamaErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Ollama returned status {}", status.as_u16()));

    if status == StatusCode::NOT_FOUND || mentions_missing_model(&message) {
        InferenceError::model_not_found(message)
    } else if status.is_server_error() {
        InferenceError::server_error(message)
    } else {
        InferenceError::unknown(message)
    }
}

fn mentions_missing_model(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("model") && lower.contains("not found")
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    out
}

/// Installed names carry an explicit tag; "llava" and "llava:latest" are the same model.
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed.strip_suffix(":latest") == Some(wanted)
        || wanted.strip_suffix(":latest") == Some(installed)
}

#[async_trait]
impl Guesser for OllamaGuesser {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn guess(&self, image: &str) -> Result<GuessResult, InferenceError> {
        let payload = strip_data_uri(image);
        let body = self.chat_request(payload);

        debug!(model = %self.model, image_bytes = payload.len(), "Sending guess request to Ollama");

        let request = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body);
        let outcome = with_deadline(self.timeout, self.fetch::<OllamaChatResponse>(request))
            .await
            .and_then(|reply| parse_reply(reply.reply_text(), reply.duration_ms()));

        match &outcome {
            Ok(result) => info!(
                model = %self.model,
                guess = %result.guess,
                confidence = %result.confidence,
                duration_ms = result.duration,
                "Guess produced"
            ),
            Err(err) => warn!(model = %self.model, kind = %err.kind, error = %err.message, "Guess failed"),
        }
        outcome
    }

    async fn check_model(&self) -> Result<ModelStatus, InferenceError> {
        let request = self.client.get(format!("{}/api/tags", self.base_url));
        let tags: OllamaTagsResponse =
            with_deadline(TAGS_TIMEOUT.min(self.timeout), self.fetch(request)).await?;

        let installed: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        let available = installed.iter().any(|name| model_matches(name, &self.model));
        if !available {
            warn!(model = %self.model, installed = ?installed, "Configured model is not installed");
        }

        Ok(ModelStatus {
            model: self.model.clone(),
            available,
            installed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{get, post},
        Json, Router,
    };
    use scribble_core::{Confidence, ErrorKind};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn chat_stub(status: StatusCode, body: Value) -> Router {
        Router::new().route("/api/chat", post(move || async move { (status, Json(body)) }))
    }

    async fn guesser_for(app: Router) -> OllamaGuesser {
        OllamaGuesser::new().with_base_url(spawn_stub(app).await)
    }

    #[test]
    fn request_shape() {
        let guesser = OllamaGuesser::new().with_model("llava:13b");
        let body = serde_json::to_value(guesser.chat_request("iVBORw0KGgo=")).unwrap();
        assert_eq!(body["model"], "llava:13b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["keep_alive"], "10m");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["images"], json!(["iVBORw0KGgo="]));
        assert_eq!(body["options"]["num_predict"], 50);
        assert!(body["options"]["temperature"].as_f64().unwrap() < 0.2);
    }

    #[test]
    fn status_mapping() {
        let err = error_from_status(StatusCode::NOT_FOUND, r#"{"error":"model not found"}"#);
        assert_eq!(err.kind, ErrorKind::ModelNotFound);
        assert_eq!(err.message, "model not found");

        let err = error_from_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"model \"llava\" not found, try pulling it first"}"#,
        );
        assert_eq!(err.kind, ErrorKind::ModelNotFound);

        let err = error_from_status(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.kind, ErrorKind::OllamaServerError);
        assert_eq!(err.message, "Ollama returned status 502");

        let err = error_from_status(StatusCode::BAD_REQUEST, r#"{"error":""}"#);
        assert_eq!(err.kind, ErrorKind::UnknownError);
        assert_eq!(err.message, "Ollama returned status 400");
    }

    #[test]
    fn latest_tag_matching() {
        assert!(model_matches("llava:latest", "llava"));
        assert!(model_matches("llava", "llava:latest"));
        assert!(model_matches("llava:13b", "llava:13b"));
        assert!(!model_matches("llava:13b", "llava"));
    }

    #[tokio::test]
    async fn strips_data_uri_and_parses_reply() {
        let captured = Arc::new(Mutex::new(None::<Value>));
        let sink = captured.clone();
        let app = Router::new().route(
            "/api/chat",
            post(move |Json(req): Json<Value>| async move {
                *sink.lock().unwrap() = Some(req);
                Json(json!({
                    "message": { "role": "assistant", "content": "It is a cat\nhigh" },
                    "total_duration": 1_234_567_890u64
                }))
            }),
        );
        let guesser = guesser_for(app).await;

        let result = guesser.guess("data:image/png;base64,iVBORw0KGgo=").await.unwrap();
        assert_eq!(result.guess, "cat");
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.duration, 1235);

        let sent = captured.lock().unwrap().take().unwrap();
        assert_eq!(sent["messages"][0]["images"][0], "iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn falls_back_to_response_field() {
        let guesser = guesser_for(chat_stub(
            StatusCode::OK,
            json!({ "message": { "content": "" }, "response": "Guess: tree\nlow" }),
        ))
        .await;
        let result = guesser.guess("AAAA").await.unwrap();
        assert_eq!(result.guess, "tree");
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.duration, 0);
    }

    #[tokio::test]
    async fn null_content_falls_back_to_response() {
        let guesser = guesser_for(chat_stub(
            StatusCode::OK,
            json!({ "message": { "content": null }, "response": "tree\nhigh" }),
        ))
        .await;
        let result = guesser.guess("AAAA").await.unwrap();
        assert_eq!(result.guess, "tree");
        assert_eq!(result.confidence, Confidence::High);
    }

    #[tokio::test]
    async fn odd_duration_does_not_sink_reply() {
        let guesser = guesser_for(chat_stub(
            StatusCode::OK,
            json!({ "message": { "content": "boat\nlow" }, "total_duration": 1.5e9 }),
        ))
        .await;
        let result = guesser.guess("AAAA").await.unwrap();
        assert_eq!(result.guess, "boat");
        assert_eq!(result.duration, 1500);

        let guesser = guesser_for(chat_stub(
            StatusCode::OK,
            json!({ "message": { "content": "boat\nlow" }, "total_duration": "soon" }),
        ))
        .await;
        assert_eq!(guesser.guess("AAAA").await.unwrap().duration, 0);
    }

    #[test]
    fn duration_conversion() {
        assert_eq!(nanos_to_ms(&json!(1_234_567_890u64)), 1235);
        assert_eq!(nanos_to_ms(&json!(2.4e6)), 2);
        assert_eq!(nanos_to_ms(&json!(-5)), 0);
        assert_eq!(nanos_to_ms(&Value::Null), 0);
    }

    #[tokio::test]
    async fn truncated_error_body_is_network_error() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\n{\"err")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let guesser = OllamaGuesser::new().with_base_url(format!("http://{addr}"));
        let err = guesser.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NetworkError);
        assert!(err.message.contains("while reading the reply"));
    }

    #[tokio::test]
    async fn empty_reply_is_unclear() {
        let guesser = guesser_for(chat_stub(StatusCode::OK, json!({ "done": true }))).await;
        let result = guesser.guess("AAAA").await.unwrap();
        assert_eq!(result.guess, "unclear");
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn confidence_only_reply_is_empty_guess() {
        let guesser = guesser_for(chat_stub(
            StatusCode::OK,
            json!({ "message": { "content": "high" } }),
        ))
        .await;
        let err = guesser.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyGuess);
    }

    #[tokio::test]
    async fn missing_model_maps_to_model_not_found() {
        let guesser = guesser_for(chat_stub(
            StatusCode::NOT_FOUND,
            json!({ "error": "model not found" }),
        ))
        .await;
        let err = guesser.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ModelNotFound);
        assert!(err.message.contains("model not found"));
    }

    #[tokio::test]
    async fn server_failure_maps_to_server_error() {
        let guesser = guesser_for(chat_stub(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "CUDA out of memory" }),
        ))
        .await;
        let err = guesser.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::OllamaServerError);
        assert_eq!(err.message, "CUDA out of memory");
    }

    #[tokio::test]
    async fn undecodable_body_is_unknown_error() {
        let guesser = guesser_for(chat_stub(StatusCode::OK, json!("not an object"))).await;
        let err = guesser.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownError);
        assert!(err.message.starts_with("Failed to parse Ollama response"));
    }

    #[tokio::test]
    async fn hung_backend_times_out() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({ "message": { "content": "too late\nhigh" } }))
            }),
        );
        let guesser = guesser_for(app)
            .await
            .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = guesser.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let guesser = OllamaGuesser::new().with_base_url(format!("http://{addr}"));
        let err = guesser.guess("AAAA").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NetworkError);
        assert!(err.message.contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn concurrent_requests_are_independent() {
        let app = Router::new().route(
            "/api/chat",
            post(|Json(req): Json<Value>| async move {
                let image = req["messages"][0]["images"][0].as_str().unwrap_or("").to_string();
                let content = if image == "CAT" { "cat\nhigh" } else { "dog\nlow" };
                Json(json!({ "message": { "content": content } }))
            }),
        );
        let guesser = guesser_for(app).await;

        let (a, b) = tokio::join!(guesser.guess("CAT"), guesser.guess("data:image/png;base64,DOG"));
        assert_eq!(a.unwrap().guess, "cat");
        assert_eq!(b.unwrap().guess, "dog");
    }

    #[tokio::test]
    async fn check_model_reads_tags() {
        let app = Router::new().route(
            "/api/tags",
            get(|| async {
                Json(json!({ "models": [{ "name": "llava:latest" }, { "name": "moondream:latest" }] }))
            }),
        );
        let guesser = guesser_for(app).await;
        let status = guesser.check_model().await.unwrap();
        assert!(status.available);
        assert_eq!(status.installed.len(), 2);

        let status = guesser.with_model("bakllava").check_model().await.unwrap();
        assert!(!status.available);
    }
}
