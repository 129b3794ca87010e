//! Fallback model chain against a local stand-in for the Ollama HTTP API.
//!
//! The server never answers requests for model `slow` and answers `fast`
//! immediately, so the configured model always times out and the first
//! fallback has to carry the call.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use outreach_campaign::config::SenderProfile;
use outreach_campaign::content::{AiAvailability, ContentOrigin, ContentSelector, SelectorConfig};
use outreach_campaign::llm::{GenerationRequest, LlmProvider, OllamaConfig, OllamaProvider};
use outreach_campaign::recipients::Recipient;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

const FAST_REPLY: &str = r#"{"model":"fast","response":"SUBJECT: From fallback\nBODY:\nHi Ann, a short note.","done":true}"#;

// ── Stand-in server ──────────────────────────────────────────────────

async fn handle(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let text = String::from_utf8_lossy(&request);
        if text.contains(r#""model":"slow""#) {
            // Hold the connection open without answering.
            tokio::time::sleep(Duration::from_secs(30)).await;
            return;
        }
        if text.contains(r#""model":"fast""#) {
            break;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        FAST_REPLY.len(),
        FAST_REPLY
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle(stream));
        }
    });
    format!("http://{addr}")
}

fn ollama_config(base_url: String) -> OllamaConfig {
    OllamaConfig {
        base_url,
        model: "slow".into(),
        fallback_models: vec!["fast".into()],
        timeout_secs: 1,
        ..OllamaConfig::default()
    }
}

fn ann() -> Recipient {
    Recipient::new("ann@acme.io", "primary")
        .with_field("name", "Ann")
        .with_field("company", "Acme")
}

// ── Tests ────────────────────────────────────────────────────────────

#[tokio::test]
async fn provider_moves_past_hung_model() {
    let provider = OllamaProvider::new(ollama_config(spawn_server().await)).unwrap();

    let text = tokio::time::timeout(TEST_TIMEOUT, provider.generate(GenerationRequest::new("hi")))
        .await
        .expect("generation hung")
        .unwrap();
    assert!(text.starts_with("SUBJECT: From fallback"));
}

#[tokio::test]
async fn selector_keeps_ai_when_fallback_model_answers() {
    let ollama = ollama_config(spawn_server().await);
    let config = SelectorConfig {
        timeout: ollama.timeout(),
        fallback_attempts: ollama.fallback_count(),
        ..SelectorConfig::default()
    };
    let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::new(ollama).unwrap());
    let selector = ContentSelector::new(Some(provider), config, SenderProfile::default());
    let mut ai = AiAvailability::new(true);

    let content = tokio::time::timeout(TEST_TIMEOUT, selector.select(&ann(), &mut ai))
        .await
        .expect("selection hung");

    assert_eq!(content.subject, "From fallback");
    assert_eq!(content.body, "Hi Ann, a short note.");
    assert_eq!(
        content.origin,
        ContentOrigin::Generated {
            model: "slow".into(),
            score: None
        }
    );
    assert!(ai.is_available(), "AI was disabled: {:?}", ai.reason());
}
