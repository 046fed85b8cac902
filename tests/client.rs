mod common;

use common::{bad_request, client_with, throttled, ScriptedTransport};
use nook_gemini::enums::{HarmBlockThreshold, HarmCategory};
use nook_gemini::models::{Tool, ROLE_MODEL, ROLE_USER};
use nook_gemini::{
    ChatOptions, ClientConfig, Error, GeminiClient, GenerateContentResponse, GenerateOptions,
    RateLimiter, RetryPolicy,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_generate_content_returns_first_text_part() {
    let transport = ScriptedTransport::ok("A short summary.");
    let (client, _) = client_with(transport.clone());

    let text = assert_ok!(
        client
            .generate_content("Summarize this", GenerateOptions::new())
            .await
    );
    assert_eq!(text, "A short summary.");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_generate_content_request_uses_config_defaults() {
    let transport = ScriptedTransport::ok("ok");
    let (client, _) = client_with(transport.clone());

    client
        .generate_content("prompt", GenerateOptions::new())
        .await
        .unwrap();

    let (model, request) = transport.last_request();
    assert_eq!(model, "gemini-2.0-flash");
    let generation = &request.generation_config;
    assert_eq!(generation.temperature, Some(1.0));
    assert_eq!(generation.top_p, Some(0.95));
    assert_eq!(generation.top_k, Some(40));
    assert_eq!(generation.max_output_tokens, Some(8192));
    assert_eq!(generation.response_mime_type.as_deref(), Some("text/plain"));
    assert!(request.system_instruction.is_none());
    assert!(request.tools.is_empty());
}

#[tokio::test]
async fn test_generate_content_disables_every_safety_block() {
    let transport = ScriptedTransport::ok("ok");
    let (client, _) = client_with(transport.clone());

    client
        .generate_content("forum thread", GenerateOptions::new())
        .await
        .unwrap();

    let (_, request) = transport.last_request();
    let categories: Vec<HarmCategory> = request
        .safety_settings
        .iter()
        .map(|setting| setting.category)
        .collect();
    assert_eq!(categories, HarmCategory::ALL);
    assert!(request
        .safety_settings
        .iter()
        .all(|setting| setting.threshold == HarmBlockThreshold::BlockNone));
}

#[tokio::test]
async fn test_generate_content_per_call_overrides() {
    let transport = ScriptedTransport::ok("ok");
    let (client, _) = client_with(transport.clone());

    let options = GenerateOptions::new()
        .system_instruction("Summarize in Japanese.")
        .model("gemini-2.5-pro")
        .temperature(0.0)
        .top_k(1)
        .response_mime_type("application/json");
    client
        .generate_content(vec!["title", "body"], options)
        .await
        .unwrap();

    let (model, request) = transport.last_request();
    assert_eq!(model, "gemini-2.5-pro");
    assert_eq!(request.generation_config.temperature, Some(0.0));
    assert_eq!(request.generation_config.top_k, Some(1));
    assert_eq!(
        request.generation_config.response_mime_type.as_deref(),
        Some("application/json")
    );
    assert_eq!(
        request.system_instruction.unwrap().text().unwrap(),
        "Summarize in Japanese."
    );

    assert_eq!(request.contents.len(), 1);
    let prompt = &request.contents[0];
    assert_eq!(prompt.role.as_deref(), Some(ROLE_USER));
    assert_eq!(prompt.parts.len(), 2);
    assert_eq!(prompt.parts[1].text.as_deref(), Some("body"));
}

#[tokio::test]
async fn test_generate_content_rejects_empty_contents() {
    let transport = ScriptedTransport::ok("ok");
    let (client, limiter) = client_with(transport.clone());

    let err = assert_err!(
        client
            .generate_content(Vec::<String>::new(), GenerateOptions::new())
            .await
    );
    assert!(matches!(err, Error::InvalidRequest(_)));
    assert_eq!(transport.calls(), 0);
    assert_eq!(limiter.available(), 10.0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_until_success() {
    let transport = ScriptedTransport::new(|n| {
        if n <= 2 {
            Err(throttled())
        } else {
            Ok(GenerateContentResponse::from_text("third time lucky"))
        }
    });
    let (client, _) = client_with(transport.clone());

    let start = Instant::now();
    let text = client
        .generate_content("prompt", GenerateOptions::new())
        .await
        .unwrap();

    assert_eq!(text, "third time lucky");
    assert_eq!(transport.calls(), 3);
    // 4s then 8s of backoff.
    assert!(start.elapsed() >= Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn test_persistent_throttling_gives_up_after_five_attempts() {
    let transport = ScriptedTransport::new(|_| Err(throttled()));
    let (client, _) = client_with(transport.clone());

    let start = Instant::now();
    let err = client
        .generate_content("prompt", GenerateOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { status: 429, .. }));
    assert_eq!(transport.calls(), 5);
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_is_not_retried() {
    let transport = ScriptedTransport::new(|_| Err(bad_request()));
    let (client, _) = client_with(transport.clone());

    let err = client
        .generate_content("prompt", GenerateOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { status: 400, .. }));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_no_retry_policy_surfaces_first_transient_error() {
    let transport = ScriptedTransport::new(|_| Err(throttled()));
    let (client, _) = client_with(transport.clone());
    let client = client.with_retry_policy(RetryPolicy::no_retry());

    let err = client
        .generate_content("prompt", GenerateOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { status: 429, .. }));
    assert_eq!(transport.calls(), 1);
    // The single attempt still spent its token.
    assert!(client.limiter().available() < 10.0);
}

#[tokio::test]
async fn test_empty_candidates_is_malformed_response() {
    let transport = ScriptedTransport::new(|_| Ok(GenerateContentResponse::default()));
    let (client, _) = client_with(transport.clone());

    let err = client
        .generate_content("prompt", GenerateOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ten_calls_pass_and_eleventh_waits_for_refill() {
    let transport = ScriptedTransport::ok("ok");
    let (client, _) = client_with(transport.clone());

    let start = Instant::now();
    for _ in 0..10 {
        client
            .generate_content("prompt", GenerateOptions::new())
            .await
            .unwrap();
    }
    assert_eq!(start.elapsed(), Duration::ZERO);

    client
        .generate_content("prompt", GenerateOptions::new())
        .await
        .unwrap();
    let waited = start.elapsed().as_secs_f64();
    assert!((5.9..=6.1).contains(&waited), "11th call waited {waited}s");
    assert_eq!(transport.calls(), 11);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_timeout_skips_remote_call() {
    let transport = ScriptedTransport::ok("ok");
    let limiter = Arc::new(RateLimiter::per_minute(1));
    let client = GeminiClient::with_transport(ClientConfig::default(), transport.clone(), limiter)
        .unwrap()
        .with_acquire_timeout(Duration::from_secs(2));

    client
        .generate_content("first", GenerateOptions::new())
        .await
        .unwrap();
    let err = client
        .generate_content("second", GenerateOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RateLimitTimeout(_)));
    assert!(!err.is_transient());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clients_share_one_limiter() {
    let transport = ScriptedTransport::ok("ok");
    let limiter = Arc::new(RateLimiter::default());
    let first =
        GeminiClient::with_transport(ClientConfig::default(), transport.clone(), limiter.clone())
            .unwrap();
    let second =
        GeminiClient::with_transport(ClientConfig::default(), transport.clone(), limiter.clone())
            .unwrap();

    let start = Instant::now();
    for _ in 0..5 {
        first.generate_content("a", GenerateOptions::new()).await.unwrap();
        second.generate_content("b", GenerateOptions::new()).await.unwrap();
    }
    assert_eq!(start.elapsed(), Duration::ZERO);

    second.generate_content("c", GenerateOptions::new()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_generation_through_shared_client() {
    let transport = ScriptedTransport::ok("ok");
    let (client, _) = client_with(transport.clone());
    let client = Arc::new(client);

    let start = Instant::now();
    let handles: Vec<_> = (0..12)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .generate_content(format!("item {i}"), GenerateOptions::new())
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }
    assert_eq!(transport.calls(), 12);
    // Two calls beyond the burst need two refills.
    assert!(start.elapsed() >= Duration::from_secs(11));
}

#[tokio::test]
async fn test_send_message_without_chat_fails_without_side_effects() {
    let transport = ScriptedTransport::ok("ok");
    let (mut client, limiter) = client_with(transport.clone());

    let err = assert_err!(client.send_message("hello").await);

    assert!(matches!(err, Error::NoActiveChat));
    assert_eq!(transport.calls(), 0);
    assert_eq!(limiter.available(), 10.0);
    assert!(client.chat().is_none());
}

#[tokio::test]
async fn test_chat_keeps_history_between_messages() {
    let transport = ScriptedTransport::counting();
    let (mut client, _) = client_with(transport.clone());

    client.create_chat(ChatOptions::new().temperature(0.3));
    assert_eq!(client.send_message("first").await.unwrap(), "reply 1");
    assert_eq!(client.send_message("second").await.unwrap(), "reply 2");

    let (_, request) = transport.last_request();
    let roles: Vec<_> = request
        .contents
        .iter()
        .map(|content| content.role.clone().unwrap())
        .collect();
    assert_eq!(roles, [ROLE_USER, ROLE_MODEL, ROLE_USER]);
    assert_eq!(request.contents[1].text().unwrap(), "reply 1");
    assert_eq!(request.generation_config.temperature, Some(0.3));
    assert!(request.tools.is_empty());
    assert!(request.safety_settings.is_empty());

    assert_eq!(client.chat().unwrap().history().len(), 4);
}

#[tokio::test]
async fn test_create_chat_replaces_session() {
    let transport = ScriptedTransport::counting();
    let (mut client, _) = client_with(transport.clone());

    client.create_chat(ChatOptions::default());
    client.send_message("first").await.unwrap();

    client.create_chat(ChatOptions::new().model("gemini-2.5-flash"));
    assert!(client.chat().unwrap().history().is_empty());
    client.send_message("fresh start").await.unwrap();

    let (model, request) = transport.last_request();
    assert_eq!(model, "gemini-2.5-flash");
    assert_eq!(request.contents.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_message_leaves_history_untouched() {
    let transport = ScriptedTransport::new(|n| {
        if n == 1 {
            Ok(GenerateContentResponse::from_text("hello back"))
        } else {
            Err(bad_request())
        }
    });
    let (mut client, _) = client_with(transport.clone());

    client.create_chat(ChatOptions::default());
    client.send_message("hello").await.unwrap();
    assert!(client.send_message("bad").await.is_err());

    assert_eq!(client.chat().unwrap().history().len(), 2);
}

#[tokio::test]
async fn test_create_chat_attaches_search_when_configured() {
    let transport = ScriptedTransport::ok("ok");
    let config = ClientConfig {
        use_search: true,
        ..ClientConfig::default()
    };
    let mut client =
        GeminiClient::with_transport(config, transport.clone(), Arc::new(RateLimiter::default()))
            .unwrap();

    client.create_chat(ChatOptions::default());
    client.send_message("what's new?").await.unwrap();

    let (_, request) = transport.last_request();
    assert_eq!(request.tools, vec![Tool::google_search()]);
}

#[tokio::test]
async fn test_chat_with_search_grounds_and_keeps_config() {
    let transport = ScriptedTransport::ok("grounded answer");
    let (mut client, _) = client_with(transport.clone());

    let text = client
        .chat_with_search("latest Rust release?", Some("gemini-2.5-flash"))
        .await
        .unwrap();

    assert_eq!(text, "grounded answer");
    assert!(!client.config().use_search);

    let (model, request) = transport.last_request();
    assert_eq!(model, "gemini-2.5-flash");
    assert_eq!(request.tools, vec![Tool::google_search()]);

    let session = client.chat().unwrap();
    assert!(session.has_search());
    assert_eq!(session.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_chat_with_search_restores_nothing_on_failure() {
    let transport = ScriptedTransport::new(|_| Err(bad_request()));
    let (mut client, _) = client_with(transport.clone());

    let err = client.chat_with_search("question", None).await.unwrap_err();

    assert!(matches!(err, Error::Api { status: 400, .. }));
    assert!(!client.config().use_search);
    assert!(client.chat().is_none());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chat_with_search_retries_whole_sequence() {
    let transport = ScriptedTransport::new(|n| {
        if n == 1 {
            Err(throttled())
        } else {
            Ok(GenerateContentResponse::from_text("after retry"))
        }
    });
    let (mut client, _) = client_with(transport.clone());

    let text = client.chat_with_search("question", None).await.unwrap();

    assert_eq!(text, "after retry");
    assert_eq!(transport.calls(), 2);
    // Each attempt starts from a fresh session holding only the question.
    for (_, request) in transport.requests() {
        assert_eq!(request.contents.len(), 1);
    }
    assert_eq!(client.chat().unwrap().history().len(), 2);
    assert!(!client.config().use_search);
}

#[tokio::test]
async fn test_send_message_after_chat_with_search_continues_conversation() {
    let transport = ScriptedTransport::counting();
    let (mut client, _) = client_with(transport.clone());

    client.chat_with_search("question", None).await.unwrap();
    client.send_message("follow-up").await.unwrap();

    let (_, request) = transport.last_request();
    assert_eq!(request.contents.len(), 3);
    assert_eq!(request.tools, vec![Tool::google_search()]);
}

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let config = ClientConfig {
        top_p: 2.0,
        ..ClientConfig::default()
    };
    let result = GeminiClient::with_transport(
        config,
        ScriptedTransport::ok("ok"),
        Arc::new(RateLimiter::default()),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}
