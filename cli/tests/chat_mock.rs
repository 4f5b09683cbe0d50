//! Drives `run_chat` with the mock model and in-memory terminal input.

use std::collections::HashMap;
use std::path::PathBuf;

use cli::{build_graph, make_llm, run_chat, Flow, MOCK_REPLY};
use config::Settings;
use switchyard::memory::RunnableConfig;
use switchyard::{RunOutcome, HUMAN_INPUT_PROMPT};

fn settings(extra: &[(&str, &str)]) -> Settings {
    let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("switchyard")
        .join("assets");
    let mut env: HashMap<String, String> = HashMap::new();
    env.insert(
        "SWITCHYARD_ASSETS_DIR".into(),
        assets.to_string_lossy().into_owned(),
    );
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    Settings::from_lookup(|k| env.get(k).cloned()).unwrap()
}

/// **Scenario**: The email flow prompts the user until they approve.
#[tokio::test]
async fn email_flow_ends_on_approve() {
    let settings = settings(&[]);
    let graph = build_graph(Flow::Email, &settings, make_llm(&settings, true))
        .await
        .unwrap();
    let mut out = Vec::new();
    let outcome = run_chat(
        &graph,
        RunnableConfig::default().with_thread_id("t-email"),
        Some("I need a meeting invite".to_string()),
        &b"\nmore details please\nI approve\n"[..],
        &mut out,
    )
    .await
    .unwrap()
    .unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(_)));
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches(MOCK_REPLY).count(), 2);
    assert_eq!(text.matches(HUMAN_INPUT_PROMPT).count(), 2);
    assert!(text.ends_with("[conversation finished]\n"));
}

/// **Scenario**: A conversation left waiting at EOF is continued by the next call with the same thread.
#[tokio::test]
async fn paused_conversation_continues() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(&[(
        "SWITCHYARD_CHECKPOINT_DIR",
        dir.path().to_str().unwrap(),
    )]);
    let config = RunnableConfig::default().with_thread_id("t-product");

    let graph = build_graph(Flow::Product, &settings, make_llm(&settings, true))
        .await
        .unwrap();
    let mut out = Vec::new();
    let first = run_chat(&graph, config.clone(), Some("a sofa".into()), &b""[..], &mut out)
        .await
        .unwrap()
        .unwrap();
    assert!(first.is_suspended());

    let graph = build_graph(Flow::Product, &settings, make_llm(&settings, true))
        .await
        .unwrap();
    let mut out = Vec::new();
    let second = run_chat(&graph, config, Some("grey please".into()), &b"quit\n"[..], &mut out)
        .await
        .unwrap()
        .unwrap();
    assert!(second.is_suspended());
    assert_eq!(second.state().messages().len(), 4);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches(MOCK_REPLY).count(), 1);
}

/// **Scenario**: Quitting before the first message runs nothing.
#[tokio::test]
async fn quit_before_first_message() {
    let settings = settings(&[]);
    let graph = build_graph(Flow::Product, &settings, make_llm(&settings, true))
        .await
        .unwrap();
    let mut out = Vec::new();
    let outcome = run_chat(
        &graph,
        RunnableConfig::default().with_thread_id("t-quit"),
        None,
        &b"exit\n"[..],
        &mut out,
    )
    .await
    .unwrap();
    assert!(outcome.is_none());
}

/// **Scenario**: With no settings at all both flows build from the bundled assets, and
/// the configured step limit leaves the email message cap in place.
#[tokio::test]
async fn default_settings_use_bundled_assets() {
    let settings = Settings::from_lookup(|_| None).unwrap();
    assert!(settings.assets_dir.is_none());

    let product = build_graph(Flow::Product, &settings, make_llm(&settings, true))
        .await
        .unwrap();
    assert_eq!(product.limits().max_steps, settings.max_steps);

    let email = build_graph(Flow::Email, &settings, make_llm(&settings, true))
        .await
        .unwrap();
    assert_eq!(email.limits().max_steps, settings.max_steps);
    assert_eq!(
        email.limits().max_messages,
        Some(switchyard::samples::EMAIL_MAX_MESSAGES)
    );
}
