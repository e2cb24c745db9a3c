use super::*;
use crate::ports::conversation_logger::TurnLogEntry;
use crate::ports::llm_gateway::GatewayError;
use crate::use_cases::test_support::{
    MockToolExecutor, NameOnlySchema, RecordingStore, Reply, ScriptedGateway,
};
use roundtable_domain::event::{count, kinds};
use roundtable_domain::{ErrorCode, TurnEvent, TurnMode, validate_sequence};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct RecordingLogger {
    entries: Mutex<Vec<&'static str>>,
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, entry: TurnLogEntry) {
        self.entries.lock().unwrap().push(entry.entry_type);
    }
}

struct Harness {
    gateway: Arc<ScriptedGateway>,
    tools: Arc<MockToolExecutor>,
    store: Arc<RecordingStore>,
    logger: Arc<RecordingLogger>,
    use_case: RunTurnUseCase,
}

fn harness_with_store(replies: Vec<Reply>, store: RecordingStore) -> Harness {
    let gateway = Arc::new(ScriptedGateway::new(replies));
    let tools = Arc::new(MockToolExecutor::new());
    let store = Arc::new(store);
    let logger = Arc::new(RecordingLogger::default());
    let use_case = RunTurnUseCase::new(
        gateway.clone(),
        tools.clone(),
        Arc::new(NameOnlySchema),
        Arc::new(RoleCatalog::home_purchase().unwrap()),
        store.clone(),
    )
    .with_params(OrchestrationParams::default().with_retry_backoff(Duration::ZERO))
    .with_logger(logger.clone());
    Harness {
        gateway,
        tools,
        store,
        logger,
        use_case,
    }
}

fn harness(replies: Vec<Reply>) -> Harness {
    harness_with_store(replies, RecordingStore::new())
}

/// Event names restricted to the role framing and terminal events.
fn framing(events: &[TurnEvent]) -> Vec<&'static str> {
    kinds(events)
        .into_iter()
        .filter(|k| {
            matches!(
                *k,
                "role_start" | "role_result" | "discussion" | "error" | "done"
            )
        })
        .collect()
}

fn summary_flags(events: &[TurnEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::RoleResult { is_summary, .. } => Some(*is_summary),
            _ => None,
        })
        .collect()
}

async fn next_named(handle: &mut TurnHandle, name: &str) -> Vec<TurnEvent> {
    let mut seen = Vec::new();
    while let Some(event) = handle.next_event().await {
        let hit = event.name() == name;
        seen.push(event);
        if hit {
            break;
        }
    }
    seen
}

// ==================== Scenarios ====================

#[tokio::test]
async fn test_scenario_single_financial_role() {
    let h = harness(vec![Reply::text(
        "With a 30 year term the monthly payment is about 5300.",
    )]);
    let events = h
        .use_case
        .start(TurnRequest::new("s-1", "What is the monthly payment on a 1,000,000 loan?"))
        .collect()
        .await;

    validate_sequence(&events).unwrap();
    assert_eq!(framing(&events), vec!["role_start", "role_result", "done"]);
    assert!(count(&events, "content_delta") >= 1);
    assert_eq!(summary_flags(&events), vec![false]);
    assert_eq!(h.gateway.call_count(), 1);

    match &events[0].kind {
        EventKind::ConversationCreated {
            conversation_id,
            title,
        } => {
            assert_eq!(conversation_id, "conv-1");
            assert_eq!(title, "What is the monthly payment on...");
        }
        other => panic!("expected conversation_created, got {:?}", other),
    }
    assert_eq!(events[1].name(), "thinking_start");
}

#[tokio::test]
async fn test_scenario_two_roles_with_synthesis() {
    let h = harness(vec![
        Reply::text(r#"{"order": ["financial_advisor", "policy_expert"], "reason": "numbers first"}"#),
        Reply::text("Payment is 5300 per month."),
        Reply::text("Provident fund loans cap at 600,000."),
        Reply::text("Combine a provident fund loan with a commercial one."),
    ]);
    let events = h
        .use_case
        .start(
            TurnRequest::new("s-1", "Does the provident fund policy change my mortgage payment?")
                .with_conversation("c-b"),
        )
        .collect()
        .await;

    validate_sequence(&events).unwrap();
    assert_eq!(
        framing(&events),
        vec!["role_start", "role_result", "role_start", "role_result", "role_start", "role_result", "done"]
    );
    assert_eq!(summary_flags(&events), vec![false, false, true]);

    let started: Vec<String> = events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::RoleStart { role, .. } => Some(role.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec!["financial_advisor", "policy_expert", "purchase_consultant"]);

    // Later roles see earlier findings
    let policy_prompt = h.gateway.requests()[2].messages.last().unwrap().content.clone();
    assert!(policy_prompt.contains("Payment is 5300 per month."));
    assert_eq!(count(&events, "conversation_created"), 0);
}

#[tokio::test]
async fn test_scenario_discussion_consensus_at_round_two() {
    let h = harness(vec![
        Reply::text(r#"{"order": ["financial_advisor", "policy_expert", "market_analyst"]}"#),
        Reply::text("The payment fits."),
        Reply::text("You qualify."),
        Reply::text("Prices are soft."),
        Reply::text("no"),
        Reply::text("Use a 30 year term."),
        Reply::text("Apply for the subsidy first."),
        Reply::text("Negotiate the price down."),
        Reply::text(r#"{"conclude": true}"#),
        Reply::text("Buy after the subsidy approval and negotiate."),
    ]);
    let events = h
        .use_case
        .start(
            TurnRequest::new(
                "s-1",
                "Given the market and the policy, can I afford a mortgage?",
            )
            .with_mode(TurnMode::Discussion)
            .with_conversation("c-c"),
        )
        .collect()
        .await;

    validate_sequence(&events).unwrap();
    assert_eq!(count(&events, "discussion"), 6);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e.kind, EventKind::Discussion { round: 3, .. }))
    );
    assert_eq!(summary_flags(&events), vec![true]);
    assert_eq!(
        framing(&events)[6..],
        ["role_start", "role_result", "done"]
    );
    assert_eq!(h.gateway.remaining(), 0);

    h.use_case.flush().await;
    let entries = h.logger.entries.lock().unwrap().clone();
    assert!(entries.contains(&"discussion_terminated"));
}

#[tokio::test]
async fn test_discussion_with_one_specialist_runs_sequentially() {
    let h = harness(vec![
        Reply::text("Payment is fine."),
        Reply::text("Go ahead."),
    ]);
    let events = h
        .use_case
        .start(
            TurnRequest::new("s-1", "Should I buy? What about my loan?")
                .with_mode(TurnMode::Discussion)
                .with_conversation("c-d"),
        )
        .collect()
        .await;

    validate_sequence(&events).unwrap();
    assert_eq!(count(&events, "discussion"), 0);
    assert_eq!(summary_flags(&events), vec![false, true]);
}

// ==================== Failure paths ====================

#[tokio::test]
async fn test_fatal_transport_error_ends_with_error_then_done() {
    let h = harness(vec![Reply::error(GatewayError::Auth("401".into()))]);
    let id = ConversationId::new("c-err");
    let events = h
        .use_case
        .start(TurnRequest::new("s-1", "How much tax will I pay?").with_conversation(id.clone()))
        .collect()
        .await;

    validate_sequence(&events).unwrap();
    let last_two: Vec<_> = kinds(&events).into_iter().rev().take(2).collect();
    assert_eq!(last_two, vec!["done", "error"]);
    match &events[events.len() - 2].kind {
        EventKind::Error { code, message } => {
            assert_eq!(*code, ErrorCode::TransportAuth);
            assert!(!message.contains("401"));
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert!(h.use_case.conversation(&id).is_none());
}

#[tokio::test]
async fn test_transient_role_error_is_retried() {
    let h = harness(vec![
        Reply::error(GatewayError::RateLimited),
        Reply::text("Deed tax is 1%."),
    ]);
    let events = h
        .use_case
        .start(TurnRequest::new("s-1", "How much tax will I pay?").with_conversation("c-r"))
        .collect()
        .await;

    validate_sequence(&events).unwrap();
    assert_eq!(count(&events, "error"), 0);
    assert_eq!(h.gateway.call_count(), 2);
}

#[tokio::test]
async fn test_degraded_role_does_not_fail_turn() {
    let replies = (0..5)
        .map(|_| Reply::tool_call("calc_tax", json!({"price": 1500000})))
        .collect();
    let h = harness(replies);
    let events = h
        .use_case
        .start(TurnRequest::new("s-1", "How much tax will I pay?").with_conversation("c-g"))
        .collect()
        .await;

    validate_sequence(&events).unwrap();
    assert_eq!(count(&events, "error"), 0);
    assert_eq!(count(&events, "tool_call"), 5);
    assert_eq!(h.tools.calls().len(), 5);
    let answer = events
        .iter()
        .find_map(|e| match &e.kind {
            EventKind::RoleResult { content, .. } => Some(content.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(answer, crate::use_cases::execute_role::DEGRADED_ANSWER);
}

// ==================== Concurrency ====================

#[tokio::test]
async fn test_second_message_for_busy_conversation_is_rejected() {
    let h = harness(vec![
        Reply::text("First answer about the loan."),
        Reply::text("Third answer about the loan."),
    ]);
    let first = h
        .use_case
        .start(TurnRequest::new("s-1", "Loan options?").with_conversation("c-1"));
    let second = h
        .use_case
        .start(TurnRequest::new("s-2", "Loan options again?").with_conversation("c-1"));

    let rejected = second.collect().await;
    validate_sequence(&rejected).unwrap();
    assert_eq!(kinds(&rejected), vec!["error", "done"]);
    assert!(matches!(
        rejected[0].kind,
        EventKind::Error {
            code: ErrorCode::ConversationBusy,
            ..
        }
    ));

    let accepted = first.collect().await;
    validate_sequence(&accepted).unwrap();
    assert_eq!(count(&accepted, "error"), 0);

    // Free again once the first turn finished
    let third = h
        .use_case
        .start(TurnRequest::new("s-1", "Loan options, final?").with_conversation("c-1"))
        .collect()
        .await;
    assert_eq!(count(&third, "error"), 0);
}

#[tokio::test]
async fn test_independent_conversations_run_concurrently() {
    let h = harness(vec![Reply::Hang, Reply::text("Tax is 1%.")]);
    let mut stuck = h
        .use_case
        .start(TurnRequest::new("s-1", "Loan options?").with_conversation("c-slow"));
    let _ = next_named(&mut stuck, "role_start").await;

    let events = tokio::time::timeout(
        Duration::from_secs(5),
        h.use_case
            .start(TurnRequest::new("s-2", "How much tax?").with_conversation("c-fast"))
            .collect(),
    )
    .await
    .expect("second conversation must not wait for the first");
    validate_sequence(&events).unwrap();
    stuck.cancel();
}

#[tokio::test]
async fn test_cancellation_stops_stream_and_discards_partial_output() {
    let h = harness(vec![Reply::Hang]);
    let id = ConversationId::new("c-x");
    let mut handle = h
        .use_case
        .start(TurnRequest::new("s-1", "Loan options?").with_conversation(id.clone()));

    let seen = next_named(&mut handle, "role_start").await;
    assert_eq!(seen.last().map(TurnEvent::name), Some("role_start"));

    handle.cancel();
    let rest = handle.collect().await;
    assert_eq!(count(&rest, "done"), 0);
    assert!(rest.is_empty());

    assert!(h.use_case.conversation(&id).is_none());
    h.use_case.flush().await;
    let finals: Vec<_> = h
        .store
        .messages()
        .into_iter()
        .filter(|m| m.is_final_answer())
        .collect();
    assert!(finals.is_empty());
    assert!(h.store.load_history(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dropped_receiver_cancels_turn() {
    let h = harness(vec![Reply::Hang]);
    let mut handle = h
        .use_case
        .start(TurnRequest::new("s-1", "Loan options?").with_conversation("c-drop"));
    let _ = next_named(&mut handle, "role_start").await;
    let token = handle.cancellation_token();
    drop(handle);

    tokio::time::timeout(Duration::from_secs(5), token.cancelled())
        .await
        .expect("dropping the receiver cancels the turn");
}

// ==================== Context & persistence ====================

#[tokio::test]
async fn test_history_and_attributes_carry_to_next_turn() {
    let h = harness(vec![
        Reply::text("About 5300 a month."),
        Reply::text("Then 6100 a month."),
    ]);
    let first = h
        .use_case
        .start(
            TurnRequest::new("s-1", "Monthly payment for 1,000,000?")
                .with_conversation("c-h")
                .with_attribute("monthly_income", "20000"),
        )
        .collect()
        .await;
    validate_sequence(&first).unwrap();

    let second = h
        .use_case
        .start(TurnRequest::new("s-1", "And with a 25 year loan?").with_conversation("c-h"))
        .collect()
        .await;
    validate_sequence(&second).unwrap();

    let request = &h.gateway.requests()[1];
    assert!(request.messages[0].content.contains("- monthly_income: 20000"));
    assert_eq!(request.messages[1].content, "Monthly payment for 1,000,000?");
    assert_eq!(request.messages[2].content, "About 5300 a month.");

    let context = h.use_case.conversation(&ConversationId::new("c-h")).unwrap();
    assert_eq!(context.turns().len(), 4);
}

#[tokio::test]
async fn test_persistence_is_ordered_and_marks_final_answer() {
    let h = harness(vec![
        Reply::text(r#"["policy_expert", "financial_advisor"]"#),
        Reply::text("Policy says yes."),
        Reply::text("Payment is fine."),
        Reply::text("Go ahead."),
    ]);
    let _ = h
        .use_case
        .start(TurnRequest::new("s-1", "Policy on provident fund for my mortgage?").with_conversation("c-p"))
        .collect()
        .await;
    h.use_case.flush().await;

    let messages = h.store.messages();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            "Policy on provident fund for my mortgage?",
            "Policy says yes.",
            "Payment is fine.",
            "Go ahead."
        ]
    );
    assert!(messages[3].is_final_answer());
    assert!(!messages[1].is_final_answer());

    let history = h.store.load_history(&ConversationId::new("c-p")).await.unwrap();
    assert_eq!(history.len(), 2);

    let entries = h.logger.entries.lock().unwrap().clone();
    assert_eq!(entries.first(), Some(&"turn_started"));
    assert_eq!(entries.last(), Some(&"turn_finished"));
    assert_eq!(entries.iter().filter(|e| **e == "role_completed").count(), 3);
}

#[tokio::test]
async fn test_history_loaded_from_store_for_unknown_conversation() {
    let h = harness(vec![Reply::text("Still 5300.")]);
    h.store
        .append_message(&ConversationId::new("c-old"), Speaker::User, "Loan for 1,000,000?", json!({}))
        .await
        .unwrap();
    h.store
        .append_message(
            &ConversationId::new("c-old"),
            Speaker::Assistant,
            "About 5300.",
            json!({"final": true}),
        )
        .await
        .unwrap();

    let events = h
        .use_case
        .start(TurnRequest::new("s-1", "Is the loan payment still right?").with_conversation("c-old"))
        .collect()
        .await;
    validate_sequence(&events).unwrap();

    let request = &h.gateway.requests()[0];
    assert_eq!(request.messages[1].content, "Loan for 1,000,000?");
    assert_eq!(request.messages[2].content, "About 5300.");
}

#[tokio::test]
async fn test_store_failure_does_not_emit_conversation_created() {
    let h = harness_with_store(vec![Reply::text("Answer.")], RecordingStore::failing_create());
    let events = h
        .use_case
        .start(TurnRequest::new("s-1", "Loan options?").with_user("u-1"))
        .collect()
        .await;
    validate_sequence(&events).unwrap();
    assert_eq!(count(&events, "conversation_created"), 0);
    assert_eq!(count(&events, "error"), 0);
    assert!(h.store.created().is_empty());
}
