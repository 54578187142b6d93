//! Integration tests for reaction toggling and session reset.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use chattersphere::chat::reply::ReplyPolicy;
use chattersphere::chat::{ChatEvent, ChatSession, SessionConfig};
use chattersphere::clock::ManualClock;
use chattersphere_proto::message::{Origin, Timestamp, WELCOME_TEXT};
use chattersphere_proto::presence::Participant;

const HEART: &str = "\u{2764}\u{fe0f}";
const FIRE: &str = "\u{1f525}";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config_with_probability(probability: f64) -> SessionConfig {
    SessionConfig {
        replies: ReplyPolicy {
            probability,
            ..ReplyPolicy::default()
        },
        ..SessionConfig::default()
    }
}

fn start(config: SessionConfig) -> (ChatSession, mpsc::Receiver<ChatEvent>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_700_000_000_000)));
    ChatSession::with_sources(
        Participant::new("dana").unwrap(),
        config,
        clock,
        StdRng::seed_from_u64(3),
    )
    .unwrap()
}

fn drain(events: &mut mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn heart_from_alice_toggles_on_and_off() {
    let (session, mut events) = start(config_with_probability(0.0));
    let sent = session.send("hi").unwrap();
    drain(&mut events);

    assert!(session.toggle_reaction(sent.id, HEART, "Alice"));
    let reactions = session.message(sent.id).unwrap().reactions;
    assert_eq!(
        reactions.reactors(HEART),
        Some(&BTreeSet::from(["Alice".to_string()]))
    );

    assert!(session.toggle_reaction(sent.id, HEART, "Alice"));
    let reactions = session.message(sent.id).unwrap().reactions;
    assert!(reactions.reactors(HEART).is_none());
    assert!(reactions.is_empty());

    let changes = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, ChatEvent::ReactionsChanged { .. }))
        .count();
    assert_eq!(changes, 2);
}

#[tokio::test(start_paused = true)]
async fn actors_are_tracked_per_emoji() {
    let (session, _events) = start(config_with_probability(0.0));
    let sent = session.send("hi").unwrap();

    session.toggle_reaction(sent.id, HEART, "Alice");
    session.toggle_reaction(sent.id, HEART, "Bob");
    session.react(sent.id, FIRE);

    let reactions = session.message(sent.id).unwrap().reactions;
    assert_eq!(reactions.len(), 2);
    assert!(reactions.contains(HEART, "Alice"));
    assert!(reactions.contains(HEART, "Bob"));
    assert!(reactions.contains(FIRE, "dana"));

    session.toggle_reaction(sent.id, HEART, "Alice");
    let reactions = session.message(sent.id).unwrap().reactions;
    assert_eq!(
        reactions.reactors(HEART),
        Some(&BTreeSet::from(["Bob".to_string()]))
    );
}

#[tokio::test(start_paused = true)]
async fn reactions_survive_delivery() {
    let (session, _events) = start(config_with_probability(0.0));
    let sent = session.send("hi").unwrap();
    session.react(sent.id, FIRE);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let message = session.message(sent.id).unwrap();
    assert!(message.reactions.contains(FIRE, "dana"));
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn reset_leaves_only_a_welcome_message() {
    let (session, mut events) = start(config_with_probability(1.0));

    let mut sent = Vec::new();
    for i in 0..5 {
        sent.push(session.send(&format!("message {i}")).unwrap());
    }
    session.toggle_reaction(sent[0].id, HEART, "Alice");
    session.toggle_reaction(sent[1].id, FIRE, "Bob");
    session.react(sent[2].id, HEART);
    session.keystroke();
    assert!(session.pending_timers() > 0);
    drain(&mut events);

    let welcome = session.reset();

    let log = session.messages();
    assert_eq!(log, vec![welcome.clone()]);
    assert_eq!(welcome.text, WELCOME_TEXT);
    assert_eq!(welcome.origin, Origin::System);
    assert!(welcome.reactions.is_empty());
    assert_eq!(session.pending_timers(), 0);
    assert_eq!(session.user_message_count(), 0);
    assert!(!session.is_typing());

    let events = drain(&mut events);
    assert!(events.contains(&ChatEvent::SessionReset { welcome }));
}

#[tokio::test(start_paused = true)]
async fn timers_armed_before_reset_never_fire() {
    let (session, mut events) = start(config_with_probability(1.0));
    let old = session.send("before").unwrap();
    session.reset();
    drain(&mut events);

    // Past every delivery and reply window.
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(session.messages().len(), 1);
    assert!(session.message(old.id).is_none());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn identifiers_keep_increasing_after_reset() {
    let (session, _events) = start(config_with_probability(0.0));
    let before = session.send("before").unwrap();
    let welcome = session.reset();
    let after = session.send("after").unwrap();

    assert!(welcome.id > before.id);
    assert!(after.id > welcome.id);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn switch_participant_starts_a_fresh_session() {
    let (session, _events) = start(config_with_probability(0.0));
    session.send("as dana").unwrap();

    session
        .switch_participant(Participant::new("erin").unwrap())
        .unwrap();

    assert_eq!(session.participant().name(), "erin");
    assert_eq!(session.messages().len(), 1);
    let sent = session.send("as erin").unwrap();
    assert_eq!(sent.sender, "erin");
}
