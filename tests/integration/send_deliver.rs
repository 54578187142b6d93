//! Integration tests for sending a message and its delivery confirmation.
//!
//! Runs on a paused Tokio clock, so sleeping in a test advances virtual time
//! and fires any timers that fall due in between.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use chattersphere::chat::reply::ReplyPolicy;
use chattersphere::chat::{ChatEvent, ChatSession, SendError, SessionConfig};
use chattersphere::clock::ManualClock;
use chattersphere::scheduler::TimerKey;
use chattersphere_proto::message::{MessageId, MessageStatus, Origin, Timestamp, ValidationError};
use chattersphere_proto::presence::Participant;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn quiet_config() -> SessionConfig {
    SessionConfig {
        replies: ReplyPolicy {
            probability: 0.0,
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
        StdRng::seed_from_u64(11),
    )
    .unwrap()
}

fn drain(events: &mut mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn hello_is_sending_then_delivered_after_500ms() {
    let (session, mut events) = start(quiet_config());

    let sent = session.send("hello").unwrap();
    assert_eq!(sent.text, "hello");
    assert_eq!(sent.sender, "dana");
    assert_eq!(sent.origin, Origin::User);
    assert_eq!(sent.status, MessageStatus::Sending);
    assert!(sent.reactions.is_empty());

    let log = session.messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1], sent);

    tokio::time::sleep(Duration::from_millis(490)).await;
    assert_eq!(session.message(sent.id).unwrap().status, MessageStatus::Sending);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.message(sent.id).unwrap().status, MessageStatus::Delivered);
    // Delivery changes status only; no new message is created.
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.pending_timers(), 0);

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![
            ChatEvent::MessageAppended(sent.clone()),
            ChatEvent::StatusChanged {
                message_id: sent.id,
                status: MessageStatus::Delivered,
            },
            ChatEvent::Notification {
                message_id: sent.id
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn blank_message_is_rejected_without_side_effects() {
    let (session, mut events) = start(quiet_config());

    for text in ["", "   ", "\n\t "] {
        assert_eq!(
            session.send(text),
            Err(SendError::Validation(ValidationError::Empty))
        );
    }
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.user_message_count(), 0);
    assert_eq!(session.pending_timers(), 0);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn length_limit_counts_characters() {
    let (session, _events) = start(quiet_config());

    let too_long = "é".repeat(501);
    assert_eq!(
        session.send(&too_long),
        Err(SendError::Validation(ValidationError::TooLong {
            len: 501,
            max: 500
        }))
    );
    assert_eq!(session.messages().len(), 1);

    let at_limit = "é".repeat(500);
    assert!(session.send(&at_limit).is_ok());
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn mark_delivered_is_idempotent() {
    let (session, mut events) = start(quiet_config());
    let sent = session.send("ping").unwrap();
    drain(&mut events);

    assert!(session.mark_delivered(sent.id));
    assert!(!session.is_timer_pending(&TimerKey::Delivery(sent.id)));
    assert!(!session.mark_delivered(sent.id));
    assert!(!session.mark_delivered(MessageId::from_raw(999)));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.message(sent.id).unwrap().status, MessageStatus::Delivered);

    let status_events = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, ChatEvent::StatusChanged { .. }))
        .count();
    assert_eq!(status_events, 1);
}

#[tokio::test(start_paused = true)]
async fn each_message_gets_its_own_delivery_timer() {
    let (session, _events) = start(quiet_config());

    let first = session.send("one").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let second = session.send("two").unwrap();
    assert_eq!(session.pending_timers(), 2);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(session.message(first.id).unwrap().status, MessageStatus::Delivered);
    assert_eq!(session.message(second.id).unwrap().status, MessageStatus::Sending);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.message(second.id).unwrap().status, MessageStatus::Delivered);
    assert!(first.id < second.id);
    assert_eq!(session.user_message_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn muted_session_emits_no_notifications() {
    let (session, mut events) = start(SessionConfig {
        sound_enabled: false,
        ..quiet_config()
    });
    session.send("shh").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let events = drain(&mut events);
    assert!(
        events
            .iter()
            .all(|e| !matches!(e, ChatEvent::Notification { .. }))
    );
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ChatEvent::StatusChanged { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_session_cancels_delivery() {
    let (session, mut events) = start(quiet_config());
    session.send("bye").unwrap();
    drop(session);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let late = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, ChatEvent::StatusChanged { .. }))
        .count();
    assert_eq!(late, 0);
}

#[tokio::test(start_paused = true)]
async fn configured_limit_cannot_exceed_500_characters() {
    let (session, _events) = start(SessionConfig {
        max_message_chars: 10_000,
        ..quiet_config()
    });

    assert_eq!(
        session.send(&"a".repeat(900)),
        Err(SendError::Validation(ValidationError::TooLong {
            len: 900,
            max: 500
        }))
    );
    assert_eq!(session.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn configured_limit_can_be_tighter() {
    let (session, _events) = start(SessionConfig {
        max_message_chars: 10,
        ..quiet_config()
    });

    assert!(session.send(&"a".repeat(10)).is_ok());
    assert_eq!(
        session.send(&"a".repeat(11)),
        Err(SendError::Validation(ValidationError::TooLong { len: 11, max: 10 }))
    );
}
