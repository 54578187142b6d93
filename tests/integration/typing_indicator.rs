//! Integration tests for the typing indicator and its idle timer.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use chattersphere::chat::reply::ReplyPolicy;
use chattersphere::chat::{ChatEvent, ChatSession, SessionConfig};
use chattersphere::clock::{Clock, ManualClock};
use chattersphere::scheduler::TimerKey;
use chattersphere_proto::message::Timestamp;
use chattersphere_proto::presence::Participant;

const START: u64 = 1_700_000_000_000;

fn start() -> (ChatSession, mpsc::Receiver<ChatEvent>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START)));
    let config = SessionConfig {
        replies: ReplyPolicy {
            probability: 0.0,
            ..ReplyPolicy::default()
        },
        ..SessionConfig::default()
    };
    let shared_clock: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;
    let (session, events) = ChatSession::with_sources(
        Participant::new("dana").unwrap(),
        config,
        shared_clock,
        StdRng::seed_from_u64(0),
    )
    .unwrap();
    (session, events, clock)
}

fn typing_events(events: &mut mpsc::Receiver<ChatEvent>) -> Vec<bool> {
    std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|e| match e {
            ChatEvent::TypingChanged { is_active } => Some(is_active),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn typing_clears_after_one_idle_second() {
    let (session, mut events, _clock) = start();

    session.keystroke();
    assert!(session.is_typing());

    tokio::time::sleep(Duration::from_millis(990)).await;
    assert!(session.is_typing());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!session.is_typing());
    assert!(!session.is_timer_pending(&TimerKey::TypingIdle));

    assert_eq!(typing_events(&mut events), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn keystrokes_reschedule_instead_of_stacking() {
    let (session, mut events, _clock) = start();

    session.keystroke();
    tokio::time::sleep(Duration::from_millis(600)).await;
    session.keystroke();
    assert_eq!(session.pending_timers(), 1);

    // 1200ms after the first keystroke, 600ms after the second.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(session.is_typing());

    tokio::time::sleep(Duration::from_millis(410)).await;
    assert!(!session.is_typing());

    // Only one rising and one falling edge.
    assert_eq!(typing_events(&mut events), vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn sending_clears_typing_immediately() {
    let (session, mut events, _clock) = start();

    session.keystroke();
    session.send("done typing").unwrap();

    assert!(!session.is_typing());
    assert!(!session.is_timer_pending(&TimerKey::TypingIdle));
    assert_eq!(typing_events(&mut events), vec![true, false]);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(typing_events(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn state_records_the_last_keystroke() {
    let (session, _events, clock) = start();
    assert_eq!(session.typing_state().last_keystroke_at, None);

    session.keystroke();
    clock.advance(Duration::from_millis(250));
    session.keystroke();

    let state = session.typing_state();
    assert!(state.is_active);
    assert_eq!(
        state.last_keystroke_at,
        Some(Timestamp::from_millis(START + 250))
    );
}

#[tokio::test(start_paused = true)]
async fn reset_clears_typing_and_its_timer() {
    let (session, _events, _clock) = start();
    session.keystroke();

    session.reset();
    assert!(!session.is_typing());
    assert_eq!(session.pending_timers(), 0);
}
