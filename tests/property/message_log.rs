//! Property-based tests for the message log.
//!
//! Uses proptest to verify, for arbitrary sequences of operations:
//! 1. Identifiers are unique and strictly increasing in log order.
//! 2. Appends land at the end, in call order.
//! 3. An empty filter returns the whole log; any filter returns an
//!    order-preserving subset whose members match the query.
//! 4. Toggling the same reaction twice leaves the log unchanged.
//! 5. Delivery never moves a message back to `Sending`.

use proptest::prelude::*;

use chattersphere::chat::search::SearchView;
use chattersphere::chat::store::MessageLog;
use chattersphere_proto::message::{MessageDraft, MessageStatus, Timestamp};

#[derive(Debug, Clone)]
enum Op {
    SendUser(String),
    Reply(String, String),
    Deliver(usize),
    Toggle(usize, String, String),
    Reset,
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{1,24}"
}

fn arb_emoji() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["👍", "❤️", "😂", "🔥"]).prop_map(str::to_string)
}

fn arb_actor() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["dana", "Alice", "Bob", "Charlie"]).prop_map(str::to_string)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_text().prop_map(Op::SendUser),
        2 => (arb_actor(), arb_text()).prop_map(|(s, t)| Op::Reply(s, t)),
        2 => any::<usize>().prop_map(Op::Deliver),
        2 => (any::<usize>(), arb_emoji(), arb_actor()).prop_map(|(i, e, a)| Op::Toggle(i, e, a)),
        1 => Just(Op::Reset),
    ]
}

fn apply(log: &mut MessageLog, op: &Op, now: Timestamp) {
    match op {
        Op::SendUser(text) => {
            log.append(MessageDraft::user("dana", text.clone()), now);
        }
        Op::Reply(sender, text) => {
            log.append(MessageDraft::simulated(sender.clone(), text.clone()), now);
        }
        Op::Deliver(i) => {
            let id = log.messages()[i % log.len()].id;
            log.mark_delivered(id);
        }
        Op::Toggle(i, emoji, actor) => {
            let id = log.messages()[i % log.len()].id;
            log.toggle_reaction(id, emoji, actor);
        }
        Op::Reset => {
            log.reset(now);
        }
    }
}

fn build(ops: &[Op]) -> MessageLog {
    let mut log = MessageLog::new(Timestamp::from_millis(0));
    for (t, op) in ops.iter().enumerate() {
        apply(&mut log, op, Timestamp::from_millis(t as u64 + 1));
    }
    log
}

proptest! {
    #[test]
    fn ids_are_unique_and_increasing(ops in prop::collection::vec(arb_op(), 0..64)) {
        let log = build(&ops);
        prop_assert!(!log.is_empty());
        for pair in log.messages().windows(2) {
            prop_assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn appends_land_at_the_end(
        ops in prop::collection::vec(arb_op(), 0..32),
        texts in prop::collection::vec(arb_text(), 1..8),
    ) {
        let mut log = build(&ops);
        let before = log.messages().to_vec();
        for text in &texts {
            let appended = log.append(MessageDraft::user("dana", text.clone()), Timestamp::from_millis(999));
            prop_assert_eq!(&log.messages()[log.len() - 1], &appended);
        }
        prop_assert_eq!(&log.messages()[..before.len()], &before[..]);
        let tail: Vec<_> = log.messages()[before.len()..].iter().map(|m| m.text.clone()).collect();
        prop_assert_eq!(tail, texts);
    }

    #[test]
    fn empty_filter_is_the_whole_log(ops in prop::collection::vec(arb_op(), 0..48)) {
        let log = build(&ops);
        let all: Vec<_> = log.messages().iter().collect();
        prop_assert_eq!(log.filter(""), all);
    }

    #[test]
    fn filter_is_an_ordered_matching_subset(
        ops in prop::collection::vec(arb_op(), 0..48),
        query in "[a-zA-Z]{1,3}",
    ) {
        let log = build(&ops);
        let folded = query.to_lowercase();
        let results = log.filter(&query);

        for pair in results.windows(2) {
            prop_assert!(pair[0].id < pair[1].id);
        }
        for m in &results {
            prop_assert!(log.get(m.id).is_some());
            prop_assert!(
                m.text.to_lowercase().contains(&folded) || m.sender.to_lowercase().contains(&folded)
            );
        }
        let expected = log
            .messages()
            .iter()
            .filter(|m| m.text.to_lowercase().contains(&folded) || m.sender.to_lowercase().contains(&folded))
            .count();
        prop_assert_eq!(results.len(), expected);
    }

    #[test]
    fn search_view_agrees_with_filter(
        ops in prop::collection::vec(arb_op(), 0..48),
        query in "[a-zA-Z]{0,3}",
    ) {
        let log = build(&ops);
        let mut view = SearchView::new();
        view.set_query(query.clone());
        let first = view.results(&log);
        prop_assert_eq!(&first, &log.filter(&query));
        prop_assert!(view.is_fresh(&log));
        prop_assert_eq!(view.results(&log), first);
    }

    #[test]
    fn double_toggle_is_identity(
        ops in prop::collection::vec(arb_op(), 0..48),
        index in any::<usize>(),
        emoji in arb_emoji(),
        actor in arb_actor(),
    ) {
        let mut log = build(&ops);
        let before = log.messages().to_vec();
        let id = before[index % before.len()].id;

        log.toggle_reaction(id, &emoji, &actor);
        log.toggle_reaction(id, &emoji, &actor);

        prop_assert_eq!(log.messages(), &before[..]);
    }

    #[test]
    fn delivered_stays_delivered(ops in prop::collection::vec(arb_op(), 0..48), index in any::<usize>()) {
        let mut log = build(&ops);
        let id = log.messages()[index % log.len()].id;
        log.mark_delivered(id);
        prop_assert!(!log.mark_delivered(id));
        prop_assert_eq!(log.get(id).map(|m| m.status), Some(MessageStatus::Delivered));
    }
}
