mod common;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use common::{Fixture, is_auth, is_validation};
use dreams_types::events::DreamsEvent;
use dreams_types::models::{ConversationRef, MessageId};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[tokio::test(start_paused = true)]
async fn message_appears_only_after_send_time() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let channel = fx.channel(&bob, "general");

    let id = fx.engine.send_later(&bob.token, channel, "from the past", now() + 2).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(fx.db.find_message(id).unwrap().is_none());
    assert!(fx.engine.paginate(&bob.token, channel, 0).unwrap().messages.is_empty());

    tokio::time::sleep(Duration::from_secs(3)).await;
    let message = fx.db.find_message(id).unwrap().unwrap();
    assert_eq!(message.body, "from the past");
    assert_eq!(message.author_id, bob.id);
    let page = fx.engine.paginate(&bob.token, channel, 0).unwrap();
    assert_eq!(page.messages[0].message_id, id);
    assert_eq!(fx.engine.scheduler().pending().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn send_later_preconditions() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let outsider = fx.user("Timmy", "Time");
    let channel = fx.channel(&bob, "general");

    assert!(is_auth(fx.engine.send_later("bogus", channel, "x", now() + 5)));
    assert!(is_validation(fx.engine.send_later(&bob.token, ConversationRef::Channel(9), "x", now() + 5)));
    assert!(is_validation(fx.engine.send_later(&bob.token, channel, &"x".repeat(1001), now() + 5)));
    assert!(is_validation(fx.engine.send_later(&bob.token, channel, "x", now() - 5)));
    assert!(is_auth(fx.engine.send_later(&outsider.token, channel, "x", now() + 5)));
    assert_eq!(fx.engine.scheduler().pending().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_delivery_never_materializes() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let channel = fx.channel(&bob, "general");
    fx.engine.channel_join(&shaun.token, 1).unwrap();

    let id = fx.engine.send_later(&bob.token, channel, "never mind", now() + 2).unwrap();
    assert!(is_auth(fx.engine.cancel_send_later(&shaun.token, id)));
    fx.engine.cancel_send_later(&bob.token, id).unwrap();
    assert!(is_validation(fx.engine.cancel_send_later(&bob.token, id)));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(fx.db.find_message(id).unwrap().is_none());

    // The reserved identifier is not handed out again.
    let next = fx.engine.send(&bob.token, channel, "hello").unwrap();
    assert!(next > id);
}

#[tokio::test(start_paused = true)]
async fn delivery_into_a_removed_dm_is_dead_lettered() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let dm = fx.dm(&bob, &[&shaun]);
    let mut rx = fx.engine.subscribe();

    let id = fx.engine.send_later(&shaun.token, dm, "see you", now() + 2).unwrap();
    fx.engine.dm_remove(&bob.token, dm.dm_id() as u64).unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(fx.db.find_message(id).unwrap().is_none());
    let letters = fx.engine.dispatcher().dead_letters();
    assert_eq!(letters.len(), 1);
    assert!(matches!(
        &letters[0],
        DreamsEvent::DeliveryFailed { message_id: Some(m), conversation, .. } if *m == id && *conversation == dm
    ));
    assert!(matches!(rx.try_recv().unwrap(), DreamsEvent::DeliveryFailed { .. }));
}

#[tokio::test(start_paused = true)]
async fn deferred_messages_are_scanned_for_mentions() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let dm = fx.dm(&bob, &[&shaun]);

    fx.engine.send_later(&bob.token, dm, "@shaunsheep wake up", now() + 2).unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let texts = fx.notification_texts(&shaun);
    assert_eq!(texts[0], "bobbuilder tagged you in bobbuilder, shaunsheep: @shaunsheep wake up");
}

#[tokio::test(start_paused = true)]
async fn clear_cancels_pending_work() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let channel = fx.channel(&bob, "general");

    fx.engine.send_later(&bob.token, channel, "a", now() + 2).unwrap();
    fx.engine.standup_start(&bob.token, 1, 2).unwrap();
    assert_eq!(fx.engine.scheduler().pending().unwrap(), 2);

    fx.engine.clear().unwrap();
    assert_eq!(fx.engine.scheduler().pending().unwrap(), 0);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(fx.db.get_user(bob.id).unwrap().is_none());
    assert!(fx.engine.dispatcher().dead_letters().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deliveries_interleave_with_live_sends() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let channel = fx.channel(&bob, "general");
    fx.engine.channel_join(&shaun.token, 1).unwrap();

    let fire_at = now() + 1;
    let mut deferred = Vec::new();
    for i in 0..20 {
        deferred.push(fx.engine.send_later(&bob.token, channel, &format!("later {}", i), fire_at).unwrap());
    }

    // Keep sending until well past the moment the deliveries fire.
    let deadline = Instant::now() + Duration::from_millis(2500);
    let mut senders = Vec::new();
    for token in [bob.token.clone(), shaun.token.clone(), bob.token.clone(), shaun.token.clone()] {
        let engine = fx.engine.clone();
        senders.push(tokio::spawn(async move {
            let mut sent = Vec::new();
            while Instant::now() < deadline {
                sent.push(engine.send(&token, channel, "now").unwrap());
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            sent
        }));
    }
    let mut live = Vec::new();
    for sender in senders {
        live.extend(sender.await.unwrap());
    }
    while fx.engine.scheduler().pending().unwrap() > 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let mut ids: HashSet<MessageId> = HashSet::new();
    for &id in live.iter().chain(deferred.iter()) {
        assert!(ids.insert(id), "message id {} handed out twice", id);
    }

    let mut listed = HashSet::new();
    let mut start = 0;
    loop {
        let page = fx.engine.paginate(&shaun.token, channel, start).unwrap();
        for view in &page.messages {
            assert!(listed.insert(view.message_id));
            let canonical = fx.db.find_message(view.message_id).unwrap().unwrap();
            assert_eq!(view.message, canonical.body);
        }
        if page.end == -1 {
            break;
        }
        start = page.end;
    }
    assert_eq!(listed, ids);
    assert!(fx.engine.dispatcher().dead_letters().is_empty());
}
