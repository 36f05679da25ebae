mod common;

use common::{Fixture, is_auth, is_validation};
use dreams_types::models::ConversationRef;

#[test]
fn channel_names_are_bounded() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");

    assert!(is_validation(fx.engine.channels_create(&bob.token, "", true)));
    assert!(is_validation(fx.engine.channels_create(&bob.token, &"c".repeat(21), true)));
    assert!(fx.engine.channels_create(&bob.token, &"c".repeat(20), true).is_ok());
    assert!(is_auth(fx.engine.channels_create("bogus", "general", true)));
}

#[test]
fn joining_channels() {
    let fx = Fixture::new();
    let owner = fx.user("Global", "Owner");
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");

    let public = fx.engine.channels_create(&bob.token, "public", true).unwrap();
    let private = fx.engine.channels_create(&bob.token, "private", false).unwrap();

    fx.engine.channel_join(&shaun.token, public).unwrap();
    assert!(is_validation(fx.engine.channel_join(&shaun.token, public)));
    assert!(is_validation(fx.engine.channel_join(&shaun.token, 42)));
    assert!(is_auth(fx.engine.channel_join(&shaun.token, private)));
    fx.engine.channel_join(&owner.token, private).unwrap();

    let details = fx.engine.channel_details(&shaun.token, public).unwrap();
    assert_eq!(details.name, "public");
    assert!(details.is_public);
    let handles: Vec<&str> = details.all_members.iter().map(|p| p.handle_str.as_str()).collect();
    assert_eq!(handles, vec!["bobbuilder", "shaunsheep"]);
    assert_eq!(details.owner_members.len(), 1);
    assert!(is_auth(fx.engine.channel_details(&shaun.token, private)));
}

#[test]
fn inviting_notifies_the_invitee() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let outsider = fx.user("Timmy", "Time");
    let channel = fx.engine.channels_create(&bob.token, "secret", false).unwrap();

    assert!(is_auth(fx.engine.channel_invite(&outsider.token, channel, shaun.id)));
    assert!(is_validation(fx.engine.channel_invite(&bob.token, channel, 99)));
    fx.engine.channel_invite(&bob.token, channel, shaun.id).unwrap();
    assert!(is_validation(fx.engine.channel_invite(&bob.token, channel, shaun.id)));

    let notes = fx.engine.notifications_get(&shaun.token).unwrap();
    assert_eq!(notes[0].notification_message, "bobbuilder added you to secret");
    assert_eq!(notes[0].channel_id, channel as i64);
    assert_eq!(notes[0].dm_id, -1);
}

#[test]
fn dm_name_lists_sorted_handles() {
    let fx = Fixture::new();
    let shaun = fx.user("Shaun", "Sheep");
    let bob = fx.user("Bob", "Builder");
    let timmy = fx.user("Timmy", "Time");

    let (dm_id, name) = fx.engine.dm_create(&shaun.token, &[bob.id, timmy.id]).unwrap();
    assert_eq!(name, "bobbuilder, shaunsheep, timmytime");
    assert!(is_validation(fx.engine.dm_create(&shaun.token, &[99])));

    let details = fx.engine.dm_details(&bob.token, dm_id).unwrap();
    assert_eq!(details.name, name);
    // Creator first.
    assert_eq!(details.members[0].u_id, shaun.id);
    assert_eq!(details.members.len(), 3);

    let notes = fx.engine.notifications_get(&timmy.token).unwrap();
    assert_eq!(notes[0].notification_message, format!("shaunsheep added you to {}", name));
    assert_eq!(notes[0].dm_id, dm_id as i64);
    assert!(fx.engine.notifications_get(&shaun.token).unwrap().is_empty());
}

#[test]
fn only_the_creator_removes_a_dm() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let outsider = fx.user("Timmy", "Time");
    let (dm_id, _) = fx.engine.dm_create(&bob.token, &[shaun.id]).unwrap();
    let dm = ConversationRef::Dm(dm_id);
    let id = fx.engine.send(&shaun.token, dm, "hi").unwrap();

    assert!(is_auth(fx.engine.dm_details(&outsider.token, dm_id)));
    assert!(is_auth(fx.engine.dm_remove(&shaun.token, dm_id)));
    fx.engine.dm_remove(&bob.token, dm_id).unwrap();
    assert!(is_validation(fx.engine.dm_remove(&bob.token, dm_id)));

    assert!(is_validation(fx.engine.send(&shaun.token, dm, "anyone?")));
    assert!(is_validation(fx.engine.paginate(&shaun.token, dm, 0)));
    assert!(is_validation(fx.engine.edit(&shaun.token, id, "edit")));
}

#[test]
fn notifications_keep_the_latest_twenty() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let channel = fx.channel(&bob, "general");
    fx.engine.channel_join(&shaun.token, 1).unwrap();

    for i in 0..25 {
        fx.engine
            .send(&bob.token, channel, &format!("@shaunsheep {}", i))
            .unwrap();
    }
    let texts = fx.notification_texts(&shaun);
    assert_eq!(texts.len(), 20);
    assert_eq!(texts[0], "bobbuilder tagged you in general: @shaunsheep 24");
    assert_eq!(texts[19], "bobbuilder tagged you in general: @shaunsheep 5");
}

#[test]
fn adding_channel_owners() {
    let fx = Fixture::new();
    let owner = fx.user("Global", "Owner");
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let timmy = fx.user("Timmy", "Time");
    let channel = fx.channel(&bob, "general");
    let channel_id = channel.channel_id() as u64;
    fx.engine.channel_join(&shaun.token, channel_id).unwrap();
    fx.engine.channel_join(&timmy.token, channel_id).unwrap();
    let by_bob = fx.engine.send(&bob.token, channel, "bob's").unwrap();

    assert!(is_validation(fx.engine.channel_addowner(&bob.token, 42, shaun.id)));
    assert!(is_validation(fx.engine.channel_addowner(&bob.token, channel_id, 99)));
    assert!(is_validation(fx.engine.channel_addowner(&bob.token, channel_id, owner.id)));
    assert!(is_validation(fx.engine.channel_addowner(&bob.token, channel_id, bob.id)));
    assert!(is_auth(fx.engine.channel_addowner(&timmy.token, channel_id, shaun.id)));
    assert!(is_auth(fx.engine.pin(&shaun.token, by_bob)));

    fx.engine.channel_addowner(&bob.token, channel_id, shaun.id).unwrap();
    let details = fx.engine.channel_details(&shaun.token, channel_id).unwrap();
    let owners: Vec<u64> = details.owner_members.iter().map(|p| p.u_id).collect();
    assert_eq!(owners, vec![bob.id, shaun.id]);

    // A second owner carries the owner's authority over other people's messages.
    fx.engine.pin(&shaun.token, by_bob).unwrap();
    fx.engine.edit(&shaun.token, by_bob, "moderated").unwrap();

    // A global owner may promote without owning the channel.
    fx.engine.channel_addowner(&owner.token, channel_id, timmy.id).unwrap();
}

#[test]
fn inviting_into_a_dm() {
    let fx = Fixture::new();
    let bob = fx.user("Bob", "Builder");
    let shaun = fx.user("Shaun", "Sheep");
    let timmy = fx.user("Timmy", "Time");
    let (dm_id, name) = fx.engine.dm_create(&bob.token, &[shaun.id]).unwrap();
    let dm = ConversationRef::Dm(dm_id);

    assert!(is_validation(fx.engine.dm_invite(&bob.token, 42, timmy.id)));
    assert!(is_validation(fx.engine.dm_invite(&bob.token, dm_id, 99)));
    assert!(is_auth(fx.engine.dm_invite(&timmy.token, dm_id, timmy.id)));
    assert!(is_auth(fx.engine.send(&timmy.token, dm, "hello?")));

    fx.engine.dm_invite(&shaun.token, dm_id, timmy.id).unwrap();
    assert!(is_validation(fx.engine.dm_invite(&bob.token, dm_id, timmy.id)));

    let details = fx.engine.dm_details(&timmy.token, dm_id).unwrap();
    assert_eq!(details.name, name);
    assert_eq!(details.members.len(), 3);
    assert_eq!(details.members[0].u_id, bob.id);
    fx.engine.send(&timmy.token, dm, "hello!").unwrap();

    let notes = fx.engine.notifications_get(&timmy.token).unwrap();
    assert_eq!(notes[0].notification_message, "shaunsheep added you to bobbuilder, shaunsheep");
    assert_eq!(notes[0].dm_id, dm_id as i64);
    assert_eq!(notes[0].channel_id, -1);

    // The creator still owns the DM.
    assert!(is_auth(fx.engine.dm_remove(&shaun.token, dm_id)));
}
