//! Main-loop gameplay: inventory, quests, NPC dialogue, and pass checks,
//! all driven through the engine so every turn round-trips the store.

mod common;

use common::{onboard, world, TestWorld};
use lorecrawl::game::item::{ItemRecord, Rarity};
use lorecrawl::game::quest::{QuestGoal, QuestRecord};

fn marble() -> ItemRecord {
    ItemRecord {
        name: "Glass Marble".to_string(),
        rarity: Rarity::Common,
        value: 2,
        description: "a chipped glass marble".to_string(),
    }
}

/// Drop an item into the user's current room behind the engine's back.
fn plant_item(w: &TestWorld, user: &str, item: ItemRecord) {
    let mut character = w.engine.store().get_character(user).unwrap();
    character
        .grid
        .current_room_mut()
        .expect("current room")
        .add_item(item);
    w.engine.store().put_character(user, &character).unwrap();
}

#[tokio::test]
async fn take_and_drop_round_trip_through_the_store() {
    let w = world();
    onboard(&w, "alice").await;
    plant_item(&w, "alice", marble());

    let taken = w.engine.handle("alice", "take glass marble").await.unwrap();
    assert!(taken.text.contains("You picked up: Glass Marble"));

    let inventory = w.engine.handle("alice", "inventory").await.unwrap();
    assert!(inventory.text.contains("Glass Marble"));

    let character = w.engine.store().get_character("alice").unwrap();
    assert!(character.inventory.iter().any(|i| i.name == "Glass Marble"));
    assert!(!character
        .grid
        .current_room()
        .unwrap()
        .items
        .iter()
        .any(|i| i.name == "Glass Marble"));

    let dropped = w.engine.handle("alice", "drop glass marble").await.unwrap();
    assert!(dropped.text.contains("You dropped: Glass Marble"));

    let character = w.engine.store().get_character("alice").unwrap();
    assert!(character.inventory.is_empty() || !character
        .inventory
        .iter()
        .any(|i| i.name == "Glass Marble"));
    assert!(character
        .grid
        .current_room()
        .unwrap()
        .items
        .iter()
        .any(|i| i.name == "Glass Marble"));
}

#[tokio::test]
async fn taking_from_an_empty_room_fails_without_mutation() {
    let w = world();
    onboard(&w, "alice").await;

    // Empty the room so the name cannot match seeded loot.
    let mut character = w.engine.store().get_character("alice").unwrap();
    character.grid.current_room_mut().unwrap().items.clear();
    w.engine.store().put_character("alice", &character).unwrap();

    let reply = w.engine.handle("alice", "take torch").await.unwrap();
    assert!(reply.text.contains("no"), "got: {}", reply.text);

    let after = w.engine.store().get_character("alice").unwrap();
    assert!(after.inventory.is_empty());
    assert!(after.grid.current_room().unwrap().items.is_empty());
}

#[tokio::test]
async fn dropping_something_you_do_not_hold_fails() {
    let w = world();
    onboard(&w, "alice").await;
    let reply = w.engine.handle("alice", "drop moonstone").await.unwrap();
    assert!(reply.text.contains("don't have"), "got: {}", reply.text);
}

fn gatekeeping_quest() -> QuestRecord {
    QuestRecord {
        id: "quest-test-1".to_string(),
        goal: QuestGoal::ObtainGold { amount: 100 },
        description: "Bring back 100 gold for the toll chest.".to_string(),
        quest_giver: "Gatekeeper".to_string(),
        reward_description: "a worn iron key".to_string(),
    }
}

/// Rig the current room's NPC so the next talk always offers this quest.
fn arm_quest(w: &TestWorld, user: &str, quest: QuestRecord) {
    let mut character = w.engine.store().get_character(user).unwrap();
    let npc = character
        .grid
        .current_room_mut()
        .expect("current room")
        .npc
        .as_mut()
        .expect("room npc");
    npc.quest_to_offer = Some(quest);
    npc.offer_chance = 1.0;
    w.engine.store().put_character(user, &character).unwrap();
}

#[tokio::test]
async fn npc_offers_a_quest_at_most_once() {
    let w = world();
    onboard(&w, "alice").await;
    arm_quest(&w, "alice", gatekeeping_quest());

    let first = w.engine.handle("alice", "say hello").await.unwrap();
    assert!(first.text.contains("I have a task for you"), "got: {}", first.text);

    let log = w.engine.handle("alice", "quests").await.unwrap();
    assert!(log.text.contains("toll chest"));

    let second = w.engine.handle("alice", "say hello again").await.unwrap();
    assert!(!second.text.contains("I have a task for you"));

    let character = w.engine.store().get_character("alice").unwrap();
    assert_eq!(character.quests.len(), 1);
    assert!(character
        .grid
        .current_room()
        .unwrap()
        .npc
        .as_ref()
        .unwrap()
        .quest_to_offer
        .is_none());
}

#[tokio::test]
async fn dialogue_is_remembered_across_turns() {
    let w = world();
    onboard(&w, "alice").await;

    w.narrator.push_line("State your business.");
    let reply = w.engine.handle("alice", "say open the gate").await.unwrap();
    assert!(reply.text.contains("says State your business."));

    let character = w.engine.store().get_character("alice").unwrap();
    let npc = character.grid.current_room().unwrap().npc.as_ref().unwrap();
    assert!(npc.conversation.contains(&"open the gate".to_string()));
    assert!(npc.conversation.contains(&"State your business.".to_string()));
}

#[tokio::test]
async fn npc_can_block_movement() {
    let w = world();
    onboard(&w, "alice").await;

    w.narrator.push_line("No. Turn around.");
    let reply = w.engine.handle("alice", "north").await.unwrap();
    assert!(reply.text.contains("won't let you pass"), "got: {}", reply.text);

    let character = w.engine.store().get_character("alice").unwrap();
    assert_eq!(character.grid.cursor(), (0, 0));
    // The failed attempt is recorded in the NPC's history.
    let npc = character.grid.current_room().unwrap().npc.as_ref().unwrap();
    assert!(npc
        .conversation
        .iter()
        .any(|line| line.contains("was blocked")));
}

#[tokio::test]
async fn npc_allows_movement_on_anything_but_no() {
    let w = world();
    onboard(&w, "alice").await;

    w.narrator.push_line("Hmm, fine, go through.");
    let reply = w.engine.handle("alice", "north").await.unwrap();
    assert!(!reply.text.contains("won't let you pass"));

    let character = w.engine.store().get_character("alice").unwrap();
    assert_eq!(character.grid.cursor(), (0, 1));
}

#[tokio::test]
async fn describe_npc_uses_the_room_npc() {
    let w = world();
    onboard(&w, "alice").await;

    let character = w.engine.store().get_character("alice").unwrap();
    let npc_name = character
        .grid
        .current_room()
        .unwrap()
        .npc
        .as_ref()
        .unwrap()
        .name
        .clone();

    let reply = w.engine.handle("alice", "describe npc").await.unwrap();
    assert!(reply.text.contains(&npc_name));
    assert!(reply.text.contains("looks like"));
}

#[tokio::test]
async fn help_and_unknown_input() {
    let w = world();
    onboard(&w, "alice").await;

    let help = w.engine.handle("alice", "help").await.unwrap();
    assert!(help.text.contains("restart"));
    assert!(help.text.contains("north, south, east, west"));
    assert!(help.text.contains("say <text>"));

    let unknown = w.engine.handle("alice", "xyzzy").await.unwrap();
    assert!(unknown.text.contains("Invalid input"));
}

#[tokio::test]
async fn empty_quest_log_reads_empty() {
    let w = world();
    onboard(&w, "alice").await;
    let reply = w.engine.handle("alice", "quests").await.unwrap();
    assert!(reply.text.contains("quest log is empty"), "got: {}", reply.text);
}
