//! Per-player session dispatch: onboarding and the main game loop.
//!
//! Every request is stateless. [`Engine::handle`] rehydrates the full
//! character + world grid from the store, dispatches on the persisted
//! stage tag, persists after any mutation, and returns the reply. There
//! is no process-lifetime session map; the document store is the only
//! source of truth between requests.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::game::errors::GameError;
use crate::game::grid::MoveOutcome;
use crate::game::mapgen::RoomRenderer;
use crate::game::quest::format_quest_log;
use crate::game::storage::GameStore;
use crate::game::types::{Character, Direction, Stage, STAT_MAX, STAT_POINT_BUDGET};
use crate::logutil::escape_log;
use crate::narrative::Narrator;

/// Reply for one request: narrative text plus optional rendered layers.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub text: String,
    pub map: Option<String>,
    pub minimap: Option<String>,
}

impl TurnOutput {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            map: None,
            minimap: None,
        }
    }
}

/// Parsed main-loop command. Matching is case-insensitive; `Take`/`Drop`/
/// `Say` carry their argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MainCommand {
    Redisplay,
    Restart,
    Help,
    Look,
    Inventory,
    Quests,
    Take(String),
    Drop(String),
    Move(Direction),
    DescribeNpc,
    Say(String),
    Unknown,
}

impl MainCommand {
    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        match lower.as_str() {
            "" | "none" => return MainCommand::Redisplay,
            "restart" => return MainCommand::Restart,
            "help" => return MainCommand::Help,
            "look" => return MainCommand::Look,
            "inventory" | "inv" | "i" => return MainCommand::Inventory,
            "quests" | "q" => return MainCommand::Quests,
            "describe npc" => return MainCommand::DescribeNpc,
            _ => {}
        }

        for prefix in ["pick up ", "pickup ", "take ", "grab "] {
            if lower.starts_with(prefix) {
                return MainCommand::Take(trimmed[prefix.len()..].trim().to_string());
            }
        }
        if lower.starts_with("drop ") {
            return MainCommand::Drop(trimmed[5..].trim().to_string());
        }
        if lower == "say" {
            return MainCommand::Say(String::new());
        }
        if lower.starts_with("say ") {
            return MainCommand::Say(trimmed[4..].trim().to_string());
        }
        if let Some(direction) = Direction::parse(&lower) {
            return MainCommand::Move(direction);
        }
        MainCommand::Unknown
    }
}

/// The six stat-entry stages in onboarding order.
const STAT_STAGES: [(Stage, &str); 6] = [
    (Stage::GetStrength, "Strength"),
    (Stage::GetIntelligence, "Intelligence"),
    (Stage::GetDexterity, "Dexterity"),
    (Stage::GetCharisma, "Charisma"),
    (Stage::GetWisdom, "Wisdom"),
    (Stage::GetConstitution, "Constitution"),
];

fn stat_index(stage: Stage) -> Option<usize> {
    STAT_STAGES.iter().position(|(s, _)| *s == stage)
}

fn stat_value(character: &Character, index: usize) -> u8 {
    let s = &character.scores;
    [
        s.strength,
        s.intelligence,
        s.dexterity,
        s.charisma,
        s.wisdom,
        s.constitution,
    ][index]
}

fn set_stat_value(character: &mut Character, index: usize, value: u8) {
    let s = &mut character.scores;
    match index {
        0 => s.strength = value,
        1 => s.intelligence = value,
        2 => s.dexterity = value,
        3 => s.charisma = value,
        4 => s.wisdom = value,
        _ => s.constitution = value,
    }
}

/// The game engine: storage, narrative service, and map renderer wired
/// together behind a single per-request entry point.
pub struct Engine {
    store: GameStore,
    narrator: Arc<dyn Narrator>,
    renderer: Arc<dyn RoomRenderer>,
}

impl Engine {
    pub fn new(
        store: GameStore,
        narrator: Arc<dyn Narrator>,
        renderer: Arc<dyn RoomRenderer>,
    ) -> Self {
        Self {
            store,
            narrator,
            renderer,
        }
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    /// Handle one request for a user: rehydrate, dispatch by stage,
    /// persist, reply.
    pub async fn handle(&self, user_id: &str, input: &str) -> Result<TurnOutput, GameError> {
        debug!("user {}: {}", user_id, escape_log(input));

        let mut character = if self.store.character_exists(user_id)? {
            self.store.get_character(user_id)?
        } else {
            info!("no character for user {}, creating one", user_id);
            let character = Character::new();
            self.store.put_character(user_id, &character)?;
            character
        };

        let stage = character.stage;
        let output = match stage {
            Stage::Starting => self.do_starting(user_id, &mut character).await?,
            Stage::GetName => self.do_get_name(user_id, &mut character, input)?,
            Stage::GetPronouns => self.do_get_pronouns(user_id, &mut character, input)?,
            Stage::GetAppearance => self.do_get_appearance(user_id, &mut character, input)?,
            Stage::GetStrength
            | Stage::GetIntelligence
            | Stage::GetDexterity
            | Stage::GetCharisma
            | Stage::GetWisdom
            | Stage::GetConstitution => self.do_get_stat(user_id, &mut character, input)?,
            Stage::ConfirmStats => self.do_confirm_stats(user_id, &mut character, input).await?,
            Stage::MainLoop => self.do_main_loop(user_id, &mut character, input).await?,
            Stage::Restart => {
                self.store.delete_character(user_id)?;
                let mut fresh = Character::new();
                self.do_starting(user_id, &mut fresh).await?
            }
            Stage::Unknown => {
                warn!("user {} has an unknown stage tag", user_id);
                if input.trim().eq_ignore_ascii_case("restart") {
                    character.stage = Stage::Restart;
                    self.store.put_character(user_id, &character)?;
                    TurnOutput::text_only("Restarting Game. Type in anything to continue.")
                } else {
                    TurnOutput::text_only(
                        "Error: Unknown game section. Try 'restart'.",
                    )
                }
            }
        };
        Ok(output)
    }

    /// Introduction: greet the player, let the narrative service pick the
    /// era, and ask for a name.
    async fn do_starting(
        &self,
        user_id: &str,
        character: &mut Character,
    ) -> Result<TurnOutput, GameError> {
        let greeting = self
            .narrator
            .generate(
                "Greet the player as our new AI-narrated text adventure. Don't give any \
                 instructions to the user.",
            )
            .await?;
        let theme = self
            .narrator
            .generate(
                "Pick a theme for this game to take place in. Make the answer very short, \
                 just a word or two, like medieval or sci-fi, but be creative.",
            )
            .await?;

        character.theme = Some(theme.clone());
        character.stage = Stage::GetName;
        self.store.put_character(user_id, character)?;

        let text = format!(
            "{}\n\nThis game takes place in the {} era.\nWhat should we call your character?",
            greeting, theme
        );
        Ok(TurnOutput::text_only(text))
    }

    fn do_get_name(
        &self,
        user_id: &str,
        character: &mut Character,
        input: &str,
    ) -> Result<TurnOutput, GameError> {
        let name = input.trim();
        if name.is_empty() {
            return Ok(TurnOutput::text_only("Please enter a valid name."));
        }
        character.name = Some(name.to_string());
        character.stage = Stage::GetPronouns;
        self.store.put_character(user_id, character)?;
        Ok(TurnOutput::text_only(format!(
            "Welcome, {}!\n\nBefore stats, let's customize your character.\nWhat pronouns \
             should NPCs use for you? (examples: they/them, she/her, he/him, or type 'skip')",
            name
        )))
    }

    fn do_get_pronouns(
        &self,
        user_id: &str,
        character: &mut Character,
        input: &str,
    ) -> Result<TurnOutput, GameError> {
        let pronouns = input.trim();
        if !pronouns.is_empty() && !pronouns.eq_ignore_ascii_case("skip") {
            character.appearance.pronouns = Some(pronouns.to_string());
        }
        character.stage = Stage::GetAppearance;
        self.store.put_character(user_id, character)?;
        Ok(TurnOutput::text_only(
            "In one sentence, describe your character's appearance (hair/eyes/outfit/anything \
             you want).\n(Or type 'skip')",
        ))
    }

    fn do_get_appearance(
        &self,
        user_id: &str,
        character: &mut Character,
        input: &str,
    ) -> Result<TurnOutput, GameError> {
        let summary = input.trim();
        if !summary.is_empty() && !summary.eq_ignore_ascii_case("skip") {
            character.appearance.summary = Some(summary.to_string());
        }
        character.stage = Stage::GetStrength;
        self.store.put_character(user_id, character)?;
        Ok(TurnOutput::text_only(format!(
            "Great. Now for stats.\n\nYou have {budget} stat points to allocate across \
             Strength, Intelligence, Dexterity, Charisma, Wisdom, Constitution.\nEach stat \
             must be between 0 and {max}, and the total must equal {budget}.\n\nEnter your \
             Strength:",
            budget = STAT_POINT_BUDGET,
            max = STAT_MAX
        )))
    }

    /// Shared handler for the six stat-entry stages. Validates range and
    /// the running sum over the stats entered so far this pass; the
    /// closing stage additionally requires the exact budget.
    fn do_get_stat(
        &self,
        user_id: &str,
        character: &mut Character,
        input: &str,
    ) -> Result<TurnOutput, GameError> {
        let index = stat_index(character.stage).expect("caller matched a stat stage");
        let (_, stat_name) = STAT_STAGES[index];

        let value: u8 = match input.trim().parse::<i64>() {
            Ok(v) if (0..=STAT_MAX as i64).contains(&v) => v as u8,
            Ok(v) if v < 0 => {
                return Ok(TurnOutput::text_only(format!(
                    "{} cannot be negative. Please enter a number between 0 and {}.",
                    stat_name, STAT_MAX
                )))
            }
            Ok(_) => {
                return Ok(TurnOutput::text_only(format!(
                    "{} cannot exceed {}. Please enter a number between 0 and {}.",
                    stat_name, STAT_MAX, STAT_MAX
                )))
            }
            Err(_) => {
                return Ok(TurnOutput::text_only(format!(
                    "Please enter a valid number for {} (0-{}).",
                    stat_name, STAT_MAX
                )))
            }
        };

        set_stat_value(character, index, value);
        // Sum only the stats entered so far this pass; later fields may
        // hold stale values from a discarded allocation.
        let running: u8 = (0..=index).map(|i| stat_value(character, i)).sum();

        let closing = index == STAT_STAGES.len() - 1;
        if closing {
            if running != STAT_POINT_BUDGET {
                character.scores.reset();
                character.stage = Stage::GetStrength;
                self.store.put_character(user_id, character)?;
                return Ok(TurnOutput::text_only(format!(
                    "Error: Your total is {} points. You must allocate exactly {}.\n\nPlease \
                     enter your stats again.\nEnter your Strength:",
                    running, STAT_POINT_BUDGET
                )));
            }
            character.stage = Stage::ConfirmStats;
            self.store.put_character(user_id, character)?;
            let s = &character.scores;
            return Ok(TurnOutput::text_only(format!(
                "Your stat allocation:\nStrength: {}\nIntelligence: {}\nDexterity: {}\n\
                 Charisma: {}\nWisdom: {}\nConstitution: {}\nTotal: {} points\n\nType yes to \
                 confirm, or no to change your stats:",
                s.strength, s.intelligence, s.dexterity, s.charisma, s.wisdom, s.constitution, running
            )));
        }

        if running > STAT_POINT_BUDGET {
            character.scores.reset();
            character.stage = Stage::GetStrength;
            self.store.put_character(user_id, character)?;
            return Ok(TurnOutput::text_only(format!(
                "Error: Your stats exceed {} points.\n\nPlease enter your stats again.\nEnter \
                 your Strength:",
                STAT_POINT_BUDGET
            )));
        }

        character.stage = STAT_STAGES[index + 1].0;
        self.store.put_character(user_id, character)?;
        let remaining = STAT_POINT_BUDGET - running;
        Ok(TurnOutput::text_only(format!(
            "{} set to {}.\nYou have {} points remaining.\nEnter your {}:",
            stat_name,
            value,
            remaining,
            STAT_STAGES[index + 1].1
        )))
    }

    /// Commit or discard the stat allocation. On commit the starting
    /// dungeon template is materialized, the first room described, and
    /// the main loop begins.
    async fn do_confirm_stats(
        &self,
        user_id: &str,
        character: &mut Character,
        input: &str,
    ) -> Result<TurnOutput, GameError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => {
                // A small branching dungeon with a clear path from the
                // starting cell.
                for (x, y) in [(0, 0), (0, 1), (1, 1), (0, 2), (1, 0), (2, 0), (2, 1)] {
                    character.grid.materialize(x, y)?;
                }

                let profile = character.profile();
                let view = character
                    .grid
                    .describe_current(self.narrator.as_ref(), self.renderer.as_ref(), &profile)
                    .await?;

                character.stage = Stage::MainLoop;
                self.store.put_character(user_id, character)?;
                info!("user {} confirmed stats, entering main loop", user_id);

                let text = format!(
                    "Character created!\nLevel: {}\nHP: {}\nExperience: {}\n\n{}",
                    character.level,
                    character.health,
                    character.experience,
                    view.text()
                );
                Ok(TurnOutput {
                    text,
                    map: Some(view.map),
                    minimap: Some(view.minimap),
                })
            }
            "no" | "n" => {
                character.scores.reset();
                character.stage = Stage::GetStrength;
                self.store.put_character(user_id, character)?;
                Ok(TurnOutput::text_only(
                    "Please enter your stats again.\nEnter your Strength:",
                ))
            }
            _ => Ok(TurnOutput::text_only(
                "Please type yes to confirm your stats, or no to change them:",
            )),
        }
    }

    /// Main gameplay loop command dispatch.
    async fn do_main_loop(
        &self,
        user_id: &str,
        character: &mut Character,
        input: &str,
    ) -> Result<TurnOutput, GameError> {
        match MainCommand::parse(input) {
            MainCommand::Redisplay | MainCommand::Look => {
                let view = self.describe_and_persist(user_id, character).await?;
                Ok(view)
            }
            MainCommand::Restart => {
                character.stage = Stage::Restart;
                self.store.put_character(user_id, character)?;
                Ok(TurnOutput::text_only(
                    "Restarting Game. Type in anything to continue.",
                ))
            }
            MainCommand::Help => Ok(TurnOutput::text_only(
                "Valid Commands:\n\
                 restart - Restarts the game\n\
                 help - this menu\n\
                 look - redisplay the current location\n\
                 north, south, east, west - Move to a new location\n\
                 inventory (inv, i) - show your inventory\n\
                 quests (q) - show your quest log\n\
                 take <item> / drop <item> - pick up or drop an item\n\
                 describe npc - describes the npc in the room\n\
                 say <text> - talk to the npc in the room",
            )),
            MainCommand::Inventory => {
                let mut text = String::new();
                if character.inventory.is_empty() {
                    text.push_str("Your inventory is empty.");
                } else {
                    text.push_str("Your inventory:\n");
                    for item in &character.inventory {
                        text.push_str(&format!("  - {}\n", item.display_line()));
                    }
                }
                Ok(TurnOutput::text_only(text))
            }
            MainCommand::Quests => Ok(TurnOutput::text_only(format_quest_log(&character.quests))),
            MainCommand::Take(name) => {
                let Character {
                    grid, inventory, ..
                } = character;
                let message = grid.pickup(&name, inventory);
                self.store.put_character(user_id, character)?;
                Ok(TurnOutput::text_only(message))
            }
            MainCommand::Drop(name) => {
                let Character {
                    grid, inventory, ..
                } = character;
                let message = grid.drop_item(&name, inventory);
                self.store.put_character(user_id, character)?;
                Ok(TurnOutput::text_only(message))
            }
            MainCommand::Move(direction) => self.do_move(user_id, character, direction).await,
            MainCommand::DescribeNpc => {
                let text = match character.grid.current_room().and_then(|r| r.npc.as_ref()) {
                    Some(npc) => npc.describe(),
                    None => "There is no one here to describe.".to_string(),
                };
                Ok(TurnOutput::text_only(text))
            }
            MainCommand::Say(text) => self.do_say(user_id, character, &text).await,
            MainCommand::Unknown => Ok(TurnOutput::text_only(
                "Invalid input. Type help for options.",
            )),
        }
    }

    /// Movement, gated by the room NPC's pass check when one is present.
    async fn do_move(
        &self,
        user_id: &str,
        character: &mut Character,
        direction: Direction,
    ) -> Result<TurnOutput, GameError> {
        let profile = character.profile();
        if let Some(npc) = character
            .grid
            .current_room_mut()
            .and_then(|r| r.npc.as_mut())
        {
            let allowed = npc.allow_pass(self.narrator.as_ref(), &profile).await?;
            if !allowed {
                let name = npc.name.clone();
                self.store.put_character(user_id, character)?;
                return Ok(TurnOutput::text_only(format!(
                    "{} steps in your way and won't let you pass. Maybe keep talking to them.",
                    name
                )));
            }
        }

        match character.grid.step(direction) {
            MoveOutcome::Blocked => {
                // Pass-check audit notes may have changed NPC history.
                self.store.put_character(user_id, character)?;
                Ok(TurnOutput::text_only("Can't move that way!"))
            }
            MoveOutcome::Moved => self.describe_and_persist(user_id, character).await,
        }
    }

    /// Dialogue with the current room's NPC, including the at-most-once
    /// quest offer.
    async fn do_say(
        &self,
        user_id: &str,
        character: &mut Character,
        utterance: &str,
    ) -> Result<TurnOutput, GameError> {
        let profile = character.profile();
        let held_ids: Vec<String> = character.quests.iter().map(|q| q.id.clone()).collect();

        let Some(npc) = character
            .grid
            .current_room_mut()
            .and_then(|r| r.npc.as_mut())
        else {
            return Ok(TurnOutput::text_only("There is no one here to talk to."));
        };

        let reply = npc
            .talk(self.narrator.as_ref(), &profile, utterance, &held_ids)
            .await?;
        if let Some(quest) = reply.offered_quest {
            character.add_quest(quest);
        }
        self.store.put_character(user_id, character)?;
        Ok(TurnOutput::text_only(reply.text))
    }

    /// Describe the current room (generating content on first visit) and
    /// persist, since description can mutate the room.
    async fn describe_and_persist(
        &self,
        user_id: &str,
        character: &mut Character,
    ) -> Result<TurnOutput, GameError> {
        let profile = character.profile();
        let view = character
            .grid
            .describe_current(self.narrator.as_ref(), self.renderer.as_ref(), &profile)
            .await?;
        self.store.put_character(user_id, character)?;
        Ok(TurnOutput {
            text: view.text(),
            map: Some(view.map),
            minimap: Some(view.minimap),
        })
    }
}
