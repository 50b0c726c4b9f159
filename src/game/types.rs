use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::grid::WorldGrid;
use crate::game::item::ItemRecord;
use crate::game::quest::QuestRecord;

pub const CHARACTER_SCHEMA_VERSION: u8 = 1;
pub const GRID_SCHEMA_VERSION: u8 = 1;

/// Total ability points a character allocates during onboarding.
pub const STAT_POINT_BUDGET: u8 = 20;
/// Upper bound for a single ability score.
pub const STAT_MAX: u8 = 10;

/// Cardinal movement directions. The grid is strictly 2D, so this is the
/// whole set: north/south move along the y axis, east/west along x.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Offset applied to (x, y). North is +y, matching a map drawn with
    /// north at the top and row 0 at the bottom.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::East => "East",
            Direction::West => "West",
        }
    }

    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }
}

/// The six core ability scores, each 0-10. The committed total must equal
/// [`STAT_POINT_BUDGET`]; intermediate totals during onboarding stay at or
/// below it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AbilityScores {
    pub strength: u8,
    pub intelligence: u8,
    pub dexterity: u8,
    pub charisma: u8,
    pub wisdom: u8,
    pub constitution: u8,
}

impl AbilityScores {
    pub fn total(&self) -> u8 {
        self.strength
            + self.intelligence
            + self.dexterity
            + self.charisma
            + self.wisdom
            + self.constitution
    }

    /// Discard all provisional values. Used when the closing stat handler
    /// rejects the allocation and onboarding loops back to strength entry.
    pub fn reset(&mut self) {
        *self = AbilityScores::default();
    }

    /// Derived negotiation modifiers used to bias NPC dialogue. Integer
    /// division on purpose: these are coarse, explainable numbers.
    pub fn persuasion(&self) -> u8 {
        self.charisma + self.intelligence / 3 + self.wisdom / 3
    }

    pub fn intimidation(&self) -> u8 {
        self.strength + self.constitution / 2
    }

    pub fn awareness(&self) -> u8 {
        self.wisdom + self.intelligence / 2
    }
}

/// Freeform character customization captured during onboarding. All fields
/// optional; the player can skip any of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appearance {
    pub summary: Option<String>,
    pub pronouns: Option<String>,
    #[serde(default)]
    pub hair: Option<String>,
    #[serde(default)]
    pub eyes: Option<String>,
    #[serde(default)]
    pub outfit: Option<String>,
    #[serde(default)]
    pub feature: Option<String>,
}

/// Where a player currently is in the onboarding/main-loop state machine.
/// Persisted on the character document, so the tag survives between
/// stateless requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Starting,
    GetName,
    GetPronouns,
    GetAppearance,
    GetStrength,
    GetIntelligence,
    GetDexterity,
    GetCharisma,
    GetWisdom,
    GetConstitution,
    ConfirmStats,
    MainLoop,
    Restart,
    /// Catch-all for tags written by a newer build. Dispatch surfaces a
    /// diagnostic message instead of crashing.
    #[serde(other)]
    Unknown,
}

/// Snapshot of the player details NPC prompts need. Cloned out of the
/// character before the world grid is borrowed mutably, so prompt building
/// never has to reach back into the character.
#[derive(Debug, Clone, Default)]
pub struct PlayerProfile {
    pub name: String,
    pub pronouns: Option<String>,
    pub appearance_summary: Option<String>,
    pub scores: AbilityScores,
    pub theme: String,
}

impl PlayerProfile {
    /// One-line profile paragraph embedded in NPC prompts.
    pub fn prompt_text(&self) -> String {
        let mut parts = vec![format!("Player name: {}.", self.name)];
        if let Some(pronouns) = &self.pronouns {
            parts.push(format!("Player pronouns: {}.", pronouns));
        }
        if let Some(summary) = &self.appearance_summary {
            parts.push(format!("Player appearance: {}.", summary));
        }
        let s = &self.scores;
        parts.push(format!(
            "Player stats (0-10): STR {}, INT {}, DEX {}, CHA {}, WIS {}, CON {}.",
            s.strength, s.intelligence, s.dexterity, s.charisma, s.wisdom, s.constitution
        ));
        parts.join(" ")
    }
}

/// A player character: identity, progression, inventory, quest log, and the
/// owned world grid. One exists per user; it is rebuilt from the document
/// store on every request and written back after any mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: Option<String>,
    /// Unused placeholders carried for the character sheet.
    pub race: Option<String>,
    pub class: Option<String>,
    pub level: u32,
    /// Experience 0-99; rolls into a level at 100. See [`Character::gain_experience`].
    pub experience: u32,
    pub health: u32,
    pub mana: u32,
    pub scores: AbilityScores,
    pub appearance: Appearance,
    pub inventory: Vec<ItemRecord>,
    pub quests: Vec<QuestRecord>,
    pub stage: Stage,
    /// Era string chosen by the narrative service once at game start.
    pub theme: Option<String>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
    /// The world grid is persisted as its own document keyed by character
    /// id, never inline with the character document.
    #[serde(skip)]
    pub grid: WorldGrid,
}

impl Character {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: None,
            race: None,
            class: None,
            level: 1,
            experience: 0,
            health: 100,
            mana: 60,
            scores: AbilityScores::default(),
            appearance: Appearance::default(),
            inventory: Vec::new(),
            quests: Vec::new(),
            stage: Stage::Starting,
            theme: None,
            created_at: Utc::now(),
            schema_version: CHARACTER_SCHEMA_VERSION,
            grid: WorldGrid::default(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("the player")
    }

    pub fn theme_str(&self) -> &str {
        self.theme.as_deref().unwrap_or("fantasy")
    }

    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile {
            name: self.display_name().to_string(),
            pronouns: self.appearance.pronouns.clone(),
            appearance_summary: self.appearance.summary.clone(),
            scores: self.scores,
            theme: self.theme_str().to_string(),
        }
    }

    /// Add experience, rolling over into levels at 100 points.
    pub fn gain_experience(&mut self, amount: u32) {
        self.experience += amount;
        while self.experience >= 100 {
            self.experience -= 100;
            self.level += 1;
        }
    }

    pub fn has_quest(&self, quest_id: &str) -> bool {
        self.quests.iter().any(|q| q.id == quest_id)
    }

    /// Append a quest to the log unless an entry with the same id exists.
    pub fn add_quest(&mut self, quest: QuestRecord) {
        if !self.has_quest(&quest.id) {
            self.quests.push(quest);
        }
    }

    pub fn add_item(&mut self, item: ItemRecord) {
        self.inventory.push(item);
    }

    /// Remove and return the first inventory item whose name matches
    /// case-insensitively. No mutation when nothing matches.
    pub fn remove_item(&mut self, item_name: &str) -> Option<ItemRecord> {
        let pos = self
            .inventory
            .iter()
            .position(|i| i.name.eq_ignore_ascii_case(item_name))?;
        Some(self.inventory.remove(pos))
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::new()
    }
}
