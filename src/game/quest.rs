//! Quest records and random quest generation.
//!
//! Quests are created when an NPC is instantiated (probabilistic chance),
//! offered during dialogue at most once per NPC, and appended to the
//! character's quest log. Completion is intentionally not implemented.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::item::LOOT_NAMES;

/// What the quest-giver is asking for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestGoal {
    DefeatEnemies { count: u32 },
    ObtainItem { name: String },
    ObtainGold { amount: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestRecord {
    pub id: String,
    pub goal: QuestGoal,
    pub description: String,
    pub quest_giver: String,
    pub reward_description: String,
}

impl QuestRecord {
    /// Short readable line for the quest log.
    pub fn display_line(&self) -> String {
        format!("[From {}] {}", self.quest_giver, self.description)
    }
}

/// Create a random quest appropriate for the theme, attributed to the
/// named quest giver.
pub fn create_random_quest(rng: &mut impl Rng, theme: &str, quest_giver: &str) -> QuestRecord {
    let id = Uuid::new_v4().to_string();
    let (goal, description, reward) = match rng.gen_range(0..3) {
        0 => {
            let count = *[3u32, 5, 7, 10].get(rng.gen_range(0..4)).unwrap_or(&3);
            (
                QuestGoal::DefeatEnemies { count },
                format!(
                    "Defeat {} enemies or monsters. Theme: {}. Return when the task is done.",
                    count, theme
                ),
                "a reward fitting your bravery".to_string(),
            )
        }
        1 => {
            let name = LOOT_NAMES[rng.gen_range(0..LOOT_NAMES.len())].to_string();
            let description = format!(
                "Find and bring back a {}. Theme: {}. They need it for their own reasons.",
                name, theme
            );
            (
                QuestGoal::ObtainItem { name },
                description,
                "payment and their gratitude".to_string(),
            )
        }
        _ => {
            let amount = *[50u32, 100, 200, 500].get(rng.gen_range(0..4)).unwrap_or(&50);
            (
                QuestGoal::ObtainGold { amount },
                format!(
                    "Obtain {} gold (or equivalent currency) and deliver it. Theme: {}. They have a debt to settle.",
                    amount, theme
                ),
                "a share of the proceeds and a favor".to_string(),
            )
        }
    };

    QuestRecord {
        id,
        goal,
        description,
        quest_giver: quest_giver.to_string(),
        reward_description: reward,
    }
}

/// Render the whole quest log, or a placeholder when it is empty.
pub fn format_quest_log(quests: &[QuestRecord]) -> String {
    if quests.is_empty() {
        return "Your quest log is empty.".to_string();
    }
    let mut out = String::from("Your quests:\n");
    for quest in quests {
        out.push_str("  - ");
        out.push_str(&quest.display_line());
        out.push('\n');
    }
    out
}
