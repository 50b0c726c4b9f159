//! Test utilities & fixtures.
//! Builds a throwaway engine: temp-dir store, scripted narrator, default
//! renderer. Tests that need specific narrative lines push them onto the
//! narrator before the turn; otherwise the fallback line keeps flows
//! moving.

use std::sync::Arc;

use lorecrawl::game::mapgen::SchematicRenderer;
use lorecrawl::game::{Engine, GameStoreBuilder, TurnOutput};
use lorecrawl::narrative::ScriptedNarrator;
use tempfile::TempDir;

pub struct TestWorld {
    pub engine: Engine,
    pub narrator: Arc<ScriptedNarrator>,
    _dir: TempDir,
}

pub fn world() -> TestWorld {
    let dir = TempDir::new().expect("tempdir");
    let store = GameStoreBuilder::new(dir.path()).open().expect("store");
    let narrator = Arc::new(ScriptedNarrator::new());
    let engine = Engine::new(
        store,
        narrator.clone(),
        Arc::new(SchematicRenderer::default()),
    );
    TestWorld {
        engine,
        narrator,
        _dir: dir,
    }
}

/// Drive a user through name, pronouns, and appearance, then enter the six
/// stats in order. Returns the reply to the final (constitution) entry.
#[allow(dead_code)]
pub async fn enter_stats(world: &TestWorld, user: &str, stats: [u8; 6]) -> TurnOutput {
    world.engine.handle(user, "").await.expect("intro");
    world.engine.handle(user, "Hero").await.expect("name");
    world.engine.handle(user, "skip").await.expect("pronouns");
    world.engine.handle(user, "skip").await.expect("appearance");

    let mut last = None;
    for value in stats {
        last = Some(
            world
                .engine
                .handle(user, &value.to_string())
                .await
                .expect("stat entry"),
        );
    }
    last.expect("six stats entered")
}

/// Full onboarding with a valid allocation, ending in the main loop.
/// Returns the confirmation reply (the first room view).
#[allow(dead_code)]
pub async fn onboard(world: &TestWorld, user: &str) -> TurnOutput {
    let summary = enter_stats(world, user, [4, 4, 4, 3, 3, 2]).await;
    assert!(summary.text.contains("Total: 20"), "got: {}", summary.text);
    world.engine.handle(user, "yes").await.expect("confirm")
}
