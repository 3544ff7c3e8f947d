//! Willowmere interaction core.
//!
//! The shared engine behind every NPC in the game: dialogue-condition
//! resolution, quest/event-chain tracking, and the behavior state machine.
//! Headless by design: the game binary owns rendering, input, assets, and
//! save-file I/O, and talks to this crate through resources and events.
//!
//! Domains layer leaf-first: `conditions` → `chains` → `dialogue`, with
//! `behavior` alongside, coupled only through the shared contract and
//! interaction signals.

pub mod shared;

pub mod behavior;
pub mod chains;
pub mod conditions;
pub mod dialogue;
pub mod save;

use bevy::prelude::*;

/// Everything a host app needs: chain tracking, dialogue resolution, and
/// NPC behavior, with their resources and events registered.
pub struct InteractionCorePlugin;

impl Plugin for InteractionCorePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            chains::ChainPlugin,
            dialogue::DialoguePlugin,
            behavior::BehaviorPlugin,
        ));
    }
}
