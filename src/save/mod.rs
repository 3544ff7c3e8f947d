//! Save document for the interaction core.
//!
//! The core performs no I/O. `capture` assembles a serializable snapshot
//! of every save-scoped store; the host embeds it in its own save file
//! (any serde format) and hands it back through `restore_stores` on load.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::*;

pub const SAVE_VERSION: u32 = 1;

/// Persisted slice of one NPC's behavior: state and pose only. Timestamps
/// are rebased on restore; a loaded NPC re-enters its state fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSnapshot {
    pub state: String,
    pub frame: usize,
    pub facing: Facing,
}

/// Everything the interaction core contributes to a save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionSaveData {
    pub version: u32,
    pub chains: ChainStore,
    pub friendship: FriendshipLedger,
    pub masteries: Masteries,
    pub behaviors: HashMap<NpcId, BehaviorSnapshot>,
}

impl InteractionSaveData {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Serialization failed: {}", e))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Deserialization failed: {}", e))
    }
}

/// Snapshot the save-scoped stores and every live NPC's behavior.
pub fn capture<'a>(
    chains: &ChainStore,
    friendship: &FriendshipLedger,
    masteries: &Masteries,
    behaviors: impl IntoIterator<Item = (&'a Npc, &'a NpcBehavior)>,
) -> InteractionSaveData {
    InteractionSaveData {
        version: SAVE_VERSION,
        chains: chains.clone(),
        friendship: friendship.clone(),
        masteries: masteries.clone(),
        behaviors: behaviors
            .into_iter()
            .map(|(npc, behavior)| {
                (
                    npc.id.clone(),
                    BehaviorSnapshot {
                        state: behavior.state.clone(),
                        frame: behavior.frame,
                        facing: behavior.facing,
                    },
                )
            })
            .collect(),
    }
}

/// Replace the save-scoped stores with the document's contents.
pub fn restore_stores(
    data: &InteractionSaveData,
    chains: &mut ChainStore,
    friendship: &mut FriendshipLedger,
    masteries: &mut Masteries,
) {
    *chains = data.chains.clone();
    *friendship = data.friendship.clone();
    *masteries = data.masteries.clone();
}

/// Rebuild a live behavior component from its snapshot, timers restarted
/// at `now`.
pub fn restore_behavior(snapshot: &BehaviorSnapshot, now: f32) -> NpcBehavior {
    let mut behavior = NpcBehavior::enter(&snapshot.state, now);
    behavior.frame = snapshot.frame;
    behavior.facing = snapshot.facing;
    behavior
}
