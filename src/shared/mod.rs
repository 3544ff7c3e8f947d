//! Shared components, resources, events, and content types for the
//! Willowmere interaction core.
//!
//! This is the type contract. Every domain module imports from here;
//! domains layer leaf-first (conditions → chains → dialogue → behavior)
//! and never reach around that order.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════
// WORLD STATE — written by the host game, read by the core
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn next(self) -> Self {
        match self {
            Season::Spring => Season::Summer,
            Season::Summer => Season::Fall,
            Season::Fall => Season::Winter,
            Season::Winter => Season::Spring,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    Rainy,
    Stormy,
    Snowy, // Winter only
}

/// Coarse time bucket used by dialogue overrides. The host's calendar owns
/// the real clock; the core only cares whether lamps are lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Day,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

/// Season/weather/time snapshot maintained by the host game's calendar.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct WorldClock {
    pub season: Season,
    pub weather: Weather,
    pub time_of_day: TimeOfDay,
}

impl Default for WorldClock {
    fn default() -> Self {
        Self {
            season: Season::Spring,
            weather: Weather::Clear,
            time_of_day: TimeOfDay::Day,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// IDS — string ids everywhere for data-driven flexibility
// ═══════════════════════════════════════════════════════════════════════

pub type NpcId = String;
pub type ChainId = String;
pub type ItemId = String;
pub type EffectId = String;
/// Logical id of a conversational beat. NOT unique within a script:
/// several nodes share one line id and gates pick the variant.
pub type LineId = String;

/// Component marking an NPC entity the core may resolve dialogue for.
#[derive(Component, Debug, Clone)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
}

/// Component marking the player entity (used for proximity distances).
#[derive(Component, Debug, Clone, Default)]
pub struct Player;

// ═══════════════════════════════════════════════════════════════════════
// PLAYER-FACING STATE — effects, masteries, friendship
// ═══════════════════════════════════════════════════════════════════════

/// Transient status effects currently active on the player
/// (e.g. a beast-tongue translation potion).
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub effects: HashSet<EffectId>,
}

impl ActiveEffects {
    pub fn is_active(&self, effect: &str) -> bool {
        self.effects.contains(effect)
    }

    pub fn apply(&mut self, effect: &str) {
        self.effects.insert(effect.to_string());
    }

    pub fn expire(&mut self, effect: &str) {
        self.effects.remove(effect);
    }
}

/// Achievement-style flags: recipe mastered, craft domain unlocked, etc.
/// Set by external systems, read by dialogue gates.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Masteries {
    pub ids: Vec<String>,
}

impl Masteries {
    pub fn is_set(&self, flag: &str) -> bool {
        self.ids.iter().any(|f| f == flag)
    }

    pub fn set(&mut self, flag: &str) {
        if !self.is_set(flag) {
            self.ids.push(flag.to_string());
        }
    }
}

/// Friendship tiers in ascending order. Gates compare by enumeration
/// order, never by name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum FriendshipTier {
    #[default]
    Stranger,
    Acquaintance,
    Friend,
    GoodFriend,
    BestFriend,
}

impl FriendshipTier {
    /// Map accumulated friendship points to a tier.
    pub fn from_points(points: u32) -> Self {
        match points / FRIENDSHIP_PER_TIER {
            0 => FriendshipTier::Stranger,
            1 => FriendshipTier::Acquaintance,
            2 => FriendshipTier::Friend,
            3 => FriendshipTier::GoodFriend,
            _ => FriendshipTier::BestFriend,
        }
    }
}

/// NPC id → accumulated friendship points. Score *sources* (gifts, quest
/// rewards) live in the game; the ledger is the save-scoped bookkeeping.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendshipLedger {
    pub points: HashMap<NpcId, u32>,
}

impl FriendshipLedger {
    pub fn points(&self, npc_id: &str) -> u32 {
        self.points.get(npc_id).copied().unwrap_or(0)
    }

    pub fn tier(&self, npc_id: &str) -> FriendshipTier {
        FriendshipTier::from_points(self.points(npc_id))
    }

    pub fn add(&mut self, npc_id: &str, amount: i32) {
        let entry = self.points.entry(npc_id.to_string()).or_insert(0);
        *entry = (*entry as i32 + amount).clamp(0, MAX_FRIENDSHIP as i32) as u32;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// GATES — tagged predicate variants, evaluated in `conditions`
// ═══════════════════════════════════════════════════════════════════════

fn default_min_stage() -> u32 {
    1
}

/// One predicate on the interaction context. A node's or response's full
/// gate is the AND of every entry in its gate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Chain started and current stage within `[min_stage, max_stage]`.
    /// `min_stage` defaults to 1; `max_stage` is open-ended when absent.
    QuestStage {
        chain: ChainId,
        #[serde(default = "default_min_stage")]
        min_stage: u32,
        #[serde(default)]
        max_stage: Option<u32>,
    },
    /// Retires content once a chain begins (first-meeting lines).
    QuestNotStarted { chain: ChainId },
    /// Retires content once a chain finishes.
    QuestNotCompleted { chain: ChainId },
    /// Tier toward the addressed NPC within `[min, max]`, inclusive.
    FriendshipRange {
        min: FriendshipTier,
        #[serde(default)]
        max: Option<FriendshipTier>,
    },
    EffectActive { effect: EffectId },
    EffectAbsent { effect: EffectId },
    MasterySet { flag: String },
    MasteryUnset { flag: String },
}

/// Ephemeral snapshot of everything gates and text selection may consult.
/// Rebuilt for every interaction; borrows the live stores read-only.
pub struct DialogueContext<'a> {
    pub season: Season,
    pub weather: Weather,
    pub time_of_day: TimeOfDay,
    pub player_pos: Vec2,
    /// Tier toward the NPC being addressed.
    pub tier: FriendshipTier,
    pub effects: &'a ActiveEffects,
    pub masteries: &'a Masteries,
    pub chains: &'a ChainStore,
}

// ═══════════════════════════════════════════════════════════════════════
// DIALOGUE CONTENT — ordered scripts, gated nodes, gated responses
// ═══════════════════════════════════════════════════════════════════════

/// One variant of a conversational beat. Scripts are ordered lists of
/// these; resolution scans in file order and the first node whose id and
/// gates match wins, so authors put the most-restrictive variant first
/// and the unconditional fallback last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: LineId,
    pub text: String,
    /// Surface-text overrides. Priority: weather > time-of-day > season.
    #[serde(default)]
    pub weather_text: HashMap<Weather, String>,
    #[serde(default)]
    pub time_text: HashMap<TimeOfDay, String>,
    #[serde(default)]
    pub season_text: HashMap<Season, String>,
    #[serde(default)]
    pub gates: Vec<Gate>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

/// A player response option on a dialogue node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    /// Logical id to jump to on selection, re-resolved through gating.
    /// None ends the conversation.
    #[serde(default)]
    pub next: Option<LineId>,
    #[serde(default)]
    pub gates: Vec<Gate>,
    #[serde(default)]
    pub actions: Vec<ResponseAction>,
}

/// Side effects a chosen response applies, in order, before the follow-up
/// line resolves. Chain actions mutate the tracker directly; the rest go
/// out through the narrow sink events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResponseAction {
    StartChain {
        chain: ChainId,
        #[serde(default)]
        metadata: HashMap<String, Value>,
    },
    SetStage {
        chain: ChainId,
        stage: String,
    },
    /// Step to the next named stage in the chain's table order.
    AdvanceChain { chain: ChainId },
    CompleteChain { chain: ChainId },
    SetChainMeta {
        chain: ChainId,
        key: String,
        value: Value,
    },
    GrantItem { item_id: ItemId, quantity: u8 },
    AdjustFriendship { npc_id: NpcId, amount: i32 },
    EmitSignal { id: String },
}

/// One NPC's full script. Node order is semantically significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcScript {
    pub npc_id: NpcId,
    pub nodes: Vec<DialogueNode>,
}

/// All NPC scripts, registered by content at startup.
#[derive(Resource, Debug, Clone, Default)]
pub struct ScriptBook {
    pub scripts: HashMap<NpcId, NpcScript>,
}

impl ScriptBook {
    pub fn register(&mut self, script: NpcScript) {
        self.scripts.insert(script.npc_id.clone(), script);
    }

    pub fn get(&self, npc_id: &str) -> Option<&NpcScript> {
        self.scripts.get(npc_id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENT CHAINS — per-quest persistent state + static stage tables
// ═══════════════════════════════════════════════════════════════════════

/// Static definition of a chain: its ordered stage names. Stage numbers
/// are 1-based positions in this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDef {
    pub id: ChainId,
    pub stages: Vec<String>,
}

/// All chain definitions, registered by content at startup.
#[derive(Resource, Debug, Clone, Default)]
pub struct ChainRegistry {
    pub chains: HashMap<ChainId, ChainDef>,
}

impl ChainRegistry {
    pub fn register(&mut self, def: ChainDef) {
        self.chains.insert(def.id.clone(), def);
    }

    /// 1-based stage number for a named stage, if the chain and stage exist.
    pub fn stage_number(&self, chain: &str, stage: &str) -> Option<u32> {
        let def = self.chains.get(chain)?;
        def.stages
            .iter()
            .position(|s| s == stage)
            .map(|i| i as u32 + 1)
    }

    pub fn stage_name(&self, chain: &str, number: u32) -> Option<&str> {
        let def = self.chains.get(chain)?;
        if number == 0 {
            return None;
        }
        def.stages.get(number as usize - 1).map(String::as_str)
    }
}

/// Mutable state of one started chain. A chain that was never started has
/// no entry in the store at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainState {
    pub stage_name: String,
    pub stage_number: u32,
    pub completed: bool,
    /// Free-form bag. Each quest's own handlers own the shape; the
    /// tracker never inspects values.
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("chain `{0}` has not been started")]
    NotStarted(ChainId),
    #[error("no stage table registered for chain `{0}`")]
    UnknownChain(ChainId),
    #[error("chain `{chain}` has no stage named `{stage}`")]
    UnknownStage { chain: ChainId, stage: String },
    #[error("chain `{chain}` cannot move backward from stage {from} to {to}")]
    BackwardAdvance { chain: ChainId, from: u32, to: u32 },
    #[error("chain `{0}` is already at its final stage")]
    AtFinalStage(ChainId),
}

/// The save-scoped store of every chain's state, keyed by chain id.
/// Mutated only through its own operations; serialized as part of the
/// host's save document.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainStore {
    pub chains: HashMap<ChainId, ChainState>,
}

impl ChainStore {
    pub fn is_started(&self, id: &str) -> bool {
        self.chains.contains_key(id)
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.chains.get(id).map(|c| c.completed).unwrap_or(false)
    }

    /// Started and not yet completed.
    pub fn is_active(&self, id: &str) -> bool {
        self.chains.get(id).map(|c| !c.completed).unwrap_or(false)
    }

    /// Current stage number, 0 if the chain was never started.
    pub fn stage_number(&self, id: &str) -> u32 {
        self.chains.get(id).map(|c| c.stage_number).unwrap_or(0)
    }

    pub fn stage_name(&self, id: &str) -> Option<&str> {
        self.chains.get(id).map(|c| c.stage_name.as_str())
    }

    /// Start a chain at stage 1. Idempotent: a second call is a no-op and
    /// the first metadata snapshot stays intact. Returns whether the chain
    /// was newly started.
    pub fn start_chain(
        &mut self,
        registry: &ChainRegistry,
        id: &str,
        metadata: HashMap<String, Value>,
    ) -> bool {
        if self.chains.contains_key(id) {
            return false;
        }
        // DLC content may start chains the base registry never declared;
        // those get a numeric stage with a placeholder name.
        let stage_name = registry.stage_name(id, 1).unwrap_or("start").to_string();
        self.chains.insert(
            id.to_string(),
            ChainState {
                stage_name,
                stage_number: 1,
                completed: false,
                metadata,
            },
        );
        true
    }

    /// Move a started chain to a named stage. Stage numbers only move
    /// forward; a backward advance is a content bug, rejected with an
    /// error carrying both stage numbers so the caller can log it.
    pub fn advance_to_stage(
        &mut self,
        registry: &ChainRegistry,
        id: &str,
        stage: &str,
    ) -> Result<u32, ChainError> {
        let number = match registry.stage_number(id, stage) {
            Some(n) => n,
            None if registry.chains.contains_key(id) => {
                return Err(ChainError::UnknownStage {
                    chain: id.to_string(),
                    stage: stage.to_string(),
                })
            }
            None => return Err(ChainError::UnknownChain(id.to_string())),
        };
        let state = self
            .chains
            .get_mut(id)
            .ok_or_else(|| ChainError::NotStarted(id.to_string()))?;
        if number < state.stage_number {
            return Err(ChainError::BackwardAdvance {
                chain: id.to_string(),
                from: state.stage_number,
                to: number,
            });
        }
        state.stage_number = number;
        state.stage_name = stage.to_string();
        Ok(number)
    }

    /// Step to the next named stage in table order. At the final stage
    /// this is an error the caller logs and drops.
    pub fn advance_next(&mut self, registry: &ChainRegistry, id: &str) -> Result<u32, ChainError> {
        let current = self
            .chains
            .get(id)
            .ok_or_else(|| ChainError::NotStarted(id.to_string()))?
            .stage_number;
        let next = registry
            .stage_name(id, current + 1)
            .ok_or_else(|| match registry.chains.contains_key(id) {
                true => ChainError::AtFinalStage(id.to_string()),
                false => ChainError::UnknownChain(id.to_string()),
            })?
            .to_string();
        self.advance_to_stage(registry, id, &next)
    }

    /// One-way completion flag. Stage and metadata writes are still
    /// accepted afterwards but the chain is never active again.
    pub fn complete_chain(&mut self, id: &str) -> Result<(), ChainError> {
        let state = self
            .chains
            .get_mut(id)
            .ok_or_else(|| ChainError::NotStarted(id.to_string()))?;
        state.completed = true;
        Ok(())
    }

    pub fn set_metadata(&mut self, id: &str, key: &str, value: Value) -> Result<(), ChainError> {
        let state = self
            .chains
            .get_mut(id)
            .ok_or_else(|| ChainError::NotStarted(id.to_string()))?;
        state.metadata.insert(key.to_string(), value);
        Ok(())
    }

    pub fn metadata(&self, id: &str, key: &str) -> Option<&Value> {
        self.chains.get(id).and_then(|c| c.metadata.get(key))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// NPC BEHAVIOR — declarative state tables + runtime state
// ═══════════════════════════════════════════════════════════════════════

/// Distance-based override: entering `radius` forces `target_state`
/// regardless of timers; staying past `recover_radius` for
/// `recover_delay` seconds releases to `recover_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximityTrigger {
    pub radius: f32,
    pub target_state: String,
    pub recover_radius: f32,
    pub recover_state: String,
    pub recover_delay: f32,
}

/// One named state in an NPC's behavior table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorStateDef {
    /// Atlas frame indices cycled at `frame_interval`.
    pub frames: Vec<u32>,
    /// Direction-specific frame lists. Rendering only; timing always runs
    /// off the default list.
    #[serde(default)]
    pub facing_frames: HashMap<Facing, Vec<u32>>,
    pub frame_interval: f32,
    /// Timed auto-transition: after `duration` seconds, go to `next_state`.
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default)]
    pub next_state: Option<String>,
    #[serde(default)]
    pub proximity: Option<ProximityTrigger>,
    /// Interaction-signal name → target state. States with an empty map
    /// ignore signals (a "playing dead" state is non-interactive).
    #[serde(default)]
    pub transitions: HashMap<String, String>,
    /// Whether the wander AI moves the NPC while in this state.
    #[serde(default)]
    pub wanders: bool,
}

impl BehaviorStateDef {
    /// Frame list to render for a facing, falling back to the default.
    pub fn frames_for(&self, facing: Facing) -> &[u32] {
        self.facing_frames
            .get(&facing)
            .map(Vec::as_slice)
            .unwrap_or(&self.frames)
    }
}

/// An NPC's full state table. No designated initial state: each instance
/// picks its own when spawned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorTable {
    pub states: HashMap<String, BehaviorStateDef>,
}

impl BehaviorTable {
    pub fn get(&self, state: &str) -> Option<&BehaviorStateDef> {
        self.states.get(state)
    }
}

/// All NPC behavior tables, registered by content at startup.
#[derive(Resource, Debug, Clone, Default)]
pub struct BehaviorBook {
    pub tables: HashMap<NpcId, BehaviorTable>,
}

impl BehaviorBook {
    pub fn register(&mut self, npc_id: &str, table: BehaviorTable) {
        self.tables.insert(npc_id.to_string(), table);
    }

    pub fn get(&self, npc_id: &str) -> Option<&BehaviorTable> {
        self.tables.get(npc_id)
    }
}

/// Per-NPC runtime behavior state. Timestamps are seconds of app time.
#[derive(Component, Debug, Clone)]
pub struct NpcBehavior {
    pub state: String,
    pub entered_at: f32,
    pub last_frame_at: f32,
    pub frame: usize,
    pub facing: Facing,
    /// Name of the state whose proximity trigger put us here, if any.
    /// Recovery parameters are read back from that state's definition.
    pub triggered_from: Option<String>,
    /// When the player first left the recovery radius, for the
    /// sustained-distance check.
    pub out_of_range_since: Option<f32>,
}

impl NpcBehavior {
    pub fn enter(state: &str, now: f32) -> Self {
        Self {
            state: state.to_string(),
            entered_at: now,
            last_frame_at: now,
            frame: 0,
            facing: Facing::default(),
            triggered_from: None,
            out_of_range_since: None,
        }
    }
}

/// Why a behavior transition happened, for host-side reactions
/// (emote bubbles, sound cues).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    Timer,
    Proximity,
    Recovery,
    Signal,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS — cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// Host → core: the player initiated contact with an NPC.
#[derive(Event, Debug, Clone)]
pub struct InteractionRequestEvent {
    pub npc_id: NpcId,
}

/// Host → core: the player picked one of the offered responses
/// (index into the offered list, not the node's full list).
#[derive(Event, Debug, Clone)]
pub struct ResponseChosenEvent {
    pub index: usize,
}

/// Host → core: named interaction signal for the behavior machine
/// (the core itself emits `"talk"` on dialogue contact).
#[derive(Event, Debug, Clone)]
pub struct BehaviorSignalEvent {
    pub npc_id: NpcId,
    pub signal: String,
}

/// Core → host UI: show a dialogue line and its response options.
#[derive(Event, Debug, Clone)]
pub struct DialogueStartEvent {
    pub npc_id: NpcId,
    pub text: String,
    pub responses: Vec<String>,
}

/// Core → host UI: the conversation is over.
#[derive(Event, Debug, Clone)]
pub struct DialogueEndEvent;

/// Core → host inventory sink.
#[derive(Event, Debug, Clone)]
pub struct ItemGrantEvent {
    pub item_id: ItemId,
    pub quantity: u8,
}

/// Core → host friendship sink (the core also applies it to the ledger).
#[derive(Event, Debug, Clone)]
pub struct FriendshipChangeEvent {
    pub npc_id: NpcId,
    pub amount: i32,
}

/// Core → host broadcast (festival triggers, achievement popups, ...).
#[derive(Event, Debug, Clone)]
pub struct GameSignalEvent {
    pub id: String,
}

#[derive(Event, Debug, Clone)]
pub struct ChainStartedEvent {
    pub chain: ChainId,
}

#[derive(Event, Debug, Clone)]
pub struct ChainAdvancedEvent {
    pub chain: ChainId,
    pub stage_name: String,
    pub stage_number: u32,
}

#[derive(Event, Debug, Clone)]
pub struct ChainCompletedEvent {
    pub chain: ChainId,
}

/// Core → host: an NPC's behavior state changed.
#[derive(Event, Debug, Clone)]
pub struct BehaviorChangedEvent {
    pub npc_id: NpcId,
    pub from: String,
    pub to: String,
    pub cause: TransitionCause,
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

/// Logical id every conversation opens with.
pub const ENTRY_LINE: &str = "greeting";

/// Behavior signal the dialogue system fires on player contact.
pub const TALK_SIGNAL: &str = "talk";

pub const FRIENDSHIP_PER_TIER: u32 = 200;
pub const MAX_FRIENDSHIP: u32 = 1000;
