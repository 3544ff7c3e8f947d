//! Condition evaluator: pure predicates over the interaction context.
//!
//! Each gate kind tests exactly one fact. A node or response passes when
//! every gate in its list passes; the empty list always passes.

use crate::shared::*;

/// Evaluate a single gate against the context snapshot.
pub fn gate_matches(gate: &Gate, ctx: &DialogueContext) -> bool {
    match gate {
        Gate::QuestStage {
            chain,
            min_stage,
            max_stage,
        } => {
            if !ctx.chains.is_started(chain) {
                return false;
            }
            let stage = ctx.chains.stage_number(chain);
            stage >= *min_stage && max_stage.map(|max| stage <= max).unwrap_or(true)
        }
        Gate::QuestNotStarted { chain } => !ctx.chains.is_started(chain),
        Gate::QuestNotCompleted { chain } => !ctx.chains.is_completed(chain),
        Gate::FriendshipRange { min, max } => {
            ctx.tier >= *min && max.map(|max| ctx.tier <= max).unwrap_or(true)
        }
        Gate::EffectActive { effect } => ctx.effects.is_active(effect),
        Gate::EffectAbsent { effect } => !ctx.effects.is_active(effect),
        Gate::MasterySet { flag } => ctx.masteries.is_set(flag),
        Gate::MasteryUnset { flag } => !ctx.masteries.is_set(flag),
    }
}

/// Full gate of a node or response: AND of every entry.
pub fn gates_match(gates: &[Gate], ctx: &DialogueContext) -> bool {
    gates.iter().all(|gate| gate_matches(gate, ctx))
}
