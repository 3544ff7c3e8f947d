//! NPC behavior state machine: declarative state tables driving idle
//! animation, wandering, proximity reactions, and interaction responses.
//!
//! Each NPC carries an `NpcBehavior` component ticked once per frame.
//! Transitions come from three places: a state's timed auto-transition,
//! a proximity trigger (which overrides any pending timer), and named
//! interaction signals. Distance to the player is an opaque scalar here;
//! the system computes it from transforms and hands it to the pure tick.

use bevy::prelude::*;

use crate::shared::*;

pub mod wander;

pub struct BehaviorPlugin;

impl Plugin for BehaviorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BehaviorBook>()
            .add_event::<BehaviorSignalEvent>()
            .add_event::<BehaviorChangedEvent>()
            .add_systems(
                Update,
                (
                    warn_dangling_states,
                    tick_npc_behaviors,
                    handle_behavior_signals,
                    wander::wander_npcs,
                ),
            );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pure tick — deterministic, timestamp-driven, no ECS access
// ─────────────────────────────────────────────────────────────────────────────

/// A transition that happened during a tick or signal.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorChange {
    pub from: String,
    pub to: String,
    pub cause: TransitionCause,
}

fn enter_state(behavior: &mut NpcBehavior, state: &str, now: f32) {
    behavior.state = state.to_string();
    behavior.entered_at = now;
    behavior.last_frame_at = now;
    behavior.frame = 0;
    behavior.triggered_from = None;
    behavior.out_of_range_since = None;
}

/// Advance one NPC's behavior by one frame. At most one transition per
/// tick; priority is proximity trigger, then recovery, then the timed
/// auto-transition, then plain frame advancement.
pub fn tick_behavior(
    behavior: &mut NpcBehavior,
    table: &BehaviorTable,
    now: f32,
    player_distance: f32,
) -> Option<BehaviorChange> {
    let def = table.get(&behavior.state)?;

    // Proximity trigger fires immediately, regardless of remaining duration.
    if let Some(trigger) = &def.proximity {
        if player_distance <= trigger.radius
            && behavior.state != trigger.target_state
            && table.get(&trigger.target_state).is_some()
        {
            let from = behavior.state.clone();
            enter_state(behavior, &trigger.target_state, now);
            behavior.triggered_from = Some(from.clone());
            return Some(BehaviorChange {
                from,
                to: behavior.state.clone(),
                cause: TransitionCause::Proximity,
            });
        }
    }

    // Recovery: the player must stay outside the recovery radius for the
    // whole delay. Dipping back inside resets the clock.
    if let Some(source) = behavior.triggered_from.clone() {
        match table.get(&source).and_then(|d| d.proximity.as_ref()) {
            Some(trigger) => {
                if player_distance >= trigger.recover_radius {
                    match behavior.out_of_range_since {
                        None => behavior.out_of_range_since = Some(now),
                        Some(since) if now - since >= trigger.recover_delay => {
                            if table.get(&trigger.recover_state).is_some() {
                                let from = behavior.state.clone();
                                enter_state(behavior, &trigger.recover_state, now);
                                return Some(BehaviorChange {
                                    from,
                                    to: behavior.state.clone(),
                                    cause: TransitionCause::Recovery,
                                });
                            }
                        }
                        Some(_) => {}
                    }
                } else {
                    behavior.out_of_range_since = None;
                }
            }
            // The source state lost its trigger (content reload); drop the
            // bookkeeping rather than chase stale recovery parameters.
            None => behavior.triggered_from = None,
        }
    }

    // Timed auto-transition.
    if let (Some(duration), Some(next)) = (def.duration, def.next_state.as_ref()) {
        if now - behavior.entered_at >= duration && table.get(next).is_some() {
            let from = behavior.state.clone();
            enter_state(behavior, next, now);
            return Some(BehaviorChange {
                from,
                to: behavior.state.clone(),
                cause: TransitionCause::Timer,
            });
        }
    }

    // Frame advancement within the current state.
    if !def.frames.is_empty() && now - behavior.last_frame_at >= def.frame_interval {
        behavior.frame = (behavior.frame + 1) % def.frames.len();
        behavior.last_frame_at = now;
    }

    None
}

/// Apply a named interaction signal. States whose `transitions` map has no
/// entry for the signal ignore it; that is how "playing dead" stays
/// non-interactive until recovery.
pub fn apply_signal(
    behavior: &mut NpcBehavior,
    table: &BehaviorTable,
    signal: &str,
    now: f32,
) -> Option<BehaviorChange> {
    let def = table.get(&behavior.state)?;
    let target = def.transitions.get(signal)?;
    table.get(target)?;

    let from = behavior.state.clone();
    enter_state(behavior, target, now);
    Some(BehaviorChange {
        from,
        to: behavior.state.clone(),
        cause: TransitionCause::Signal,
    })
}

/// Atlas frame to render right now. Direction-specific lists override the
/// default for rendering only; timing always runs off the default list.
pub fn current_atlas_index(behavior: &NpcBehavior, table: &BehaviorTable) -> Option<u32> {
    let def = table.get(&behavior.state)?;
    let frames = def.frames_for(behavior.facing);
    if frames.is_empty() {
        return None;
    }
    Some(frames[behavior.frame % frames.len()])
}

/// Content QA: every transition edge must point at a state that exists,
/// and every state needs frames and a positive frame interval.
pub fn validate_table(table: &BehaviorTable) -> Vec<String> {
    fn check(issues: &mut Vec<String>, table: &BehaviorTable, from: &str, target: &str, kind: &str) {
        if table.get(target).is_none() {
            issues.push(format!(
                "state `{}`: {} targets unknown state `{}`",
                from, kind, target
            ));
        }
    }

    let mut issues = Vec::new();
    for (name, def) in &table.states {
        if let Some(next) = &def.next_state {
            check(&mut issues, table, name, next, "next_state");
        }
        if let Some(trigger) = &def.proximity {
            check(&mut issues, table, name, &trigger.target_state, "proximity trigger");
            check(&mut issues, table, name, &trigger.recover_state, "proximity recovery");
        }
        for target in def.transitions.values() {
            check(&mut issues, table, name, target, "signal transition");
        }
        if def.frames.is_empty() {
            issues.push(format!("state `{}` has no frames", name));
        }
        if def.frame_interval <= 0.0 {
            issues.push(format!("state `{}` has a non-positive frame interval", name));
        }
    }
    issues
}

// ─────────────────────────────────────────────────────────────────────────────
// Systems
// ─────────────────────────────────────────────────────────────────────────────

/// System: tick every NPC's behavior against the player's distance.
pub fn tick_npc_behaviors(
    time: Res<Time>,
    book: Res<BehaviorBook>,
    player_query: Query<&Transform, (With<Player>, Without<Npc>)>,
    mut npc_query: Query<(&Npc, &Transform, &mut NpcBehavior)>,
    mut changed: EventWriter<BehaviorChangedEvent>,
) {
    let now = time.elapsed_secs();
    let player_pos = player_query
        .get_single()
        .map(|transform| transform.translation.truncate())
        .ok();

    for (npc, transform, mut behavior) in npc_query.iter_mut() {
        let Some(table) = book.get(&npc.id) else {
            continue;
        };
        // No player on the map: nothing is ever "in range".
        let distance = player_pos
            .map(|p| p.distance(transform.translation.truncate()))
            .unwrap_or(f32::INFINITY);

        if let Some(change) = tick_behavior(&mut behavior, table, now, distance) {
            changed.send(BehaviorChangedEvent {
                npc_id: npc.id.clone(),
                from: change.from,
                to: change.to,
                cause: change.cause,
            });
        }
    }
}

/// System: route named interaction signals to the matching NPC.
pub fn handle_behavior_signals(
    time: Res<Time>,
    book: Res<BehaviorBook>,
    mut signals: EventReader<BehaviorSignalEvent>,
    mut npc_query: Query<(&Npc, &mut NpcBehavior)>,
    mut changed: EventWriter<BehaviorChangedEvent>,
) {
    let now = time.elapsed_secs();
    for event in signals.read() {
        for (npc, mut behavior) in npc_query.iter_mut() {
            if npc.id != event.npc_id {
                continue;
            }
            let Some(table) = book.get(&npc.id) else {
                continue;
            };
            if let Some(change) = apply_signal(&mut behavior, table, &event.signal, now) {
                changed.send(BehaviorChangedEvent {
                    npc_id: npc.id.clone(),
                    from: change.from,
                    to: change.to,
                    cause: change.cause,
                });
            }
        }
    }
}

/// System: log table problems once whenever content (re)registers.
pub fn warn_dangling_states(book: Res<BehaviorBook>) {
    if !book.is_changed() {
        return;
    }
    for (npc_id, table) in &book.tables {
        for issue in validate_table(table) {
            warn!("[Behavior] {}: {}", npc_id, issue);
        }
    }
}
