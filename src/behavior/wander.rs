//! Wander movement for NPCs whose current behavior state wanders.
//!
//! The state machine decides *that* an NPC wanders; this picks *where*:
//! a random point inside the NPC's home bounds, walk toward it, idle
//! briefly, repeat. The motion vector sets facing so direction-specific
//! frame lists render correctly.

use bevy::prelude::*;
use rand::Rng;

use crate::shared::*;

/// Component: wander bounds and pacing for one NPC.
#[derive(Component, Debug, Clone)]
pub struct Wander {
    pub home_min: Vec2,
    pub home_max: Vec2,
    pub speed: f32,
    pub timer: Timer,
    pub target: Option<Vec2>,
}

impl Wander {
    pub fn new(home_min: Vec2, home_max: Vec2, speed: f32) -> Self {
        Self {
            home_min,
            home_max,
            speed,
            timer: Timer::from_seconds(0.5, TimerMode::Once),
            target: None,
        }
    }
}

/// Dominant-axis facing for a motion vector.
pub fn facing_from(motion: Vec2) -> Facing {
    if motion.x.abs() > motion.y.abs() {
        if motion.x > 0.0 {
            Facing::Right
        } else {
            Facing::Left
        }
    } else if motion.y > 0.0 {
        Facing::Up
    } else {
        Facing::Down
    }
}

/// System: walk wandering NPCs between random points in their home bounds.
pub fn wander_npcs(
    time: Res<Time>,
    book: Res<BehaviorBook>,
    mut query: Query<(&Npc, &mut Wander, &mut NpcBehavior, &mut Transform)>,
) {
    let mut rng = rand::thread_rng();

    for (npc, mut wander, mut behavior, mut transform) in query.iter_mut() {
        let wanders = book
            .get(&npc.id)
            .and_then(|table| table.get(&behavior.state))
            .map(|def| def.wanders)
            .unwrap_or(false);
        if !wanders {
            // Drop any half-finished walk when the state stops wandering.
            wander.target = None;
            continue;
        }

        wander.timer.tick(time.delta());

        if let Some(target) = wander.target {
            let current = transform.translation.truncate();
            let delta = target - current;
            let dist = delta.length();

            if dist < 1.5 {
                // Arrived; idle a little before the next stroll.
                wander.target = None;
                let idle_secs = rng.gen_range(1.5_f32..=3.5_f32);
                wander.timer = Timer::from_seconds(idle_secs, TimerMode::Once);
            } else {
                let step = wander.speed * time.delta_secs();
                let movement = delta.normalize() * step.min(dist);
                transform.translation.x += movement.x;
                transform.translation.y += movement.y;
                behavior.facing = facing_from(movement);
            }
        } else if wander.timer.just_finished() {
            let tx = rng.gen_range(wander.home_min.x..=wander.home_max.x);
            let ty = rng.gen_range(wander.home_min.y..=wander.home_max.y);
            wander.target = Some(Vec2::new(tx, ty));

            let next_secs = rng.gen_range(2.0_f32..=4.0_f32);
            wander.timer = Timer::from_seconds(next_secs, TimerMode::Once);
        }
    }
}
