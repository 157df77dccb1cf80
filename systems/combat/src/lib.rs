#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision reaction that converts attack components into damage.

use gridfire_core::{EntityId, Event, Health};
use gridfire_world::{Reaction, ReactionCtx};

/// Reaction that applies the scanning entity's attack to whatever it
/// overlaps.
///
/// A target whose health exceeds the damage loses hit points; otherwise it
/// is queued for end-of-tick destruction. Pairs where the scanner carries
/// no attack, or the target no health, pass through untouched. The scan
/// always continues: one attacker may damage several targets in one tick.
#[derive(Debug, Default)]
pub struct DamageReaction;

impl DamageReaction {
    /// Creates the damage reaction.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Reaction for DamageReaction {
    fn on_collide(
        &mut self,
        ctx: &mut ReactionCtx<'_>,
        first: EntityId,
        second: EntityId,
    ) -> bool {
        let Some(damage) = ctx.attack_of(first) else {
            return true;
        };
        let Some(health) = ctx.health_of(second) else {
            return true;
        };

        if health.get() > damage.get() {
            let remaining = health.get() - damage.get();
            ctx.set_health(second, Health::new(remaining));
            ctx.emit(Event::DamageDealt {
                attacker: first,
                target: second,
                amount: damage.get(),
                remaining,
            });
        } else {
            ctx.emit(Event::DamageDealt {
                attacker: first,
                target: second,
                amount: damage.get(),
                remaining: 0,
            });
            ctx.request_destroy(second);
        }
        true
    }
}
