//! Controller components and their per-tick dispatch.
//!
//! Controllers are a tagged union dispatched once per tick by the
//! scheduler, before collision and movement, so both see the controller's
//! intent for the tick.

use gridfire_core::{Aim, Damage, EntityId, InputSnapshot, Rgb, Sprite, Velocity};

use crate::entity::EntitySpec;
use crate::World;

/// Top speed a player controller accelerates to, per axis.
pub const MAX_SPEED: i32 = 5;
/// Speed imparted to a fired bullet, per aimed axis.
pub const BULLET_SPEED: i32 = 8;
/// Ticks a bullet survives before destroying itself.
pub const BULLET_LIFETIME: u32 = 60;
/// Collision radius of a fired bullet.
pub const BULLET_RADIUS: i32 = 2;
/// Contact damage of a fired bullet.
pub const BULLET_DAMAGE: i32 = 10;

const BULLET_COLOR: Rgb = Rgb::from_rgb(0xc8, 0x2a, 0x36);

/// Behavior variants a controller can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ControllerKind {
    /// Driven by the externally-polled input snapshot.
    Player,
    /// Self-destructs once its lifetime runs out.
    Bullet { life: u32 },
}

/// Controller component: a behavior variant plus an enable switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controller {
    kind: ControllerKind,
    enabled: bool,
}

impl Controller {
    /// An enabled player controller.
    #[must_use]
    pub const fn player() -> Self {
        Self {
            kind: ControllerKind::Player,
            enabled: true,
        }
    }

    /// An enabled bullet controller with the default lifetime.
    #[must_use]
    pub const fn bullet() -> Self {
        Self::bullet_with_lifetime(BULLET_LIFETIME)
    }

    /// An enabled bullet controller with an explicit lifetime in ticks.
    #[must_use]
    pub const fn bullet_with_lifetime(life: u32) -> Self {
        Self {
            kind: ControllerKind::Bullet { life },
            enabled: true,
        }
    }

    /// Whether the scheduler dispatches this controller.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

enum Dispatch {
    Player,
    BulletTicked,
    BulletExpired,
}

/// Runs one controller update for the entity, if it carries an enabled
/// controller.
pub(crate) fn update(world: &mut World, id: EntityId, input: &InputSnapshot) {
    let dispatch = {
        let Some(record) = world.entities.get_mut(id) else {
            return;
        };
        let Some(controller) = record.controller.as_mut() else {
            return;
        };
        if !controller.enabled {
            return;
        }
        match &mut controller.kind {
            ControllerKind::Player => Dispatch::Player,
            ControllerKind::Bullet { life } => {
                if *life > 0 {
                    *life -= 1;
                    Dispatch::BulletTicked
                } else {
                    Dispatch::BulletExpired
                }
            }
        }
    };

    match dispatch {
        Dispatch::Player => player_update(world, id, input),
        Dispatch::BulletTicked => {}
        Dispatch::BulletExpired => world.request_destroy(id),
    }
}

fn player_update(world: &mut World, id: EntityId, input: &InputSnapshot) {
    let Some(record) = world.entities.get(id) else {
        return;
    };
    let Some(velocity) = record.movement else {
        return;
    };

    let next = Velocity::new(
        step_axis(velocity.x(), input.left, input.right),
        step_axis(velocity.y(), input.up, input.down),
    );
    if next != velocity {
        world.set_velocity(id, next);
    }

    if let Some(aim) = input.fire {
        fire_bullet(world, id, aim);
    }
}

/// Accelerates toward the held direction, otherwise decays toward rest.
fn step_axis(current: i32, negative_held: bool, positive_held: bool) -> i32 {
    if negative_held {
        if current > -MAX_SPEED {
            current - 1
        } else {
            current
        }
    } else if positive_held {
        if current < MAX_SPEED {
            current + 1
        } else {
            current
        }
    } else if current > 0 {
        current - 1
    } else if current < 0 {
        current + 1
    } else {
        0
    }
}

/// Spawns a bullet just outside the shooter's collision radius, headed
/// along the aim direction. The spawn schedules the bullet before the tick
/// ends, so it starts simulating next tick.
fn fire_bullet(world: &mut World, shooter: EntityId, aim: Aim) {
    if aim.x_sign() == 0 && aim.y_sign() == 0 {
        return;
    }
    let Some(record) = world.entities.get(shooter) else {
        return;
    };
    let Some(position) = record.position else {
        return;
    };
    let shooter_radius = record.collision.map_or(0, |body| body.radius);
    let offset = shooter_radius + BULLET_RADIUS + 1;

    let spec = EntitySpec::new()
        .position(
            position.x + aim.x_sign() * offset,
            position.y + aim.y_sign() * offset,
        )
        .movement(Velocity::new(
            aim.x_sign() * BULLET_SPEED,
            aim.y_sign() * BULLET_SPEED,
        ))
        .drawable(Sprite {
            color: BULLET_COLOR,
            size: BULLET_RADIUS,
        })
        .collision(BULLET_RADIUS)
        .attack(Damage::new(BULLET_DAMAGE))
        .controller(Controller::bullet());
    let _ = world.spawn(spec);
}

#[cfg(test)]
mod tests {
    use super::{step_axis, MAX_SPEED};

    #[test]
    fn held_axis_accelerates_and_clamps() {
        let mut speed = 0;
        for _ in 0..10 {
            speed = step_axis(speed, false, true);
        }
        assert_eq!(speed, MAX_SPEED);
    }

    #[test]
    fn released_axis_decays_to_rest() {
        let mut speed = -3;
        for _ in 0..5 {
            speed = step_axis(speed, false, false);
        }
        assert_eq!(speed, 0);
    }

    #[test]
    fn opposite_hold_brakes_through_zero() {
        assert_eq!(step_axis(2, true, false), 1);
        assert_eq!(step_axis(0, true, false), -1);
        assert_eq!(step_axis(-MAX_SPEED, true, false), -MAX_SPEED);
    }
}
