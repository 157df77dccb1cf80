#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridfire simulation.
//!
//! This crate defines the value types that connect the authoritative world,
//! pluggable collision reactions, and adapter binaries: entity handles,
//! grid coordinates, component payloads, the per-tick input snapshot, the
//! events the world broadcasts after each tick, and the fatal error
//! taxonomy surfaced by the tick entry point.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handle identifying an entity slot in the world's arena.
///
/// Handles are generational: destroying an entity bumps the generation of
/// its slot, so a stale handle held across a destroy can never reach the
/// slot's next occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from raw slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot carried when this handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Location of a single grid cell expressed as column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex {
    column: u32,
    row: u32,
}

impl CellIndex {
    /// Creates a new cell index.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Integer point in world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPoint {
    x: i32,
    y: i32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Pending per-tick velocity of an entity, in world units per tick.
///
/// A movement component is *active* while either axis is non-zero; inactive
/// movement no longer keeps its entity in the scheduler's active set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Velocity {
    x: i32,
    y: i32,
}

impl Velocity {
    /// Creates a velocity from per-axis components.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Reports whether the velocity moves the entity at all.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.x != 0 || self.y != 0
    }
}

/// RGB color applied to a drawable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    /// Creates a color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Visual payload exposed read-only to the external render hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    /// Fill color used by the renderer.
    pub color: Rgb,
    /// Radius of the rendered disc in world units.
    pub size: i32,
}

/// Scalar hit points carried by a damageable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Health(i32);

impl Health {
    /// Creates a health value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

/// Scalar damage dealt by an attacking entity on contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Damage(i32);

impl Damage {
    /// Creates a damage value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Damage dealt per overlapping contact.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

/// Aim direction supplied with a fire input; only the signs are used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aim {
    x: i32,
    y: i32,
}

impl Aim {
    /// Creates an aim vector; components are reduced to their sign.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Sign of the horizontal aim component.
    #[must_use]
    pub const fn x_sign(&self) -> i32 {
        self.x.signum()
    }

    /// Sign of the vertical aim component.
    #[must_use]
    pub const fn y_sign(&self) -> i32 {
        self.y.signum()
    }
}

/// Snapshot of the externally-polled input state consumed by controllers.
///
/// The core never polls devices; an adapter fills this in once per tick and
/// passes it to the tick entry point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// Movement toward decreasing y is held.
    pub up: bool,
    /// Movement toward increasing y is held.
    pub down: bool,
    /// Movement toward decreasing x is held.
    pub left: bool,
    /// Movement toward increasing x is held.
    pub right: bool,
    /// Fire request with an aim direction, if the trigger was pulled.
    pub fire: Option<Aim>,
}

impl InputSnapshot {
    /// Snapshot with nothing held, the state an idle adapter submits.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            up: false,
            down: false,
            left: false,
            right: false,
            fire: None,
        }
    }
}

/// Events broadcast by the world after each tick.
///
/// External layers (network transport, analytics) observe simulation side
/// effects exclusively through these values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// An entity finished teardown and its arena slot was released.
    EntityDestroyed {
        /// Handle the destroyed entity was known by.
        entity: EntityId,
    },
    /// A collision reaction applied damage to a health-carrying entity.
    DamageDealt {
        /// Entity whose attack dealt the damage.
        attacker: EntityId,
        /// Entity whose health was reduced.
        target: EntityId,
        /// Amount subtracted from the target's health.
        amount: i32,
        /// Hit points the target retained after the hit.
        remaining: i32,
    },
}

/// Component kinds referenced by error diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Position component.
    Position,
    /// Movement component.
    Movement,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position => f.write_str("position"),
            Self::Movement => f.write_str("movement"),
        }
    }
}

/// Fatal precondition violations surfaced by the tick entry point.
///
/// Every variant is a programming-error class failure: a scheduled entity
/// was constructed without a component another attached component requires.
/// The tick aborts loudly rather than skipping the entity, since skipping
/// would mask the construction bug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TickError {
    /// A movement update ran on an entity that has no position.
    #[error("entity {index}v{generation} has movement but no position", index = .entity.index(), generation = .entity.generation())]
    MovementWithoutPosition {
        /// Entity that violated the precondition.
        entity: EntityId,
    },
    /// A collision update ran on an entity missing a required component.
    #[error("collidable entity {index}v{generation} is missing its {missing} component", index = .entity.index(), generation = .entity.generation())]
    CollisionPrerequisite {
        /// Entity that violated the precondition.
        entity: EntityId,
        /// Component kind the collision resolver required.
        missing: ComponentKind,
    },
}
