//! Generational entity arena and the component slots attached to each
//! entity.
//!
//! Components are stored inline as optional slots on the arena record: the
//! arena handle gives O(1) lookup in one direction and the slot itself is
//! the other direction, so no two live entities can ever claim the same
//! live component state.

use gridfire_core::{CellIndex, Damage, EntityId, Health, Sprite, Velocity, WorldPoint};

use crate::controller::Controller;
use crate::grid::Grid;

/// Position payload: world coordinates plus the cell holding the entity's
/// spatial ref.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PositionState {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) cell: CellIndex,
}

/// Collision payload: broad-phase radius and an enable switch.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CollisionBody {
    pub(crate) radius: i32,
    pub(crate) enabled: bool,
}

/// Where an entity stands in the scheduler's add/remove state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScheduleState {
    Unscheduled,
    PendingAdd,
    Active,
}

/// One live entity: component slots plus scheduler bookkeeping.
#[derive(Debug)]
pub(crate) struct EntityRecord {
    pub(crate) position: Option<PositionState>,
    pub(crate) movement: Option<Velocity>,
    pub(crate) drawable: Option<Sprite>,
    pub(crate) controller: Option<Controller>,
    pub(crate) collision: Option<CollisionBody>,
    pub(crate) health: Option<Health>,
    pub(crate) attack: Option<Damage>,
    pub(crate) schedule: ScheduleState,
    pub(crate) destroy_pending: bool,
}

impl EntityRecord {
    /// An entity stays in the active set while any capability warrants
    /// per-tick updates.
    pub(crate) fn should_update(&self) -> bool {
        self.controller_enabled() || self.movement_active() || self.collision_enabled()
    }

    pub(crate) fn controller_enabled(&self) -> bool {
        self.controller.as_ref().is_some_and(Controller::is_enabled)
    }

    pub(crate) fn collision_enabled(&self) -> bool {
        self.collision.is_some_and(|body| body.enabled)
    }

    pub(crate) fn movement_active(&self) -> bool {
        self.movement.is_some_and(|velocity| velocity.is_active())
    }
}

/// Blueprint used by the factory-style spawn operation.
///
/// Controllers may construct and spawn these mid-tick (a player firing a
/// bullet); the world registers the spatial ref and schedules the entity
/// before the tick ends.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntitySpec {
    position: Option<WorldPoint>,
    movement: Option<Velocity>,
    drawable: Option<Sprite>,
    controller: Option<Controller>,
    collision: Option<i32>,
    health: Option<Health>,
    attack: Option<Damage>,
}

impl EntitySpec {
    /// Starts an empty blueprint.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a position component at the given world coordinates.
    #[must_use]
    pub fn position(mut self, x: i32, y: i32) -> Self {
        self.position = Some(WorldPoint::new(x, y));
        self
    }

    /// Attaches a movement component with the given starting velocity.
    #[must_use]
    pub fn movement(mut self, velocity: Velocity) -> Self {
        self.movement = Some(velocity);
        self
    }

    /// Attaches a drawable component read by the external render hook.
    #[must_use]
    pub fn drawable(mut self, sprite: Sprite) -> Self {
        self.drawable = Some(sprite);
        self
    }

    /// Attaches a controller component.
    #[must_use]
    pub fn controller(mut self, controller: Controller) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Attaches an enabled collision component with the given radius.
    #[must_use]
    pub fn collision(mut self, radius: i32) -> Self {
        self.collision = Some(radius);
        self
    }

    /// Attaches a health component.
    #[must_use]
    pub fn health(mut self, health: Health) -> Self {
        self.health = Some(health);
        self
    }

    /// Attaches an attack component.
    #[must_use]
    pub fn attack(mut self, damage: Damage) -> Self {
        self.attack = Some(damage);
        self
    }

    pub(crate) fn into_record(self, grid: &Grid) -> EntityRecord {
        EntityRecord {
            position: self.position.map(|point| PositionState {
                x: point.x(),
                y: point.y(),
                cell: grid.cell_at(point.x(), point.y()),
            }),
            movement: self.movement,
            drawable: self.drawable,
            controller: self.controller,
            collision: self.collision.map(|radius| CollisionBody {
                radius,
                enabled: true,
            }),
            health: self.health,
            attack: self.attack,
            schedule: ScheduleState::Unscheduled,
            destroy_pending: false,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<EntityRecord>,
}

/// Arena of entity slots with generation-tagged handles.
///
/// Freed slots are recycled with a bumped generation, so a handle that
/// survived its entity's destruction can never resolve to the slot's next
/// occupant.
#[derive(Debug, Default)]
pub(crate) struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, record: EntityRecord) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            EntityId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                record: Some(record),
            });
            EntityId::new(index, 0)
        }
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_mut())
    }

    /// Frees the slot and returns its record for teardown.
    pub(crate) fn take(&mut self, id: EntityId) -> Option<EntityRecord> {
        let slot = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())?;
        let record = slot.record.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(record)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EntityId, &EntityRecord)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.record
                .as_ref()
                .map(|record| (EntityId::new(index as u32, slot.generation), record))
        })
    }

    pub(crate) fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.record.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityArena, EntitySpec};
    use crate::grid::{Grid, GridConfig};

    fn record_arena() -> (Grid, EntityArena) {
        (Grid::new(GridConfig::default()), EntityArena::new())
    }

    #[test]
    fn stale_handles_never_reach_recycled_slots() {
        let (grid, mut arena) = record_arena();
        let first = arena.insert(EntitySpec::new().position(10, 10).into_record(&grid));
        assert!(arena.take(first).is_some());

        let second = arena.insert(EntitySpec::new().position(20, 20).into_record(&grid));
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(arena.get(first).is_none());
        assert!(arena.get(second).is_some());
    }

    #[test]
    fn take_is_final() {
        let (grid, mut arena) = record_arena();
        let id = arena.insert(EntitySpec::new().position(0, 0).into_record(&grid));
        assert!(arena.take(id).is_some());
        assert!(arena.take(id).is_none());
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn spec_position_lands_in_matching_cell() {
        let (grid, mut arena) = record_arena();
        let id = arena.insert(EntitySpec::new().position(5, 5).into_record(&grid));
        let record = arena.get(id).expect("live record");
        let position = record.position.expect("position slot");
        assert_eq!(position.cell, grid.cell_at(5, 5));
    }
}
