#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridfire.
//!
//! The world owns the terrain grid, the entity arena, and the update
//! scheduler. Adapters drive it exclusively through [`run_tick`] plus the
//! mutation methods on [`World`], and observe it through the [`query`]
//! module and the events each tick appends to the caller's buffer.

use gridfire_core::{CellIndex, EntityId, Event, Health, InputSnapshot, TickError, Velocity};

mod collision;
mod controller;
mod entity;
mod grid;
mod scheduler;

pub use collision::{Reaction, ReactionCtx};
pub use controller::{
    Controller, BULLET_DAMAGE, BULLET_LIFETIME, BULLET_RADIUS, BULLET_SPEED, MAX_SPEED,
};
pub use entity::EntitySpec;
pub use grid::{GridConfig, TILES_PER_CELL};

use collision::LogReaction;
use entity::EntityArena;
use grid::Grid;
use scheduler::Scheduler;

/// Represents the authoritative Gridfire world state.
pub struct World {
    grid: Grid,
    entities: EntityArena,
    scheduler: Scheduler,
    reaction: Box<dyn Reaction>,
    tick_index: u64,
}

impl World {
    /// Creates a new world with the given grid layout and the default
    /// log-only collision reaction.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self {
            grid: Grid::new(config),
            entities: EntityArena::new(),
            scheduler: Scheduler::new(),
            reaction: Box::new(LogReaction),
            tick_index: 0,
        }
    }

    /// Installs the collision reaction invoked for overlapping entity
    /// pairs, replacing the previous one.
    pub fn set_reaction(&mut self, reaction: Box<dyn Reaction>) {
        self.reaction = reaction;
    }

    /// Builds an entity from the blueprint, registers its spatial ref, and
    /// schedules it if any attached capability wants per-tick updates.
    ///
    /// Safe to call mid-tick: the entity enters the active set at the start
    /// of the next tick.
    pub fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let record = spec.into_record(&self.grid);
        let cell = record.position.map(|position| position.cell);
        let wants_updates = record.should_update();
        let id = self.entities.insert(record);
        if let Some(cell) = cell {
            self.grid.insert_ref(cell, id);
        }
        if wants_updates {
            self.scheduler.request_schedule(&mut self.entities, id);
        }
        tracing::debug!(entity = id.index(), "entity spawned");
        id
    }

    /// Queues the entity for the scheduler's active set. Idempotent; a
    /// no-op for stale handles.
    pub fn request_schedule(&mut self, id: EntityId) {
        self.scheduler.request_schedule(&mut self.entities, id);
    }

    /// Queues the entity for end-of-tick teardown. Idempotent; a no-op for
    /// stale handles.
    pub fn request_destroy(&mut self, id: EntityId) {
        self.scheduler.request_destroy(&mut self.entities, id);
    }

    /// Overwrites the entity's pending velocity. A velocity that turns the
    /// movement component active schedules the entity.
    pub fn set_velocity(&mut self, id: EntityId, velocity: Velocity) {
        let activated = match self.entities.get_mut(id) {
            Some(record) if record.movement.is_some() => {
                record.movement = Some(velocity);
                velocity.is_active()
            }
            _ => return,
        };
        if activated {
            self.scheduler.request_schedule(&mut self.entities, id);
        }
    }

    /// Teleports the entity, migrating its spatial ref when the new point
    /// leaves the current cell.
    pub fn set_position(&mut self, id: EntityId, x: i32, y: i32) {
        let Some(record) = self.entities.get_mut(id) else {
            return;
        };
        let Some(position) = record.position.as_mut() else {
            return;
        };
        position.x = x;
        position.y = y;
        let old_cell = position.cell;
        if !self.grid.cell_contains(old_cell, x, y) {
            let new_cell = self.grid.cell_at(x, y);
            position.cell = new_cell;
            self.grid.remove_ref(old_cell, id);
            self.grid.insert_ref(new_cell, id);
        }
    }

    /// Overwrites the entity's health slot; a no-op when the slot is
    /// absent.
    pub fn set_health(&mut self, id: EntityId, health: Health) {
        if let Some(record) = self.entities.get_mut(id) {
            if record.health.is_some() {
                record.health = Some(health);
            }
        }
    }

    /// Toggles the entity's collision component. Enabling schedules the
    /// entity.
    pub fn set_collision_enabled(&mut self, id: EntityId, enabled: bool) {
        let changed = match self.entities.get_mut(id) {
            Some(record) => match record.collision.as_mut() {
                Some(body) => {
                    body.enabled = enabled;
                    enabled
                }
                None => return,
            },
            None => return,
        };
        if changed {
            self.scheduler.request_schedule(&mut self.entities, id);
        }
    }

    /// Toggles the entity's controller. Enabling schedules the entity.
    pub fn set_controller_enabled(&mut self, id: EntityId, enabled: bool) {
        let changed = match self.entities.get_mut(id) {
            Some(record) => match record.controller.as_mut() {
                Some(controller) => {
                    controller.set_enabled(enabled);
                    enabled
                }
                None => return,
            },
            None => return,
        };
        if changed {
            self.scheduler.request_schedule(&mut self.entities, id);
        }
    }

    /// Rewrites one tile's passability, for terrain edits after
    /// construction.
    pub fn set_tile_passable(
        &mut self,
        cell: CellIndex,
        tile_x: u32,
        tile_y: u32,
        passable: bool,
    ) {
        self.grid.set_tile_passable(cell, tile_x, tile_y, passable);
    }
}

/// Advances the world by exactly one tick.
///
/// The tick runs four strictly ordered steps: pending additions join the
/// active set, every active entity updates (controller, then collision,
/// then movement), deactivated entities leave the active set, and finally
/// all destruction requests raised during the tick tear down. Events land
/// in `out_events` in the order they occurred.
pub fn run_tick(
    world: &mut World,
    input: &InputSnapshot,
    out_events: &mut Vec<Event>,
) -> Result<(), TickError> {
    world.scheduler.drain_pending_adds(&mut world.entities);

    for id in world.scheduler.snapshot_active() {
        controller::update(world, id, input);

        // Enabled flags are re-read per step: a controller that disabled a
        // capability this tick suppresses the later steps immediately.
        {
            let World {
                grid,
                entities,
                scheduler,
                reaction,
                ..
            } = world;
            if entities
                .get(id)
                .is_some_and(entity::EntityRecord::collision_enabled)
            {
                collision::resolve(grid, entities, scheduler, reaction.as_mut(), id, out_events)?;
            }
        }

        apply_movement(world, id)?;

        if world
            .entities
            .get(id)
            .is_some_and(|record| !record.should_update())
        {
            world.scheduler.mark_for_removal(id);
        }
    }

    world.scheduler.drain_pending_removals(&mut world.entities);
    world
        .scheduler
        .drain_pending_destroys(&mut world.grid, &mut world.entities, out_events);
    world.tick_index = world.tick_index.saturating_add(1);
    Ok(())
}

/// Applies the entity's pending velocity to its position, migrating the
/// spatial ref when the entity crosses a cell boundary.
fn apply_movement(world: &mut World, id: EntityId) -> Result<(), TickError> {
    let World { grid, entities, .. } = world;
    let Some(record) = entities.get_mut(id) else {
        return Ok(());
    };
    let Some(velocity) = record.movement else {
        return Ok(());
    };
    if !velocity.is_active() {
        return Ok(());
    }
    let Some(position) = record.position.as_mut() else {
        return Err(TickError::MovementWithoutPosition { entity: id });
    };

    position.x += velocity.x();
    position.y += velocity.y();
    let (x, y, old_cell) = (position.x, position.y, position.cell);
    if !grid.cell_contains(old_cell, x, y) {
        let new_cell = grid.cell_at(x, y);
        position.cell = new_cell;
        grid.remove_ref(old_cell, id);
        grid.insert_ref(new_cell, id);
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gridfire_core::{CellIndex, EntityId, Health, Rgb, Velocity, WorldPoint};

    use super::World;

    /// Immutable render payload for one drawable entity.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DrawableSnapshot {
        /// Entity carrying the drawable.
        pub entity: EntityId,
        /// World position at snapshot time.
        pub position: WorldPoint,
        /// Fill color.
        pub color: Rgb,
        /// Disc radius in world units.
        pub size: i32,
    }

    /// Captures every positioned drawable entity, in deterministic order.
    #[must_use]
    pub fn drawables(world: &World) -> Vec<DrawableSnapshot> {
        let mut snapshots: Vec<DrawableSnapshot> = world
            .entities
            .iter()
            .filter_map(|(entity, record)| {
                let sprite = record.drawable?;
                let position = record.position?;
                Some(DrawableSnapshot {
                    entity,
                    position: WorldPoint::new(position.x, position.y),
                    color: sprite.color,
                    size: sprite.size,
                })
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.entity);
        snapshots
    }

    /// World position of the entity, if it is alive and positioned.
    #[must_use]
    pub fn position_of(world: &World, id: EntityId) -> Option<WorldPoint> {
        world
            .entities
            .get(id)
            .and_then(|record| record.position)
            .map(|position| WorldPoint::new(position.x, position.y))
    }

    /// Pending velocity of the entity, if it carries movement.
    #[must_use]
    pub fn velocity_of(world: &World, id: EntityId) -> Option<Velocity> {
        world.entities.get(id).and_then(|record| record.movement)
    }

    /// Remaining health of the entity, if it carries health.
    #[must_use]
    pub fn health_of(world: &World, id: EntityId) -> Option<Health> {
        world.entities.get(id).and_then(|record| record.health)
    }

    /// Cell holding the entity's spatial ref, if it is positioned.
    #[must_use]
    pub fn cell_of(world: &World, id: EntityId) -> Option<CellIndex> {
        world
            .entities
            .get(id)
            .and_then(|record| record.position)
            .map(|position| position.cell)
    }

    /// Cell under a world point, clamped to grid bounds.
    #[must_use]
    pub fn cell_at(world: &World, x: i32, y: i32) -> CellIndex {
        world.grid.cell_at(x, y)
    }

    /// Spatial refs currently registered in a cell.
    #[must_use]
    pub fn cell_refs(world: &World, cell: CellIndex) -> Vec<EntityId> {
        world.grid.cell_entry(cell).refs().to_vec()
    }

    /// Reports whether a tile admits entities.
    #[must_use]
    pub fn is_tile_passable(world: &World, cell: CellIndex, tile_x: u32, tile_y: u32) -> bool {
        world.grid.cell_entry(cell).tile(tile_x, tile_y).is_passable()
    }

    /// Reports whether the entity is in, or queued for, the active set.
    #[must_use]
    pub fn is_scheduled(world: &World, id: EntityId) -> bool {
        world.scheduler.is_scheduled(id)
    }

    /// Reports whether the handle still resolves to a live entity.
    #[must_use]
    pub fn is_alive(world: &World, id: EntityId) -> bool {
        world.entities.get(id).is_some()
    }

    /// Number of live entities in the arena.
    #[must_use]
    pub fn entity_count(world: &World) -> usize {
        world.entities.live_count()
    }

    /// Number of entities in the scheduler's active set.
    #[must_use]
    pub fn active_count(world: &World) -> usize {
        world.scheduler.active_len()
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Grid dimensions in cells, columns then rows.
    #[must_use]
    pub fn grid_dimensions(world: &World) -> (u32, u32) {
        (world.grid.cells_x(), world.grid.cells_y())
    }

    /// Side length of a square tile in world units.
    #[must_use]
    pub fn tile_length(world: &World) -> i32 {
        world.grid.tile_length()
    }
}
