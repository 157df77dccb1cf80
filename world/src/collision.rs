//! Collision broad-phase and resolution.
//!
//! Each collidable entity scans only the cells overlapping its bounding
//! square. Impassable tiles push the entity's *pending velocity* back along
//! the deeper penetration axis (the correction lands before movement-apply,
//! so the entity never enters the tile); overlapping entities are handed to
//! the installed [`Reaction`], whose `false` return stops the remaining
//! scan immediately.

use gridfire_core::{
    CellIndex, ComponentKind, Damage, EntityId, Event, Health, TickError, Velocity,
};

use crate::entity::EntityArena;
use crate::grid::{Grid, TILES_PER_CELL};
use crate::scheduler::Scheduler;

/// Mutable state a reaction may touch while two entities overlap.
///
/// Deliberately narrow: reactions can read and write Health, read Attack,
/// raise destruction requests, and emit events. Positions and the spatial
/// index stay out of reach, so a reaction can never corrupt the scan that
/// is invoking it.
pub struct ReactionCtx<'a> {
    entities: &'a mut EntityArena,
    scheduler: &'a mut Scheduler,
    events: &'a mut Vec<Event>,
}

impl ReactionCtx<'_> {
    /// Health carried by the entity, if any.
    #[must_use]
    pub fn health_of(&self, id: EntityId) -> Option<Health> {
        self.entities.get(id).and_then(|record| record.health)
    }

    /// Attack damage carried by the entity, if any.
    #[must_use]
    pub fn attack_of(&self, id: EntityId) -> Option<Damage> {
        self.entities.get(id).and_then(|record| record.attack)
    }

    /// Overwrites the entity's health slot; no-op when the slot is absent.
    pub fn set_health(&mut self, id: EntityId, health: Health) {
        if let Some(record) = self.entities.get_mut(id) {
            if record.health.is_some() {
                record.health = Some(health);
            }
        }
    }

    /// Requests end-of-tick destruction of the entity. Idempotent.
    pub fn request_destroy(&mut self, id: EntityId) {
        self.scheduler.request_destroy(self.entities, id);
    }

    /// Emits an event into the tick's outgoing buffer.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// Reaction invoked once per overlapping entity pair per tick.
///
/// Returning `false` stops the scanning entity's remaining neighborhood
/// scan for this tick. That early exit is part of the contract, not an
/// optimization: reactions may have side effects that gate further checks.
pub trait Reaction {
    /// Called with the scanning entity first and the overlapped entity
    /// second.
    fn on_collide(&mut self, ctx: &mut ReactionCtx<'_>, first: EntityId, second: EntityId)
        -> bool;
}

/// Default reaction: logs the contact and keeps scanning.
#[derive(Debug, Default)]
pub(crate) struct LogReaction;

impl Reaction for LogReaction {
    fn on_collide(
        &mut self,
        _ctx: &mut ReactionCtx<'_>,
        first: EntityId,
        second: EntityId,
    ) -> bool {
        tracing::trace!(
            first = first.index(),
            second = second.index(),
            "entities collided"
        );
        true
    }
}

/// Resolves collisions for one scanning entity.
///
/// Cells are visited row-major and, within a cell, tiles before entities,
/// so the outcome of competing corrections is deterministic for identical
/// inputs.
pub(crate) fn resolve(
    grid: &Grid,
    entities: &mut EntityArena,
    scheduler: &mut Scheduler,
    reaction: &mut dyn Reaction,
    id: EntityId,
    events: &mut Vec<Event>,
) -> Result<(), TickError> {
    let Some(record) = entities.get(id) else {
        return Ok(());
    };
    let Some(body) = record.collision else {
        return Ok(());
    };
    let Some(position) = record.position else {
        return Err(TickError::CollisionPrerequisite {
            entity: id,
            missing: ComponentKind::Position,
        });
    };
    if record.movement.is_none() {
        return Err(TickError::CollisionPrerequisite {
            entity: id,
            missing: ComponentKind::Movement,
        });
    }

    let (x, y, radius) = (position.x, position.y, body.radius);
    let left = x - radius;
    let right = x + radius;
    let top = y - radius;
    let bottom = y + radius;
    let (min_cell, max_cell) = grid.cell_span(left, top, right, bottom);
    let stacked = solid_overlap_count(grid, min_cell, max_cell, left, top, right, bottom) > 1;

    for cell_row in min_cell.row()..=max_cell.row() {
        for cell_column in min_cell.column()..=max_cell.column() {
            let index = CellIndex::new(cell_column, cell_row);
            let cell = grid.cell_entry(index);
            let (cell_left, cell_top) = grid.cell_origin(index);
            let tile_length = grid.tile_length();

            // Tile overlap: push the pending velocity out along the axis
            // of deeper penetration. A tie against a lone tile goes to the
            // vertical correction; a tie inside a cluster of solid tiles
            // (a wall corner) corrects both axes, since no single-axis push
            // clears the cluster and the uncorrected axis would carry the
            // entity through it.
            for tile_y in 0..TILES_PER_CELL {
                let tile_top = cell_top + tile_y as i32 * tile_length;
                let tile_bottom = tile_top + tile_length;
                if bottom < tile_top || top > tile_bottom {
                    continue;
                }
                for tile_x in 0..TILES_PER_CELL {
                    let tile_left = cell_left + tile_x as i32 * tile_length;
                    let tile_right = tile_left + tile_length;
                    if right < tile_left || left > tile_right {
                        continue;
                    }
                    if cell.tile(tile_x, tile_y).is_passable() {
                        continue;
                    }

                    let mid_x = (tile_left + tile_right) / 2;
                    let mid_y = (tile_top + tile_bottom) / 2;
                    let half = tile_length / 2;
                    let Some(scanning) = entities.get_mut(id) else {
                        return Ok(());
                    };
                    let Some(velocity) = scanning.movement.as_mut() else {
                        return Ok(());
                    };
                    let from_mid_x = (mid_x - x).abs();
                    let from_mid_y = (mid_y - y).abs();
                    if from_mid_x > from_mid_y || (from_mid_x == from_mid_y && stacked) {
                        let corrected = if mid_x < x {
                            1 + radius + half - (x - mid_x)
                        } else {
                            -1 + (mid_x - x) - radius - half
                        };
                        *velocity = Velocity::new(corrected, velocity.y());
                    }
                    if from_mid_x <= from_mid_y {
                        let corrected = if mid_y < y {
                            1 + radius + half - (y - mid_y)
                        } else {
                            -1 + (mid_y - y) - radius - half
                        };
                        *velocity = Velocity::new(velocity.x(), corrected);
                    }
                }
            }

            // Entity overlap: each neighbor's spatial ref lives in exactly
            // one cell, so every overlapping pair is visited once per tick.
            for &other in cell.refs() {
                if other == id {
                    continue;
                }
                let Some(neighbor) = entities.get(other) else {
                    continue;
                };
                let Some(neighbor_body) = neighbor.collision else {
                    continue;
                };
                if !neighbor_body.enabled {
                    continue;
                }
                let Some(neighbor_position) = neighbor.position else {
                    continue;
                };

                let clear = radius + neighbor_body.radius;
                let dx = x - neighbor_position.x;
                let dy = y - neighbor_position.y;
                if dx * dx + dy * dy <= clear * clear {
                    let mut ctx = ReactionCtx {
                        entities: &mut *entities,
                        scheduler: &mut *scheduler,
                        events: &mut *events,
                    };
                    if !reaction.on_collide(&mut ctx, id, other) {
                        return Ok(());
                    }
                }
            }
        }
    }

    Ok(())
}

/// Counts the impassable tiles overlapping a bounding square across the
/// cells it spans. Used to tell a lone tile contact apart from a cluster.
fn solid_overlap_count(
    grid: &Grid,
    min_cell: CellIndex,
    max_cell: CellIndex,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
) -> usize {
    let mut count = 0;
    for cell_row in min_cell.row()..=max_cell.row() {
        for cell_column in min_cell.column()..=max_cell.column() {
            let index = CellIndex::new(cell_column, cell_row);
            let cell = grid.cell_entry(index);
            let (cell_left, cell_top) = grid.cell_origin(index);
            let tile_length = grid.tile_length();
            for tile_y in 0..TILES_PER_CELL {
                let tile_top = cell_top + tile_y as i32 * tile_length;
                if bottom < tile_top || top > tile_top + tile_length {
                    continue;
                }
                for tile_x in 0..TILES_PER_CELL {
                    let tile_left = cell_left + tile_x as i32 * tile_length;
                    if right < tile_left || left > tile_left + tile_length {
                        continue;
                    }
                    if !cell.tile(tile_x, tile_y).is_passable() {
                        count += 1;
                    }
                }
            }
        }
    }
    count
}
