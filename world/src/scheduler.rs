//! Update scheduler: the working set of entities that receive per-tick
//! simulation, with deferred add/remove/destroy queues.
//!
//! All three queues exist so that requests raised *during* the update pass
//! never mutate the list being iterated. Additions drain at the start of
//! the next tick, removals and destructions at the end of the current one.

use std::collections::VecDeque;

use gridfire_core::{EntityId, Event};

use crate::entity::{EntityArena, ScheduleState};
use crate::grid::Grid;

#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    active: Vec<EntityId>,
    pending_add: VecDeque<EntityId>,
    pending_remove: Vec<EntityId>,
    pending_destroy: VecDeque<EntityId>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues an entity for the active set. Idempotent: entities already
    /// pending or active are left alone.
    pub(crate) fn request_schedule(&mut self, entities: &mut EntityArena, id: EntityId) {
        let Some(record) = entities.get_mut(id) else {
            return;
        };
        if record.schedule != ScheduleState::Unscheduled {
            return;
        }
        record.schedule = ScheduleState::PendingAdd;
        self.pending_add.push_back(id);
        tracing::trace!(entity = id.index(), "entity queued for scheduling");
    }

    /// Queues an entity for end-of-tick teardown. Idempotent: a second
    /// request while one is pending is a no-op.
    pub(crate) fn request_destroy(&mut self, entities: &mut EntityArena, id: EntityId) {
        let Some(record) = entities.get_mut(id) else {
            return;
        };
        if record.destroy_pending {
            return;
        }
        record.destroy_pending = true;
        self.pending_destroy.push_back(id);
        tracing::trace!(entity = id.index(), "entity queued for destruction");
    }

    /// Tick step 1: moves pending additions into the active set.
    pub(crate) fn drain_pending_adds(&mut self, entities: &mut EntityArena) {
        while let Some(id) = self.pending_add.pop_front() {
            let Some(record) = entities.get_mut(id) else {
                continue;
            };
            if record.schedule == ScheduleState::PendingAdd {
                record.schedule = ScheduleState::Active;
                self.active.push(id);
            }
        }
    }

    /// Snapshot of the active set for this tick's scan. Entities scheduled
    /// mid-pass only enter the live list on the next tick, so the snapshot
    /// stays faithful to the set as of step 1.
    pub(crate) fn snapshot_active(&self) -> Vec<EntityId> {
        self.active.clone()
    }

    /// Marks an entity for removal after the scan finishes.
    pub(crate) fn mark_for_removal(&mut self, id: EntityId) {
        self.pending_remove.push(id);
    }

    /// Tick step 3: removes marked entities from the active set, keeping
    /// scan order for the remainder. An entity whose capabilities became
    /// active again later in the same pass is kept.
    pub(crate) fn drain_pending_removals(&mut self, entities: &mut EntityArena) {
        for id in std::mem::take(&mut self.pending_remove) {
            if let Some(record) = entities.get_mut(id) {
                if record.should_update() {
                    continue;
                }
                record.schedule = ScheduleState::Unscheduled;
            }
            Self::remove_from_active(&mut self.active, id);
        }
    }

    /// Tick step 4: runs component teardown for every destruction request
    /// raised this tick, frees the arena slot, and reports the destruction.
    pub(crate) fn drain_pending_destroys(
        &mut self,
        grid: &mut Grid,
        entities: &mut EntityArena,
        out_events: &mut Vec<Event>,
    ) {
        while let Some(id) = self.pending_destroy.pop_front() {
            let Some(mut record) = entities.take(id) else {
                continue;
            };
            // Position is the only component holding an external
            // registration; the rest become inert when the record drops.
            if let Some(position) = record.position.take() {
                grid.remove_ref(position.cell, id);
            }
            Self::remove_from_active(&mut self.active, id);
            out_events.push(Event::EntityDestroyed { entity: id });
            tracing::debug!(entity = id.index(), "entity destroyed");
        }
    }

    fn remove_from_active(active: &mut Vec<EntityId>, id: EntityId) {
        if let Some(found) = active.iter().position(|entry| *entry == id) {
            let _ = active.remove(found);
        }
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn is_scheduled(&self, id: EntityId) -> bool {
        self.active.contains(&id) || self.pending_add.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::Scheduler;
    use crate::entity::{EntityArena, EntitySpec, ScheduleState};
    use crate::grid::{Grid, GridConfig};
    use gridfire_core::Velocity;

    fn fixture() -> (Grid, EntityArena, Scheduler) {
        (
            Grid::new(GridConfig::default()),
            EntityArena::new(),
            Scheduler::new(),
        )
    }

    #[test]
    fn schedule_requests_are_idempotent() {
        let (grid, mut entities, mut scheduler) = fixture();
        let id = entities.insert(
            EntitySpec::new()
                .position(30, 30)
                .movement(Velocity::new(1, 0))
                .into_record(&grid),
        );

        scheduler.request_schedule(&mut entities, id);
        scheduler.request_schedule(&mut entities, id);
        scheduler.drain_pending_adds(&mut entities);

        assert_eq!(scheduler.active_len(), 1);
        assert_eq!(
            entities.get(id).expect("live record").schedule,
            ScheduleState::Active
        );
    }

    #[test]
    fn destroy_requests_collapse_to_one_teardown() {
        let (mut grid, mut entities, mut scheduler) = fixture();
        let id = entities.insert(EntitySpec::new().position(30, 30).into_record(&grid));
        grid.insert_ref(grid.cell_at(30, 30), id);

        scheduler.request_destroy(&mut entities, id);
        scheduler.request_destroy(&mut entities, id);

        let mut events = Vec::new();
        scheduler.drain_pending_destroys(&mut grid, &mut entities, &mut events);

        assert_eq!(events.len(), 1);
        assert!(entities.get(id).is_none());
        assert!(grid.cell_entry(grid.cell_at(30, 30)).refs().is_empty());
    }

    #[test]
    fn removal_keeps_entities_that_reactivated() {
        let (grid, mut entities, mut scheduler) = fixture();
        let id = entities.insert(
            EntitySpec::new()
                .position(30, 30)
                .movement(Velocity::new(2, 0))
                .into_record(&grid),
        );
        scheduler.request_schedule(&mut entities, id);
        scheduler.drain_pending_adds(&mut entities);

        // Marked for removal, but still carrying active velocity.
        scheduler.mark_for_removal(id);
        scheduler.drain_pending_removals(&mut entities);
        assert_eq!(scheduler.active_len(), 1);

        // With the velocity gone the removal sticks.
        entities.get_mut(id).expect("live record").movement = Some(Velocity::new(0, 0));
        scheduler.mark_for_removal(id);
        scheduler.drain_pending_removals(&mut entities);
        assert_eq!(scheduler.active_len(), 0);
        assert_eq!(
            entities.get(id).expect("live record").schedule,
            ScheduleState::Unscheduled
        );
    }
}
