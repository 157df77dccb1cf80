//! End-to-end tick behavior: terrain push-back, reaction dispatch, and the
//! stock controllers.

use std::cell::RefCell;
use std::rc::Rc;

use gridfire_core::{Aim, CellIndex, EntityId, Event, InputSnapshot, Velocity, WorldPoint};
use gridfire_world::{query, run_tick, EntitySpec, GridConfig, Reaction, ReactionCtx, World};

fn small_world() -> World {
    World::new(GridConfig {
        cells_x: 3,
        cells_y: 3,
        tile_length: 20,
    })
}

fn tick(world: &mut World, input: &InputSnapshot) -> Vec<Event> {
    let mut events = Vec::new();
    run_tick(world, input, &mut events).expect("tick");
    events
}

fn idle_tick(world: &mut World) -> Vec<Event> {
    tick(world, &InputSnapshot::idle())
}

/// Records every reaction invocation; optionally stops the scan after the
/// first one.
struct RecordingReaction {
    log: Rc<RefCell<Vec<(EntityId, EntityId)>>>,
    keep_scanning: bool,
}

impl Reaction for RecordingReaction {
    fn on_collide(
        &mut self,
        _ctx: &mut ReactionCtx<'_>,
        first: EntityId,
        second: EntityId,
    ) -> bool {
        self.log.borrow_mut().push((first, second));
        self.keep_scanning
    }
}

#[test]
fn tile_pushback_lands_exactly_on_the_boundary() {
    let mut world = World::new(GridConfig {
        cells_x: 3,
        cells_y: 3,
        tile_length: 40,
    });
    // Touching the top border from below, drifting right into the corner.
    let id = world.spawn(
        EntitySpec::new()
            .position(39, 20)
            .movement(Velocity::new(1, 0))
            .collision(2),
    );

    let _ = idle_tick(&mut world);

    // Two border tiles overlap the entity; the later (rightward) one wins
    // and shoves the entity left so its edge rests one unit clear of it.
    assert_eq!(query::position_of(&world, id), Some(WorldPoint::new(37, 20)));
}

#[test]
fn carved_tile_pushes_back_like_the_border() {
    let mut world = small_world();
    // One interior tile turned solid: [100, 120) x [100, 120).
    world.set_tile_passable(CellIndex::new(0, 0), 5, 5, false);
    let id = world.spawn(
        EntitySpec::new()
            .position(99, 110)
            .movement(Velocity::new(1, 0))
            .collision(2),
    );

    let _ = idle_tick(&mut world);

    // Right edge comes to rest one unit short of the tile.
    assert_eq!(query::position_of(&world, id), Some(WorldPoint::new(97, 110)));
}

#[test]
fn border_overlap_is_corrected_by_the_next_tick() {
    let mut world = small_world();
    // Free-flying mover aimed at the right wall; corrections keep it
    // bouncing inside the open interior forever.
    let id = world.spawn(
        EntitySpec::new()
            .position(240, 250)
            .movement(Velocity::new(5, 0))
            .collision(2),
    );

    let mut was_penetrating = false;
    for _ in 0..400 {
        let _ = idle_tick(&mut world);
        let position = query::position_of(&world, id).expect("position");
        let (x, y) = (position.x(), position.y());
        let penetrating = x - 2 < 20 || x + 2 > 460 || y - 2 < 20 || y + 2 > 460;
        assert!(
            !(was_penetrating && penetrating),
            "still inside the border two ticks running at {position:?}"
        );
        was_penetrating = penetrating;
    }
}

#[test]
fn diagonal_launch_bounces_off_the_corner() {
    let mut world = small_world();
    // Launched from the center straight at the bottom-right corner: every
    // border tile it meets ties the axis comparison, so the corner cluster
    // must correct both axes to turn the entity around.
    let id = world.spawn(
        EntitySpec::new()
            .position(240, 240)
            .movement(Velocity::new(5, 5))
            .collision(2),
    );

    let mut was_penetrating = false;
    for _ in 0..400 {
        let _ = idle_tick(&mut world);
        let position = query::position_of(&world, id).expect("position");
        let (x, y) = (position.x(), position.y());
        assert!(
            x - 2 >= 0 && x + 2 <= 480 && y - 2 >= 0 && y + 2 <= 480,
            "left the world at {position:?}"
        );
        let penetrating = x - 2 < 20 || x + 2 > 460 || y - 2 < 20 || y + 2 > 460;
        assert!(
            !(was_penetrating && penetrating),
            "still inside the border two ticks running at {position:?}"
        );
        was_penetrating = penetrating;
    }
}

#[test]
fn lone_tile_ties_correct_vertically() {
    let mut world = small_world();
    // One interior tile turned solid: [100, 120) x [100, 120).
    world.set_tile_passable(CellIndex::new(0, 0), 5, 5, false);
    // Equal center offsets on both axes against a lone tile: only the
    // vertical velocity is corrected, the horizontal one is kept.
    let id = world.spawn(
        EntitySpec::new()
            .position(99, 99)
            .movement(Velocity::new(1, 1))
            .collision(2),
    );

    let _ = idle_tick(&mut world);

    assert_eq!(query::position_of(&world, id), Some(WorldPoint::new(100, 97)));
}

#[test]
fn held_movement_never_penetrates_the_border() {
    let mut world = small_world();
    let id = world.spawn(
        EntitySpec::new()
            .position(100, 100)
            .movement(Velocity::new(0, 0))
            .collision(2)
            .controller(gridfire_world::Controller::player()),
    );

    let input = InputSnapshot {
        left: true,
        ..InputSnapshot::idle()
    };
    for _ in 0..100 {
        let _ = tick(&mut world, &input);
        let position = query::position_of(&world, id).expect("position");
        // Border tiles end at x = 20; the left edge stays out of them.
        assert!(position.x() - 2 >= 20, "penetrated border at {position:?}");
        assert_eq!(position.y(), 100);
    }
}

#[test]
fn each_scanner_visits_an_overlapping_pair_once() {
    let mut world = small_world();
    let log = Rc::new(RefCell::new(Vec::new()));
    world.set_reaction(Box::new(RecordingReaction {
        log: Rc::clone(&log),
        keep_scanning: true,
    }));

    let first = world.spawn(
        EntitySpec::new()
            .position(100, 100)
            .movement(Velocity::new(0, 0))
            .collision(3),
    );
    let second = world.spawn(
        EntitySpec::new()
            .position(104, 100)
            .movement(Velocity::new(0, 0))
            .collision(3),
    );

    let _ = idle_tick(&mut world);

    let calls = log.borrow();
    assert_eq!(calls.as_slice(), &[(first, second), (second, first)]);
}

#[test]
fn pairs_straddling_a_cell_boundary_still_react_once() {
    let mut world = small_world();
    let log = Rc::new(RefCell::new(Vec::new()));
    world.set_reaction(Box::new(RecordingReaction {
        log: Rc::clone(&log),
        keep_scanning: true,
    }));

    // Cell length is 160; the scanner's bounding square spans two cells
    // while the neighbor's ref lives only in the second one.
    let scanner = world.spawn(
        EntitySpec::new()
            .position(158, 100)
            .movement(Velocity::new(0, 0))
            .collision(5),
    );
    let neighbor = world.spawn(
        EntitySpec::new()
            .position(165, 100)
            .movement(Velocity::new(0, 0))
            .collision(3),
    );

    let _ = idle_tick(&mut world);

    // The scanner visits two cells but reacts to the pair exactly once;
    // the neighbor's own square stays inside the second cell and never
    // reaches back.
    let calls = log.borrow();
    assert_eq!(calls.as_slice(), &[(scanner, neighbor)]);
}

#[test]
fn a_false_reaction_stops_the_scanning_entity() {
    let mut world = small_world();
    let log = Rc::new(RefCell::new(Vec::new()));
    world.set_reaction(Box::new(RecordingReaction {
        log: Rc::clone(&log),
        keep_scanning: false,
    }));

    let scanner = world.spawn(
        EntitySpec::new()
            .position(100, 100)
            .movement(Velocity::new(0, 0))
            .collision(5),
    );
    let _left = world.spawn(
        EntitySpec::new()
            .position(96, 100)
            .movement(Velocity::new(0, 0))
            .collision(3),
    );
    let _right = world.spawn(
        EntitySpec::new()
            .position(104, 100)
            .movement(Velocity::new(0, 0))
            .collision(3),
    );

    let _ = idle_tick(&mut world);

    // The scanner overlaps both neighbors but reacts exactly once.
    let from_scanner = log
        .borrow()
        .iter()
        .filter(|(first, _)| *first == scanner)
        .count();
    assert_eq!(from_scanner, 1);
}

#[test]
fn disabled_collision_skips_the_scan() {
    let mut world = small_world();
    let log = Rc::new(RefCell::new(Vec::new()));
    world.set_reaction(Box::new(RecordingReaction {
        log: Rc::clone(&log),
        keep_scanning: true,
    }));

    let _first = world.spawn(
        EntitySpec::new()
            .position(100, 100)
            .movement(Velocity::new(0, 0))
            .collision(3),
    );
    let second = world.spawn(
        EntitySpec::new()
            .position(104, 100)
            .movement(Velocity::new(0, 0))
            .collision(3),
    );
    world.set_collision_enabled(second, false);

    let _ = idle_tick(&mut world);

    // Neither side reacts: the first entity skips disabled neighbors, the
    // second never scans at all.
    assert!(log.borrow().is_empty());
}

#[test]
fn fired_bullet_travels_and_expires() {
    let mut world = World::new(GridConfig::default());
    let player = world.spawn(
        EntitySpec::new()
            .position(320, 240)
            .movement(Velocity::new(0, 0))
            .collision(12)
            .controller(gridfire_world::Controller::player()),
    );

    let fire = InputSnapshot {
        fire: Some(Aim::new(1, 0)),
        ..InputSnapshot::idle()
    };
    let _ = tick(&mut world, &fire);
    assert_eq!(query::entity_count(&world), 2);

    let mut destroyed = Vec::new();
    for _ in 0..62 {
        for event in idle_tick(&mut world) {
            if let Event::EntityDestroyed { entity } = event {
                destroyed.push(entity);
            }
        }
    }

    assert_eq!(destroyed.len(), 1);
    assert_ne!(destroyed[0], player);
    assert_eq!(query::entity_count(&world), 1);
    assert!(query::is_alive(&world, player));
}

#[test]
fn player_velocity_accelerates_clamps_and_decays() {
    let mut world = small_world();
    let id = world.spawn(
        EntitySpec::new()
            .position(100, 100)
            .movement(Velocity::new(0, 0))
            .controller(gridfire_world::Controller::player()),
    );

    let held = InputSnapshot {
        right: true,
        ..InputSnapshot::idle()
    };
    for _ in 0..7 {
        let _ = tick(&mut world, &held);
    }
    // 1+2+3+4+5+5+5 world units covered while ramping to top speed.
    assert_eq!(query::velocity_of(&world, id), Some(Velocity::new(5, 0)));
    assert_eq!(query::position_of(&world, id), Some(WorldPoint::new(125, 100)));

    for _ in 0..5 {
        let _ = idle_tick(&mut world);
    }
    assert_eq!(query::velocity_of(&world, id), Some(Velocity::new(0, 0)));
    assert_eq!(query::position_of(&world, id), Some(WorldPoint::new(135, 100)));
}
