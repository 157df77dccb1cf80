#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scripted Gridfire session.
//!
//! The binary stands in for a real input/render frontend: it feeds a
//! scripted input snapshot into each tick, logs the events the world
//! emits, and prints a summary once the run completes.

mod rate;

use anyhow::Result;
use clap::Parser;
use gridfire_core::{Aim, Event, Health, InputSnapshot, Rgb, Sprite, Velocity};
use gridfire_system_combat::DamageReaction;
use gridfire_world::{query, run_tick, Controller, EntitySpec, GridConfig, World, TILES_PER_CELL};

const PLAYER_RADIUS: i32 = 12;
const DRONE_RADIUS: i32 = 10;
const DRONE_HEALTH: i32 = 30;

const PLAYER_COLOR: Rgb = Rgb::from_rgb(0x58, 0x47, 0xff);
const DRONE_COLOR: Rgb = Rgb::from_rgb(0x2f, 0x95, 0x32);

/// Runs a scripted Gridfire session and reports what happened.
#[derive(Debug, Parser)]
#[command(name = "gridfire")]
struct Args {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 240)]
    ticks: u64,
    /// Grid width in cells.
    #[arg(long, default_value_t = 4)]
    cells_x: u32,
    /// Grid height in cells.
    #[arg(long, default_value_t = 3)]
    cells_y: u32,
    /// Side length of a square tile in world units.
    #[arg(long, default_value_t = 20)]
    tile_length: i32,
    /// Tick rate in ticks per second; 0 runs uncapped.
    #[arg(long, default_value_t = 0)]
    tick_rate: u32,
}

/// Entry point for the Gridfire command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let width = args.cells_x as i32 * TILES_PER_CELL as i32 * args.tile_length;
    let height = args.cells_y as i32 * TILES_PER_CELL as i32 * args.tile_length;

    let mut world = World::new(GridConfig {
        cells_x: args.cells_x,
        cells_y: args.cells_y,
        tile_length: args.tile_length,
    });
    world.set_reaction(Box::new(DamageReaction::new()));

    let player = world.spawn(
        EntitySpec::new()
            .position(width / 4, height / 2)
            .movement(Velocity::new(0, 0))
            .drawable(Sprite {
                color: PLAYER_COLOR,
                size: PLAYER_RADIUS,
            })
            .collision(PLAYER_RADIUS)
            .controller(Controller::player()),
    );
    for step in 1..=3 {
        let _ = world.spawn(
            EntitySpec::new()
                .position(width / 2 + (step - 1) * width / 8, height / 2)
                .movement(Velocity::new(0, 0))
                .drawable(Sprite {
                    color: DRONE_COLOR,
                    size: DRONE_RADIUS,
                })
                .collision(DRONE_RADIUS)
                .health(Health::new(DRONE_HEALTH)),
        );
    }

    let mut pacer = rate::TickRate::new(args.tick_rate);
    let mut events = Vec::new();
    let mut destroyed = 0u64;
    for tick_number in 0..args.ticks {
        run_tick(&mut world, &scripted_input(tick_number), &mut events)?;
        for event in events.drain(..) {
            match event {
                Event::EntityDestroyed { entity } => {
                    destroyed += 1;
                    tracing::info!(tick = tick_number, entity = entity.index(), "destroyed");
                }
                Event::DamageDealt {
                    attacker,
                    target,
                    amount,
                    remaining,
                } => {
                    tracing::info!(
                        tick = tick_number,
                        attacker = attacker.index(),
                        target = target.index(),
                        amount,
                        remaining,
                        "damage dealt"
                    );
                }
            }
        }
        if let Some(pacer) = pacer.as_mut() {
            pacer.wait();
        }
    }

    let position = query::position_of(&world, player)
        .map_or_else(|| "destroyed".to_owned(), |point| format!("{point:?}"));
    println!("ticks simulated:    {}", query::tick_index(&world));
    println!("entities remaining: {}", query::entity_count(&world));
    println!("entities destroyed: {destroyed}");
    println!("player:             {position}");
    Ok(())
}

/// Scripted stand-in for device polling: bursts of rightward movement with
/// a shot every thirty ticks.
fn scripted_input(tick: u64) -> InputSnapshot {
    InputSnapshot {
        right: tick % 120 < 40,
        fire: (tick % 30 == 10).then_some(Aim::new(1, 0)),
        ..InputSnapshot::idle()
    }
}
