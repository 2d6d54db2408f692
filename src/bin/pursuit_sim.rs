//! Headless Pursuit Runner
//!
//! Drives a single suspect and a handful of police units through the
//! pursuit subsystem on a sandbox road and prints the outcome.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;
use police_pursuit::core::types::VehicleId;
use police_pursuit::host::{TrafficControl, VehicleQuery};
use police_pursuit::pursuit::{PursuitActionKind, PursuitEvent, PursuitSubsystem};
use police_pursuit::sandbox::{SandboxVehicle, SandboxWorld};
use serde::Serialize;

const SUSPECT: VehicleId = VehicleId(1);
const FIRST_POLICE_ID: u32 = 100;
/// Police this close can spin the suspect out
const PIT_RANGE: f32 = 30.0;

/// Headless Pursuit Runner - one suspect against a police roster
#[derive(Parser, Debug)]
#[command(name = "pursuit_sim")]
#[command(about = "Simulate a police pursuit and report how it ended")]
struct Args {
    /// Number of police units
    #[arg(long, default_value_t = 3)]
    police: u32,

    /// Suspect speed in m/s
    #[arg(long, default_value_t = 22.0)]
    suspect_speed: f32,

    /// Police chase speed in m/s
    #[arg(long, default_value_t = 30.0)]
    police_speed: f32,

    /// Maximum ticks before giving up
    #[arg(long, default_value_t = 6000)]
    max_ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Pursuit variables TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every pursuit event to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct PursuitResult {
    outcome: String,
    ticks: u64,
    seconds: f32,
    max_mode: i8,
    final_score: f32,
    roadblocks_placed: usize,
    roadblocks_reached: u32,
    events: usize,
    seed: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut subsystem = PursuitSubsystem::with_seed(seed);
    if let Some(path) = &args.config {
        if let Err(e) = subsystem.load_variables(path) {
            eprintln!("Warning: Failed to load {:?}: {}", path, e);
            eprintln!("Using default pursuit variables");
        }
    }

    let mut world = build_world(&args);
    for id in world.tracked_vehicles() {
        subsystem.on_vehicle_added(&world, id);
    }
    if let Err(e) = subsystem.set_suspect(&mut world, SUSPECT) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let mut outcome = "timeout";
    let mut max_mode = 0;
    let mut ticks = 0;
    let mut seen = 0;

    while ticks < args.max_ticks {
        ticks += 1;
        subsystem.update(&mut world, args.dt);
        world.advance(args.dt);
        attempt_pit(&subsystem, &mut world);

        if let Some(pursuit) = subsystem.pursuit(SUSPECT) {
            max_mode = max_mode.max(pursuit.mode);
        }

        let events = world.events();
        if args.verbose {
            for event in &events[seen..] {
                print_event(ticks, event);
            }
        }
        seen = events.len();

        let ended = events.iter().rev().find_map(|event| match event.action() {
            Some(PursuitActionKind::Arrest) => Some("arrested"),
            Some(PursuitActionKind::Evade) => Some("evaded"),
            _ => None,
        });
        if let Some(ended) = ended {
            outcome = ended;
            break;
        }
    }

    let pursuit = subsystem.pursuit(SUSPECT).cloned().unwrap_or_default();
    let roadblocks_placed = world
        .events()
        .iter()
        .filter(|event| event.action() == Some(PursuitActionKind::Roadblock))
        .count();
    let roadblocks_reached = world
        .events()
        .iter()
        .map(|event| event.pursuit().state.roadblocks)
        .max()
        .unwrap_or(0);

    let result = PursuitResult {
        outcome: outcome.to_string(),
        ticks,
        seconds: ticks as f32 * args.dt,
        max_mode,
        final_score: pursuit.score,
        roadblocks_placed,
        roadblocks_reached,
        events: world.events().len(),
        seed,
    };

    match args.format.as_str() {
        "text" => {
            println!("=== Pursuit Result ===");
            println!("Outcome: {}", result.outcome);
            println!("Duration: {:.1}s ({} ticks)", result.seconds, result.ticks);
            println!("Highest level: {}", result.max_mode);
            println!("Final score: {:.1}", result.final_score);
            println!(
                "Roadblocks: {} placed, {} reached",
                result.roadblocks_placed, result.roadblocks_reached
            );
            println!("Events: {}", result.events);
            println!("Seed: {}", result.seed);
        }
        _ => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: Failed to serialize result: {}", e);
                std::process::exit(1);
            }
        },
    }
}

/// Straight road along +Y: the suspect heads north, police start behind it
fn build_world(args: &Args) -> SandboxWorld {
    let mut world = SandboxWorld::new();
    world.set_sight_range(250.0);
    world.set_road_ahead(6.0);
    world.settings_mut().random_events = false;

    world.add_vehicle(
        SandboxVehicle::new(SUSPECT, Vec3::ZERO).moving(Vec3::new(0.0, args.suspect_speed, 0.0)),
    );
    for i in 0..args.police {
        let id = VehicleId(FIRST_POLICE_ID + i);
        let position = Vec3::new(4.0 * (i % 2) as f32, -60.0 - 40.0 * i as f32, 0.0);
        world.add_vehicle(
            SandboxVehicle::new(id, position)
                .police()
                .with_cruise_speed(args.police_speed),
        );
    }
    world
}

/// Police stop a level 2+ suspect once the PIT cooldown has run out
fn attempt_pit(subsystem: &PursuitSubsystem, world: &mut SandboxWorld) {
    let Some(pursuit) = subsystem.pursuit(SUSPECT) else {
        return;
    };
    if !pursuit.pit_ready() {
        return;
    }
    let Some(suspect) = world.vehicle(SUSPECT) else {
        return;
    };
    let close = subsystem
        .nearest_police(&*world, suspect.position, Some(SUSPECT))
        .is_some_and(|(_, distance)| distance <= PIT_RANGE);
    if close && suspect.speed() > 0.0 {
        tracing::info!("PIT maneuver stops {}", SUSPECT);
        world.set_velocity(SUSPECT, Vec3::ZERO);
    }
}

fn print_event(tick: u64, event: &PursuitEvent) {
    match event {
        PursuitEvent::Action {
            vehicle,
            action,
            pursuit,
        } => eprintln!(
            "  [{}] {} {:?} (score {:.1})",
            tick,
            vehicle,
            action,
            pursuit.state.score
        ),
        PursuitEvent::ModeUpdate {
            vehicle,
            mode,
            previous,
            ..
        } => eprintln!("  [{}] {} mode {} -> {}", tick, vehicle, previous, mode),
    }
}
