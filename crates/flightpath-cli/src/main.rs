//! Build a flight path from a route description and print it.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flightpath_core::{composite_from_records, RouteGraph, Waypoint, WaypointDirectory};
use flightpath_schema::{parse_route, parse_waypoints};

/// Build a flight path from a route description file
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Route description JSON file
    route: PathBuf,

    /// Waypoint directory JSON file (defaults to the built-in survey set)
    #[arg(long)]
    waypoints: Option<PathBuf>,

    /// Print per-maneuver and total durations
    #[arg(long)]
    durations: bool,

    /// Emit the assembled route back as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

/// Survey waypoint set used when no directory file is given.
fn builtin_waypoints() -> Vec<Waypoint> {
    vec![
        Waypoint::new("A", 0.0, 0.0),
        Waypoint::new("B", 35.0, 45.0),
        Waypoint::new("C", 100.0, 0.0),
        Waypoint::new("D", 35.0, 135.0),
        Waypoint::new("E", 1.0, 1.0),
    ]
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let waypoints = match &args.waypoints {
        Some(path) => {
            let input = fs::read_to_string(path)
                .with_context(|| format!("reading waypoint file {}", path.display()))?;
            parse_waypoints(&input)?
        }
        None => builtin_waypoints(),
    };

    let mut directory = WaypointDirectory::new();
    for waypoint in waypoints {
        directory.register(waypoint)?;
    }
    tracing::debug!(count = directory.len(), "waypoint directory loaded");

    let input = fs::read_to_string(&args.route)
        .with_context(|| format!("reading route file {}", args.route.display()))?;
    let records = parse_route(&input)?;
    tracing::debug!(count = records.len(), "route description parsed");

    let mut graph = RouteGraph::new();
    let composite = composite_from_records(&mut graph, &directory, &records)?;

    if args.json {
        let records = composite.record_sequence(&graph);
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", composite.describe(&graph, args.durations));
    }

    Ok(())
}
