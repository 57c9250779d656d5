use clap::Parser;
use hashbrown::HashMap;

use transit_core::algo::router::{PassengerRouter, RouterConfig};
use transit_core::algo::scheduler::{Scheduler, SchedulerConfig};
use transit_core::ids::{PassengerID, PassengerIDGenerator};
use transit_core::location::Journey;
use transit_core::network::TrackNetwork;
use transit_core::passenger::{Passenger, PassengerList};
use transit_core::report::{report_passenger_route_stats, report_simulation_passenger_stats, report_trains};
use transit_core::sim::{SimConfig, Simulator};

/// Demo wiring for the train-scheduling/passenger-routing core: builds a
/// small fixed network and passenger list in-process, synthesizes a
/// schedule, runs a bounded simulation, and prints the three-section
/// report to stdout.
///
/// Parsing real network/passenger spec files is not this binary's job —
/// that's left to a collaborator upstream of `transit-core`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// How long to run the simulation for.
    #[arg(long, default_value_t = 40.0)]
    duration: f64,

    /// Maximum simulated time advanced per internal step.
    #[arg(long, default_value_t = 5.0)]
    max_step: f64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    log::info!("starting demo run: duration={} max_step={}", args.duration, args.max_step);

    let mut network = TrackNetwork::new();
    let a = network.create_vertex("A", 0.0, 0.0).expect("fresh network");
    let b = network.create_vertex("B", 1.0, 1.0).expect("fresh network");
    let c = network.create_vertex("C", 1.0, -1.0).expect("fresh network");
    let z = network.create_vertex("Z", 2.0, 0.0).expect("fresh network");
    network.add_edge(a, b, 1.0);
    network.add_edge(a, c, 2.0);
    network.add_edge(b, z, 2.0);
    network.add_edge(c, z, 1.0);

    let mut id_gen = PassengerIDGenerator::new();
    let passengers: PassengerList = [0.0, 0.0, 0.0]
        .iter()
        .map(|&start_time| {
            let id = id_gen.next_id();
            Passenger::new(id, format!("demo-{}", id.raw()), a, z, start_time)
        })
        .collect();

    let scheduler = Scheduler::new(SchedulerConfig::default());
    let schedule = match scheduler.schedule(&network, &passengers) {
        Ok(schedule) => schedule,
        Err(err) => {
            log::error!("scheduling failed: {err}");
            std::process::exit(1);
        }
    };
    log::info!("synthesized {} route(s)", schedule.route_count());

    let router = PassengerRouter::new(RouterConfig::default());
    let mut planned: HashMap<PassengerID, Journey> = HashMap::new();
    for p in passengers.iter() {
        let journey = router
            .route(&network, &schedule, p.start_time, p.entry, p.exit)
            .unwrap_or_else(|_| Journey::empty());
        planned.insert(p.id, journey);
    }

    let mut sim = Simulator::new(&network, &schedule, SimConfig::default());
    for p in passengers.iter() {
        if let Err(err) = sim.inject_passenger(p.clone()) {
            log::error!("failed to inject passenger {}: {err}", p.name);
            std::process::exit(1);
        }
    }

    if let Err(err) = sim.run_for_time(args.duration, args.max_step) {
        log::error!("simulation failed: {err}");
        std::process::exit(1);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    report_passenger_route_stats(&mut out, &passengers, |id| planned.get(&id).cloned())
        .expect("writing to stdout should not fail");
    report_simulation_passenger_stats(&mut out, &passengers, &sim).expect("writing to stdout should not fail");
    report_trains(&mut out, &schedule).expect("writing to stdout should not fail");
}
