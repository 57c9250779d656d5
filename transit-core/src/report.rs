//! Renders the three text report sections: planned passenger routes,
//! actual simulation outcomes, and the synthesized train routes.
//!
//! Grounded on `stats/report_engine.c++`'s `reportPassengerRouteStats` /
//! `reportSimulationPassengerStats` / `reportTrains`: dash-rule section
//! headers, one line per passenger or route, running footer totals. The
//! original writes straight to a file; here it's any `impl std::io::Write`
//! so callers (tests included) can capture the output in memory.

use std::io::{self, Write};

use crate::ids::PassengerID;
use crate::location::{Journey, Location};
use crate::passenger::PassengerList;
use crate::route::TrainRoute;
use crate::schedule::Schedule;
use crate::sim::Simulator;

const SECTION_RULE: &str = "----------------------------------------";

fn journey_path_string(journey: &Journey) -> String {
    journey
        .steps()
        .iter()
        .map(|step| match step.location {
            Location::Station(s) => format!("S{}", s.index().index()),
            Location::Train(t) => format!("T{}-{}", t.route_id().0, t.train_index()),
        })
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// *Passenger Route Statistics*: the journey the router planned for every
/// passenger, regardless of whether a simulation has actually run.
pub fn report_passenger_route_stats(
    out: &mut impl Write,
    passengers: &PassengerList,
    journeys: impl Fn(PassengerID) -> Option<Journey>,
) -> io::Result<()> {
    writeln!(out, "{SECTION_RULE}")?;
    writeln!(out, "Passenger Route Statistics")?;
    writeln!(out, "{SECTION_RULE}")?;

    let mut total_wait = 0.0;
    let mut total_on_train = 0.0;

    for p in passengers.iter() {
        let Some(journey) = journeys(p.id) else {
            writeln!(out, "{}, {}, --, -- : Path = []", p.name, p.start_time)?;
            continue;
        };
        if journey.is_empty() {
            writeln!(out, "{}, {}, --, -- : Path = []", p.name, p.start_time)?;
            continue;
        }
        let boarding_time = journey.steps().get(1).map(|s| s.time).unwrap_or(p.start_time);
        let arrival_time = journey.last().map(|s| s.time).unwrap_or(p.start_time);
        writeln!(
            out,
            "{}, {}, {}, {} : Path = [{}]",
            p.name,
            p.start_time,
            boarding_time,
            arrival_time,
            journey_path_string(&journey)
        )?;
        total_wait += boarding_time - p.start_time;
        total_on_train += arrival_time - boarding_time;
    }

    writeln!(out, "Total waiting time: {total_wait}")?;
    writeln!(out, "Total on-train time: {total_on_train}")?;
    Ok(())
}

/// *Simulation Passenger Statistics*: like the planned report, but reads
/// actual exit times recorded by a [`Simulator`] run, printing `--` for a
/// passenger that never exited.
pub fn report_simulation_passenger_stats(
    out: &mut impl Write,
    passengers: &PassengerList,
    sim: &Simulator,
) -> io::Result<()> {
    writeln!(out, "{SECTION_RULE}")?;
    writeln!(out, "Simulation Passenger Statistics")?;
    writeln!(out, "{SECTION_RULE}")?;

    for p in passengers.iter() {
        match sim.passenger_exit(p.id) {
            Some(exit) => {
                let boarding_time = exit.trace.get(1).map(|(_, t)| *t).unwrap_or(p.start_time);
                writeln!(out, "{}, {}, {}, {}", p.name, p.start_time, boarding_time, exit.exit_time)?;
            }
            None => {
                writeln!(out, "{}, {}, --, --", p.name, p.start_time)?;
            }
        }
    }
    Ok(())
}

/// *Train Routes*: one line per synthesized route, in the
/// `{ Train <id> : Path=[...], Start Offsets={...}, Speed=<v>, Repeat Time=<T> }`
/// format.
pub fn report_trains(out: &mut impl Write, schedule: &Schedule) -> io::Result<()> {
    writeln!(out, "{SECTION_RULE}")?;
    writeln!(out, "Train Routes")?;
    writeln!(out, "{SECTION_RULE}")?;

    for route in schedule.routes() {
        writeln!(out, "{}", format_route(route))?;
    }
    Ok(())
}

fn format_route(route: &TrainRoute) -> String {
    let path = route
        .path()
        .iter()
        .map(|s| format!("S{}", s.index().index()))
        .collect::<Vec<_>>()
        .join(", ");
    let offsets = route
        .start_offsets()
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{{ Train {} : Path=[{}], Start Offsets={{{}}}, Speed={}, Repeat Time={} }}",
        route.id().0,
        path,
        offsets,
        route.speed(),
        route.repeat_time()
    )
}
