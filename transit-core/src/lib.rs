/*!
# transit-core

A library for synthesizing train schedules over a fixed track network,
routing passengers through the resulting time-expanded schedule, and
running a discrete-event simulation of trains and passengers moving
through it.

Three subsystems, leaves first:

- [`network`] and [`route`] model the static world: a weighted graph of
  stations ([`network::TrackNetwork`]) and repeating train routes
  ([`route::TrainRoute`]) materialized into concrete [`route::Train`]
  instances.
- [`algo::schedule_graph`] lazily expands a [`schedule::Schedule`] into a
  time-expanded graph that [`algo::router::PassengerRouter`] searches with
  an A*-style earliest-arrival search, and [`algo::scheduler`] synthesizes
  a `Schedule` from a `TrackNetwork` and a passenger list in the first
  place.
- [`sim`] advances trains and passengers through a synthesized schedule
  over a bounded time horizon, notifying registered observers along the
  way.
*/

use thiserror::Error;

pub mod algo;
pub mod ids;
pub mod location;
pub mod network;
pub mod passenger;
pub mod report;
pub mod route;
pub mod schedule;
pub mod sim;

/// Errors surfaced anywhere in the crate.
///
/// `NoRoute` is deliberately the only "expected failure" variant that
/// callers are meant to handle rather than propagate: the router returns
/// it as a value, not an error, at its public boundary (see
/// [`algo::router::PassengerRouter::route`]); it appears here so internal
/// plumbing can still use `?`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("vertex {0:?} is not on this route")]
    InvalidRouteQuery(ids::StationID),
    #[error("interval [{0}, {1}) is backwards")]
    BackwardInterval(f64, f64),
    #[error("no route found from {0:?} to {1:?}")]
    NoRoute(ids::StationID, ids::StationID),
    #[error("scheduler strategy does not support a passenger with a non-zero start time")]
    UnsupportedPassenger,
    #[error("train {0:?} reached its terminal with {1} passenger(s) still aboard")]
    PassengersStranded(ids::TrainID, usize),
    #[error("passenger {0:?} expected to be at {1:?} but the simulator found it at {2:?}")]
    PassengerDesync(ids::PassengerID, location::Location, location::Location),
    #[error("station name {0:?} already exists in the network")]
    DuplicateStationName(String),
    #[error("time went backwards during simulation: {0} -> {1}")]
    TimeWentBackwards(f64, f64),
    #[error("train {0:?} departs in the past relative to current simulation time {1}")]
    TrainDepartsInPast(ids::TrainID, f64),
    #[error("inconsistent path: {0:?} -> {1:?} changes station or train mid-ride")]
    InconsistentPath(location::Location, location::Location),
}

pub type Result<T> = std::result::Result<T, Error>;
