//! Discrete-event simulation of trains and passengers moving through a
//! synthesized [`Schedule`].
//!
//! Grounded on `sim/simulator.c++`'s `Simulator::runForTime` /
//! `advanceUntilEvent`. The original's recursive mutex — needed so
//! observer callbacks could re-enter the simulator's read API while
//! "paused" — has no counterpart here: [`Simulator::run_for_time`] takes
//! `&mut self`, and observers are only ever invoked with a `&Simulator`
//! borrow between `advance_until_event` calls, when nothing is mutating.
//! The borrow checker enforces statically what the original's lock only
//! documented.

pub mod generator;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::algo::router::{PassengerRouter, RouterConfig};
use crate::ids::{PassengerID, PassengerIDGenerator, RouteID, StationID, TrainID};
use crate::location::{Journey, Location};
use crate::network::TrackNetwork;
use crate::passenger::{Passenger, PassengerRoutes};
use crate::route::TrainRoute;
use crate::schedule::Schedule;
use crate::sim::generator::PassengerGenerator;
use crate::Error;

/// A cooperative cancellation handle. `cancel()` blocks until every
/// in-flight [`Simulator::run_for_time`] call holding a guard has
/// returned, mirroring the original's job-token convention without an
/// actual lock.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<CancelState>);

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    outstanding: AtomicUsize,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Requests cancellation and blocks until all outstanding guards drain.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        while self.0.outstanding.load(Ordering::SeqCst) > 0 {
            std::hint::spin_loop();
        }
    }

    fn enter(&self) -> CancelGuard<'_> {
        self.0.outstanding.fetch_add(1, Ordering::SeqCst);
        CancelGuard(self)
    }
}

struct CancelGuard<'a>(&'a CancelToken);

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        self.0 .0.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub router: RouterConfig,
    pub max_step_size: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            max_step_size: 5.0,
        }
    }
}

#[derive(Debug, Clone)]
struct TrainState {
    id: TrainID,
    route_id: RouteID,
    departure_time: f64,
    edge_number: usize,
    fraction_through_edge: f64,
    boarded: HashSet<PassengerID>,
}

#[derive(Debug, Clone)]
pub struct PassengerExitInfo {
    pub exit_time: f64,
    pub trace: Vec<(Location, f64)>,
}

type Observer<'a> = Box<dyn FnMut(&Simulator<'a>) -> bool + 'a>;

/// One registered observer, with its own cadence tracked independently of
/// every other observer's.
struct ObserverSlot<'a> {
    period: f64,
    last_fired: f64,
    callback: Observer<'a>,
}

/// Owns all mutable simulation state: current time, active trains, who's
/// waiting where, and every passenger's trace and (if completed) exit record.
pub struct Simulator<'a> {
    network: &'a TrackNetwork,
    schedule: &'a Schedule,
    router: PassengerRouter,
    generators: Vec<PassengerGenerator>,
    cancel: CancelToken,

    current_time: f64,
    is_paused: bool,
    observers: Vec<ObserverSlot<'a>>,

    trains: Vec<TrainState>,
    spawned_up_to: HashMap<RouteID, u64>,

    passengers_at_stations: HashMap<StationID, HashSet<PassengerID>>,
    passenger_location: HashMap<PassengerID, Location>,
    passenger_exit_station: HashMap<PassengerID, StationID>,
    passenger_traces: HashMap<PassengerID, Vec<(Location, f64)>>,
    passenger_exits: HashMap<PassengerID, PassengerExitInfo>,
    routes: PassengerRoutes,
    id_gen: PassengerIDGenerator,
}

impl<'a> Simulator<'a> {
    pub fn new(network: &'a TrackNetwork, schedule: &'a Schedule, config: SimConfig) -> Self {
        Self {
            network,
            schedule,
            router: PassengerRouter::new(config.router),
            generators: Vec::new(),
            cancel: CancelToken::new(),
            current_time: 0.0,
            is_paused: false,
            observers: Vec::new(),
            trains: Vec::new(),
            spawned_up_to: HashMap::new(),
            passengers_at_stations: HashMap::new(),
            passenger_location: HashMap::new(),
            passenger_exit_station: HashMap::new(),
            passenger_traces: HashMap::new(),
            passenger_exits: HashMap::new(),
            routes: PassengerRoutes::new(),
            id_gen: PassengerIDGenerator::new(),
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// `true` for the duration of an observer callback (see
    /// [`Self::register_observer`]) and `false` at every other time. The
    /// original's recursive mutex let observers re-enter the simulator's
    /// read API while "paused" between steps; there's no lock here to
    /// re-enter, but the flag still gives an observer a way to tell it's
    /// being called from inside [`Self::run_for_time`] rather than, say,
    /// being polled from unrelated code holding onto a `&Simulator`.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn add_generator(&mut self, generator: PassengerGenerator) {
        self.generators.push(generator);
    }

    /// Injects a passenger directly (bypassing the periodic generators),
    /// useful for seeding a specific scenario.
    pub fn inject_passenger(&mut self, passenger: Passenger) -> Result<(), Error> {
        self.admit_passenger(passenger)
    }

    pub fn passenger_exit(&self, id: PassengerID) -> Option<&PassengerExitInfo> {
        self.passenger_exits.get(&id)
    }

    pub fn passenger_trace(&self, id: PassengerID) -> Option<&[(Location, f64)]> {
        self.passenger_traces.get(&id).map(|v| v.as_slice())
    }

    pub fn active_train_count(&self) -> usize {
        self.trains.len()
    }

    /// Registers an observer, sorted into the list ascending by period. Its
    /// own cadence is tracked independently of every other observer's: it's
    /// invoked every time it's been at least `period` time units since *it*
    /// last fired, not since the shortest-period observer last fired.
    pub fn register_observer(&mut self, period: f64, observer: impl FnMut(&Simulator<'a>) -> bool + 'a) {
        let callback: Observer<'a> = Box::new(observer);
        let slot = ObserverSlot {
            period,
            last_fired: self.current_time,
            callback,
        };
        let pos = self
            .observers
            .iter()
            .position(|s| s.period > period)
            .unwrap_or(self.observers.len());
        self.observers.insert(pos, slot);
    }

    /// Advances the simulation by `duration`, in steps no larger than
    /// `max_step_size`, stopping early for observer notifications and
    /// cooperative cancellation.
    pub fn run_for_time(&mut self, duration: f64, max_step_size: f64) -> Result<(), Error> {
        let _guard = self.cancel.enter();
        let stop_time = self.current_time + duration;

        while self.current_time < stop_time {
            if self.cancel.is_cancelled() {
                break;
            }

            let remaining = stop_time - self.current_time;
            let t_step = self.current_time + remaining.min(max_step_size);
            let t_obs = self
                .observers
                .iter()
                .map(|s| s.last_fired + s.period)
                .fold(f64::INFINITY, f64::min);

            let observer_wins = t_obs < t_step;
            let t_target = if observer_wins { t_obs } else { t_step };

            self.advance_until_event(t_target)?;

            if self.current_time > t_target {
                log::warn!(
                    "advance_until_event overshot its target: {} > {}",
                    self.current_time,
                    t_target
                );
            }

            if observer_wins {
                self.fire_observers();
            }
        }

        Ok(())
    }

    /// Invokes every observer whose own period has elapsed since it last
    /// fired, dropping any that return `false`. Observers that aren't due
    /// yet are left untouched.
    fn fire_observers(&mut self) {
        self.is_paused = true;
        let now = self.current_time;
        let mut observers = std::mem::take(&mut self.observers);
        observers.retain_mut(|slot| {
            if now - slot.last_fired + 1e-9 < slot.period {
                return true;
            }
            slot.last_fired = now;
            (slot.callback)(self)
        });
        self.observers = observers;
        self.is_paused = false;
    }

    /// The core step: deboard completed passengers, instantiate newly
    /// departing trains, inject newly generated passengers, advance every
    /// active train up to `t_target`, then remove trains that terminated.
    fn advance_until_event(&mut self, t_target: f64) -> Result<(), Error> {
        self.deboard_completed_passengers();
        self.instantiate_arriving_trains(t_target)?;
        self.inject_generated_passengers(t_target)?;
        self.advance_trains(t_target)?;
        self.current_time = t_target;
        Ok(())
    }

    fn deboard_completed_passengers(&mut self) {
        let routes = &self.routes;
        for (station, waiting) in self.passengers_at_stations.iter_mut() {
            waiting.retain(|pid| {
                let arrived = routes
                    .get(*pid)
                    .and_then(Journey::last)
                    .is_some_and(|re| re.location == Location::Station(*station));
                !arrived
            });
        }
    }

    fn instantiate_arriving_trains(&mut self, t_target: f64) -> Result<(), Error> {
        for route in self.schedule.routes() {
            let mut index = *self.spawned_up_to.get(&route.id()).unwrap_or(&0);
            loop {
                let departure = route.departure_time(index);
                if departure >= t_target {
                    break;
                }
                if departure < self.current_time {
                    return Err(Error::TrainDepartsInPast(
                        TrainID::new(route.id(), index),
                        self.current_time,
                    ));
                }
                self.trains.push(TrainState {
                    id: TrainID::new(route.id(), index),
                    route_id: route.id(),
                    departure_time: departure,
                    edge_number: 0,
                    fraction_through_edge: 0.0,
                    boarded: HashSet::new(),
                });
                index += 1;
            }
            self.spawned_up_to.insert(route.id(), index);
        }
        Ok(())
    }

    fn inject_generated_passengers(&mut self, t_target: f64) -> Result<(), Error> {
        let generators = self.generators.clone();
        for generator in &generators {
            for passenger in generator.leaving_during_interval(self.current_time, t_target, &mut self.id_gen) {
                self.admit_passenger(passenger)?;
            }
        }
        Ok(())
    }

    fn admit_passenger(&mut self, passenger: Passenger) -> Result<(), Error> {
        let journey = self
            .router
            .route(self.network, self.schedule, passenger.start_time, passenger.entry, passenger.exit)?;

        self.passengers_at_stations
            .entry(passenger.entry)
            .or_default()
            .insert(passenger.id);
        self.passenger_location
            .insert(passenger.id, Location::Station(passenger.entry));
        self.passenger_exit_station.insert(passenger.id, passenger.exit);
        self.passenger_traces
            .insert(passenger.id, vec![(Location::Station(passenger.entry), passenger.start_time)]);
        self.routes.insert(passenger.id, journey);
        Ok(())
    }

    fn advance_trains(&mut self, t_target: f64) -> Result<(), Error> {
        let mut terminated = Vec::new();

        for train_idx in 0..self.trains.len() {
            let departure = self.trains[train_idx].departure_time;
            // `at_time` tracks the exact simulated instant this train has
            // reached so far, which may be strictly between `current_time`
            // and `t_target` once an edge completes partway through a step —
            // station visits must timestamp against that instant, not the
            // step boundary, or a passenger's recorded exit time drifts
            // behind its actual arrival by up to one step.
            let mut at_time = self.current_time.max(departure);

            loop {
                let (route_id, edge_number, fraction) = {
                    let t = &self.trains[train_idx];
                    (t.route_id, t.edge_number, t.fraction_through_edge)
                };
                let route = self
                    .schedule
                    .route(route_id)
                    .expect("active train must reference a route in the schedule");

                if fraction == 0.0 {
                    self.handle_station_visit(train_idx, route, edge_number, at_time)?;
                }

                if edge_number + 1 >= route.path().len() {
                    let boarded = self.trains[train_idx].boarded.len();
                    if boarded > 0 {
                        return Err(Error::PassengersStranded(self.trains[train_idx].id, boarded));
                    }
                    terminated.push(train_idx);
                    break;
                }

                let time_left = t_target - at_time;
                if time_left <= 0.0 {
                    break;
                }

                let edge_distance = self
                    .network
                    .edge_weight(route.path()[edge_number], route.path()[edge_number + 1])
                    .ok_or(Error::InvalidRouteQuery(route.path()[edge_number]))?;
                let full_edge_time = edge_distance / route.speed();
                let remaining_edge_time = (1.0 - fraction) * full_edge_time;

                if remaining_edge_time > time_left {
                    let progress = time_left / full_edge_time;
                    let new_fraction = fraction + progress;
                    if !(0.0..=1.0).contains(&new_fraction) {
                        return Err(Error::TimeWentBackwards(fraction, new_fraction));
                    }
                    self.trains[train_idx].fraction_through_edge = new_fraction;
                    break;
                }

                at_time += remaining_edge_time;
                self.trains[train_idx].edge_number += 1;
                self.trains[train_idx].fraction_through_edge = 0.0;
            }
        }

        for idx in terminated.into_iter().rev() {
            self.trains.remove(idx);
        }
        Ok(())
    }

    fn handle_station_visit(
        &mut self,
        train_idx: usize,
        route: &TrainRoute,
        edge_number: usize,
        at_time: f64,
    ) -> Result<(), Error> {
        let station = route.path()[edge_number];
        let train_id = self.trains[train_idx].id;

        let waiting: Vec<PassengerID> = self
            .passengers_at_stations
            .get(&station)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        for pid in waiting {
            self.move_passenger(pid, Location::Station(station), Location::Train(train_id), at_time)?;
        }

        let boarded: Vec<PassengerID> = self.trains[train_idx].boarded.iter().copied().collect();
        for pid in boarded {
            self.move_passenger(pid, Location::Train(train_id), Location::Station(station), at_time)?;
        }

        Ok(())
    }

    /// Attempts to move `pid` from `from` to `to` at `at_time`. Silently
    /// declined if the passenger's journey doesn't call for this exact
    /// step; fails with [`Error::PassengerDesync`] if the passenger's
    /// recorded location doesn't match `from` at all.
    fn move_passenger(&mut self, pid: PassengerID, from: Location, to: Location, at_time: f64) -> Result<(), Error> {
        let permitted = self.routes.get(pid).is_some_and(|j| j.permits_move(from, to));
        if !permitted {
            return Ok(());
        }

        match self.passenger_location.get(&pid) {
            Some(&loc) if loc == from => {}
            Some(&loc) => return Err(Error::PassengerDesync(pid, from, loc)),
            None => return Err(Error::PassengerDesync(pid, from, from)),
        }

        match (from, to) {
            (Location::Station(s), Location::Train(_)) => {
                if let Some(set) = self.passengers_at_stations.get_mut(&s) {
                    set.remove(&pid);
                }
                if let Some(idx) = self.train_index(to.as_train().unwrap()) {
                    self.trains[idx].boarded.insert(pid);
                }
            }
            (Location::Train(t), Location::Station(s)) => {
                if let Some(idx) = self.train_index(t) {
                    self.trains[idx].boarded.remove(&pid);
                }
                self.passengers_at_stations.entry(s).or_default().insert(pid);
            }
            _ => return Err(Error::InconsistentPath(from, to)),
        }

        self.passenger_location.insert(pid, to);
        let trace = self.passenger_traces.entry(pid).or_default();
        trace.push((to, at_time));

        if let Location::Station(s) = to {
            if self.passenger_exit_station.get(&pid) == Some(&s) {
                self.passenger_exits.insert(
                    pid,
                    PassengerExitInfo {
                        exit_time: at_time,
                        trace: trace.clone(),
                    },
                );
            }
        }

        Ok(())
    }

    fn train_index(&self, id: TrainID) -> Option<usize> {
        self.trains.iter().position(|t| t.id == id)
    }
}
