//! Earliest-arrival passenger routing over a [`ScheduleGraph`].
//!
//! Grounded on `algo/passenger_routing.c++`'s `route_through_schedule` and
//! `extract_coalesced_path`. The original throws `found_goal`/`no_route`
//! from inside a Boost Graph Library visitor to unwind the search early;
//! here that's a plain early `return` from the search loop. It also runs
//! a *tree* A* (no closed set, just a predecessor hashmap) since vertex
//! descriptors carry unbounded time values and can't be densely indexed —
//! that part of the original's design is kept as-is.

use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};

use crate::algo::schedule_graph::{ScheduleGraph, VertexDescriptor};
use crate::algo::MinScored;
use crate::ids::StationID;
use crate::location::{Journey, Location, RouteElement};
use crate::network::TrackNetwork;
use crate::schedule::Schedule;
use crate::Error;

/// A station already popped during this search is heavily penalized so
/// the search prefers stations it hasn't tried yet over cycling a platform.
const VISITED_STATION_PENALTY: f64 = 100_000.0;

#[derive(Debug, Clone, Copy)]
pub struct RouterConfig {
    /// Station lookahead quantum fed to the [`ScheduleGraph`].
    pub quantum: f64,
    /// Search is abandoned once a popped vertex's time exceeds
    /// `start_time + horizon`.
    pub horizon: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            quantum: 5.0,
            horizon: 100.0,
        }
    }
}

pub struct PassengerRouter {
    config: RouterConfig,
}

impl PassengerRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Finds the earliest-arrival journey from `entry` to `goal`, departing
    /// no earlier than `start_time`. Returns an empty [`Journey`] (not an
    /// `Err`) if the search exhausts without finding the goal or exceeds
    /// the horizon — both are expected, logged outcomes, not invariant
    /// violations.
    pub fn route(
        &self,
        network: &TrackNetwork,
        schedule: &Schedule,
        start_time: f64,
        entry: StationID,
        goal: StationID,
    ) -> Result<Journey, Error> {
        let graph = ScheduleGraph::new(network, schedule, self.config.quantum);
        let start = VertexDescriptor::new(entry, start_time, Location::Station(entry));

        let mut g_score: HashMap<VertexDescriptor, f64> = HashMap::new();
        let mut predecessors: HashMap<VertexDescriptor, VertexDescriptor> = HashMap::new();
        let mut visited_stations: HashSet<StationID> = HashSet::new();
        let mut open: BinaryHeap<MinScored<VertexDescriptor>> = BinaryHeap::new();

        g_score.insert(start, 0.0);
        open.push(MinScored(Self::heuristic(start, &visited_stations), start));

        while let Some(MinScored(_, vd)) = open.pop() {
            if vd.vertex == goal && vd.location.is_station() {
                return self.extract_journey(&predecessors, start, vd);
            }

            if vd.time > start_time + self.config.horizon {
                log::warn!(
                    "routing from {:?} to {:?}: exceeded horizon at t={}",
                    entry,
                    goal,
                    vd.time
                );
                return Ok(Journey::empty());
            }

            if vd.location.is_station() {
                visited_stations.insert(vd.vertex);
            }

            let g = g_score[&vd];
            for next in graph.out_edges(vd)? {
                let tentative_g = g + graph.edge_weight(vd, next);
                let improves = match g_score.get(&next) {
                    Some(&existing) => tentative_g < existing,
                    None => true,
                };
                if improves {
                    g_score.insert(next, tentative_g);
                    predecessors.insert(next, vd);
                    let h = Self::heuristic(next, &visited_stations);
                    open.push(MinScored(tentative_g + h, next));
                }
            }
        }

        log::warn!("routing from {:?} to {:?}: search space exhausted", entry, goal);
        Ok(Journey::empty())
    }

    fn heuristic(vd: VertexDescriptor, visited_stations: &HashSet<StationID>) -> f64 {
        if vd.location.is_station() && visited_stations.contains(&vd.vertex) {
            VISITED_STATION_PENALTY
        } else {
            1.0
        }
    }

    /// Walks `predecessors` from `goal` back to `start`, coalescing
    /// consecutive steps at the same location into one (keeping the
    /// earliest time) and validating that the path never silently
    /// changes station or train mid-ride.
    fn extract_journey(
        &self,
        predecessors: &HashMap<VertexDescriptor, VertexDescriptor>,
        start: VertexDescriptor,
        goal: VertexDescriptor,
    ) -> Result<Journey, Error> {
        let mut reversed = vec![RouteElement::new(goal.location, goal.time)];
        let mut current = goal;

        while current != start {
            let prev = *predecessors
                .get(&current)
                .expect("every non-start vertex on the search frontier has a predecessor");

            if prev.time > current.time {
                return Err(Error::TimeWentBackwards(prev.time, current.time));
            }
            match (prev.location, current.location) {
                (Location::Station(a), Location::Station(b)) if a != b => {
                    return Err(Error::InconsistentPath(prev.location, current.location))
                }
                (Location::Train(a), Location::Train(b)) if a != b => {
                    return Err(Error::InconsistentPath(prev.location, current.location))
                }
                _ => {}
            }

            if reversed.last().unwrap().location == prev.location {
                reversed.last_mut().unwrap().time = prev.time;
            } else {
                reversed.push(RouteElement::new(prev.location, prev.time));
            }
            current = prev;
        }

        reversed.reverse();
        Ok(Journey::from_steps(reversed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RouteID;
    use crate::route::TrainRoute;

    #[test]
    fn single_edge_route_boards_and_alights() {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let z = tn.create_vertex("Z", 1.0, 0.0).unwrap();
        tn.add_edge(a, z, 1.0);

        let mut schedule = Schedule::new("s");
        schedule.add_route(|id| TrainRoute::new(id, vec![a, z], vec![0.0], 2.0, 0.5));

        let router = PassengerRouter::new(RouterConfig::default());
        let journey = router.route(&tn, &schedule, 0.0, a, z).unwrap();

        assert!(journey.is_valid());
        assert_eq!(journey.first().unwrap().location, Location::Station(a));
        assert_eq!(journey.last().unwrap().location, Location::Station(z));
        assert_eq!(journey.last().unwrap().time, 2.0);
    }

    #[test]
    fn unreachable_destination_returns_empty_journey() {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let isolated = tn.create_vertex("Island", 5.0, 5.0).unwrap();
        let schedule = Schedule::new("s");

        let router = PassengerRouter::new(RouterConfig::default());
        let journey = router.route(&tn, &schedule, 0.0, a, isolated).unwrap();
        assert!(journey.is_empty());
    }

    #[test]
    fn tight_horizon_aborts_without_error() {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let z = tn.create_vertex("Z", 1.0, 0.0).unwrap();
        tn.add_edge(a, z, 1000.0);

        let mut schedule = Schedule::new("s");
        schedule.add_route(|id| TrainRoute::new(id, vec![a, z], vec![0.0], 2000.0, 0.5));

        let router = PassengerRouter::new(RouterConfig { quantum: 5.0, horizon: 1.0 });
        let journey = router.route(&tn, &schedule, 0.0, a, z).unwrap();
        assert!(journey.is_empty());
    }
}
