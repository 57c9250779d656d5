//! Heuristic synthesis of a [`Schedule`] from a [`TrackNetwork`] and a
//! [`PassengerList`].
//!
//! Two strategies, grounded on `algo/scheduler.c++`'s `Scheduler2` and
//! `Scheduler3`:
//!
//! - [`Strategy::CapacityWeighted`] (S2) iteratively reweights edges by how
//!   often passengers' shortest paths use them, then greedily grows routes
//!   along the highest-demand edges.
//! - [`Strategy::ShortestPathCoalescing`] (S3, the default) seeds one route
//!   per passenger from its shortest path, then repeatedly merges routes
//!   that overlap and drops routes no longer needed once their passengers
//!   are served by a surviving route.
//!
//! Neither strategy claims optimality (see the crate-level Non-goals);
//! both are heuristics that trade off schedule size against route count.

use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::algo::MinScored;
use crate::ids::StationID;
use crate::network::TrackNetwork;
use crate::passenger::PassengerList;
use crate::route::TrainRoute;
use crate::schedule::Schedule;
use crate::Error;

const WEIGHTING_ITERATIONS: usize = 10;
const COALESCE_ITERATIONS: usize = 10;
const EDGE_REWEIGHT_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CapacityWeighted,
    ShortestPathCoalescing,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub strategy: Strategy,
    pub max_trains_at_a_time: usize,
    pub route_speed: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::ShortestPathCoalescing,
            max_trains_at_a_time: 2,
            route_speed: 0.5,
        }
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn schedule(&self, network: &TrackNetwork, passengers: &PassengerList) -> Result<Schedule, Error> {
        match self.config.strategy {
            Strategy::CapacityWeighted => self.schedule_capacity_weighted(network, passengers),
            Strategy::ShortestPathCoalescing => self.schedule_shortest_path_coalescing(network, passengers),
        }
    }

    // ---- S2: capacity-weighted greedy --------------------------------

    fn schedule_capacity_weighted(&self, network: &TrackNetwork, passengers: &PassengerList) -> Result<Schedule, Error> {
        for p in passengers.iter() {
            if p.start_time != 0.0 {
                return Err(Error::UnsupportedPassenger);
            }
        }

        let wanted = self.compute_edge_wanted_capacities(network, passengers);
        let mut schedule = Schedule::new("capacity-weighted");
        let mut covered: HashSet<StationID> = HashSet::new();

        let Some(spawn) = network.station_ids().next() else {
            return Ok(schedule);
        };

        loop {
            let path = self.extend_route_from(network, &wanted, spawn, network.station_count());
            if path.len() < 2 {
                break;
            }
            covered.extend(path.iter().copied());
            let speed = self.config.route_speed;
            schedule.add_route(|id| {
                let repeat = path.len() as f64;
                TrainRoute::new(id, path, vec![0.0], repeat, speed)
            });
            if covered.len() >= network.station_count() {
                break;
            }
        }

        Ok(schedule)
    }

    fn compute_edge_wanted_capacities(
        &self,
        network: &TrackNetwork,
        passengers: &PassengerList,
    ) -> HashMap<EdgeIndex, f64> {
        let mut weights: HashMap<EdgeIndex, f64> = network.edge_indices().map(|e| (e, 1.0)).collect();
        let mut wanted: HashMap<EdgeIndex, f64> = network.edge_indices().map(|e| (e, 1.0)).collect();

        for iteration in 1..=WEIGHTING_ITERATIONS {
            for p in passengers.iter() {
                let edges = shortest_path_edges(network, &weights, p.entry, p.exit);
                for e in edges {
                    *weights.get_mut(&e).unwrap() *= EDGE_REWEIGHT_FACTOR;
                    *wanted.get_mut(&e).unwrap() *= 1.0 + 0.1 / iteration as f64;
                }
            }
        }

        wanted
    }

    /// Greedily extends a route from `spawn`, always preferring the
    /// outgoing edge with the highest wanted capacity toward a vertex not
    /// yet visited by *this* route; falls back to revisiting if every
    /// neighbor is already on the route. Stops once there is no outgoing
    /// edge at all, or the route has visited every station.
    fn extend_route_from(
        &self,
        network: &TrackNetwork,
        wanted: &HashMap<EdgeIndex, f64>,
        spawn: StationID,
        station_count: usize,
    ) -> Vec<StationID> {
        let mut path = vec![spawn];
        let mut on_this_route: HashSet<StationID> = HashSet::from_iter([spawn]);

        while path.len() <= station_count * 2 {
            let current = *path.last().unwrap();
            let mut best_unvisited: Option<(StationID, f64)> = None;
            let mut best_any: Option<(StationID, f64)> = None;

            for edge in network.edges(current.index()) {
                let target = StationID::new(edge.target());
                let w = *wanted.get(&edge.id()).unwrap_or(&0.0);
                let improves_any = match best_any {
                    Some((_, bw)) => w > bw,
                    None => true,
                };
                if improves_any {
                    best_any = Some((target, w));
                }
                let improves_unvisited = match best_unvisited {
                    Some((_, bw)) => w > bw,
                    None => true,
                };
                if !on_this_route.contains(&target) && improves_unvisited {
                    best_unvisited = Some((target, w));
                }
            }

            let Some((next, _)) = best_unvisited.or(best_any) else {
                break;
            };
            path.push(next);
            on_this_route.insert(next);
            if on_this_route.len() >= station_count {
                break;
            }
        }

        path
    }

    // ---- S3: shortest-path coalescing (default) -----------------------

    fn schedule_shortest_path_coalescing(
        &self,
        network: &TrackNetwork,
        passengers: &PassengerList,
    ) -> Result<Schedule, Error> {
        let mut trains: Vec<TrainData> = Vec::with_capacity(passengers.len());
        for p in passengers.iter() {
            let path = shortest_path(network, p.entry, p.exit).ok_or(Error::NoRoute(p.entry, p.exit))?;
            trains.push(TrainData {
                path,
                annotations: vec![(p.entry, p.exit)],
            });
        }

        for _ in 0..COALESCE_ITERATIONS {
            if trains.len() <= self.config.max_trains_at_a_time {
                break;
            }
            let before = trains.len();
            trains = coalesce_once(trains);
            if trains.len() == before {
                break;
            }
        }

        trains = remove_no_longer_needed(trains);

        let mut schedule = Schedule::new("shortest-path-coalescing");
        let speed = self.config.route_speed;
        for t in trains {
            let repeat = t.path.len() as f64;
            schedule.add_route(|id| TrainRoute::new(id, t.path, vec![0.0], repeat, speed));
        }
        Ok(schedule)
    }
}

#[derive(Debug, Clone)]
struct TrainData {
    path: Vec<StationID>,
    annotations: Vec<(StationID, StationID)>,
}

impl TrainData {
    /// Does this route carry a passenger from `src` to `dest`?
    fn satisfies(&self, src: StationID, dest: StationID) -> bool {
        let Some(src_pos) = self.path.iter().position(|&s| s == src) else {
            return false;
        };
        self.path[src_pos..].iter().any(|&s| s == dest)
    }
}

fn is_contiguous_subpath(needle: &[StationID], haystack: &[StationID]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// One coalescing pass: routes whose path is wholly contained (as a
/// contiguous subsequence) in another route are merged into it, carrying
/// their `(src, dest)` annotations along.
fn coalesce_once(trains: Vec<TrainData>) -> Vec<TrainData> {
    let n = trains.len();
    let mut redundant = vec![false; n];
    let mut absorbed_into = vec![usize::MAX; n];

    for i in 0..n {
        if redundant[i] {
            continue;
        }
        for j in (i + 1)..n {
            if redundant[j] {
                continue;
            }
            if trains[j].path == trains[i].path || is_contiguous_subpath(&trains[j].path, &trains[i].path) {
                redundant[j] = true;
                absorbed_into[j] = i;
            } else if is_contiguous_subpath(&trains[i].path, &trains[j].path) {
                redundant[i] = true;
                absorbed_into[i] = j;
                break;
            }
        }
    }

    let mut merged = trains;
    for idx in 0..n {
        if redundant[idx] && absorbed_into[idx] != usize::MAX {
            let annotations = std::mem::take(&mut merged[idx].annotations);
            merged[absorbed_into[idx]].annotations.extend(annotations);
        }
    }

    merged
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !redundant[*i])
        .map(|(_, t)| t)
        .collect()
}

/// Drops any train whose every `(src, dest)` passenger need is also
/// satisfiable by some other remaining train.
///
/// A train may only be covered by a *lower-indexed* survivor: without that
/// ordering, two trains that each satisfy the other's need (e.g. two
/// distinct A->Z paths) would both judge themselves redundant and the
/// schedule would empty out entirely. Processing in reverse with a
/// strict `j < i` dependency means train 0 is never removable and every
/// passenger keeps at least one covering train.
fn remove_no_longer_needed(trains: Vec<TrainData>) -> Vec<TrainData> {
    let n = trains.len();
    let mut removed = vec![false; n];

    for i in (0..n).rev() {
        let covered = trains[i].annotations.iter().all(|&(src, dest)| {
            (0..i).any(|j| !removed[j] && trains[j].satisfies(src, dest))
        });
        if covered {
            removed[i] = true;
        }
    }

    trains
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !removed[*i])
        .map(|(_, t)| t)
        .collect()
}

/// Plain Dijkstra over the static network (not time-expanded), using
/// caller-supplied per-edge weights, returning the edges traversed.
fn shortest_path_edges(
    network: &TrackNetwork,
    weights: &HashMap<EdgeIndex, f64>,
    from: StationID,
    to: StationID,
) -> Vec<EdgeIndex> {
    let mut dist: HashMap<NodeIndex, f64> = HashMap::new();
    let mut prev_edge: HashMap<NodeIndex, EdgeIndex> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(from.index(), 0.0);
    heap.push(MinScored(0.0, from.index()));

    while let Some(MinScored(d, node)) = heap.pop() {
        if node == to.index() {
            break;
        }
        if d > *dist.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }
        for edge in network.edges(node) {
            let w = *weights.get(&edge.id()).unwrap_or(&1.0);
            let next_d = d + w;
            if next_d < *dist.get(&edge.target()).unwrap_or(&f64::INFINITY) {
                dist.insert(edge.target(), next_d);
                prev_edge.insert(edge.target(), edge.id());
                heap.push(MinScored(next_d, edge.target()));
            }
        }
    }

    let mut edges = Vec::new();
    let mut current = to.index();
    while current != from.index() {
        match prev_edge.get(&current) {
            Some(&e) => {
                edges.push(e);
                current = network.edge_endpoints(e).unwrap().0;
            }
            None => return Vec::new(),
        }
    }
    edges.reverse();
    edges
}

/// Plain Dijkstra over the static network's real edge weights, returning
/// the vertex path (or `None` if `to` is unreachable from `from`).
pub(crate) fn shortest_path(network: &TrackNetwork, from: StationID, to: StationID) -> Option<Vec<StationID>> {
    let mut dist: HashMap<NodeIndex, f64> = HashMap::new();
    let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(from.index(), 0.0);
    heap.push(MinScored(0.0, from.index()));

    while let Some(MinScored(d, node)) = heap.pop() {
        if node == to.index() {
            break;
        }
        if d > *dist.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }
        for edge in network.edges(node) {
            let next_d = d + edge.weight().weight;
            if next_d < *dist.get(&edge.target()).unwrap_or(&f64::INFINITY) {
                dist.insert(edge.target(), next_d);
                prev.insert(edge.target(), node);
                heap.push(MinScored(next_d, edge.target()));
            }
        }
    }

    if !dist.contains_key(&to.index()) && from.index() != to.index() {
        return None;
    }

    let mut path = vec![to.index()];
    let mut current = to.index();
    while current != from.index() {
        match prev.get(&current) {
            Some(&p) => {
                path.push(p);
                current = p;
            }
            None => return None,
        }
    }
    path.reverse();
    Some(path.into_iter().map(StationID::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PassengerID;
    use crate::passenger::Passenger;

    fn y_graph() -> (TrackNetwork, StationID, StationID, StationID, StationID, StationID) {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let b = tn.create_vertex("B", 1.0, 1.0).unwrap();
        let c = tn.create_vertex("C", 1.0, -1.0).unwrap();
        let d = tn.create_vertex("D", 2.0, 0.0).unwrap();
        let z = tn.create_vertex("Z", 3.0, 0.0).unwrap();
        tn.add_edge(a, b, 1.0);
        tn.add_edge(a, c, 2.0);
        tn.add_edge(a, d, 2.0);
        tn.add_edge(b, z, 2.0);
        tn.add_edge(c, z, 2.0);
        tn.add_edge(d, z, 1.0);
        (tn, a, b, c, d, z)
    }

    #[test]
    fn shortest_path_finds_minimum_weight_route() {
        let (tn, a, _b, _c, _d, z) = y_graph();
        let path = shortest_path(&tn, a, z).unwrap();
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&z));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn s3_coalesces_shared_destination_down_to_max_trains() {
        let (tn, a, _b, _c, _d, z) = y_graph();
        let passengers: PassengerList = (0..3)
            .map(|i| Passenger::new(PassengerID::new(i), format!("p{i}"), a, z, 0.0))
            .collect();

        let scheduler = Scheduler::new(SchedulerConfig::default());
        let schedule = scheduler.schedule(&tn, &passengers).unwrap();
        assert!(schedule.route_count() <= 2);
    }

    #[test]
    fn s2_rejects_nonzero_start_time() {
        let (tn, a, _b, _c, _d, z) = y_graph();
        let passengers: PassengerList = vec![Passenger::new(PassengerID::new(0), "p0", a, z, 5.0)].into_iter().collect();
        let scheduler = Scheduler::new(SchedulerConfig {
            strategy: Strategy::CapacityWeighted,
            ..SchedulerConfig::default()
        });
        let err = scheduler.schedule(&tn, &passengers).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPassenger));
    }

    #[test]
    fn s3_rejects_unreachable_passenger() {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let isolated = tn.create_vertex("Island", 9.0, 9.0).unwrap();
        let passengers: PassengerList = vec![Passenger::new(PassengerID::new(0), "p0", a, isolated, 0.0)]
            .into_iter()
            .collect();
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let err = scheduler.schedule(&tn, &passengers).unwrap_err();
        assert!(matches!(err, Error::NoRoute(_, _)));
    }
}
