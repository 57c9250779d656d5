//! Lazy time-expanded view over a [`Schedule`]: `(station, time, location)`
//! vertices with edges for boarding a train, staying aboard to the next
//! stop, or waiting one quantum at a station.
//!
//! Grounded on `algo/schedule_to_graph_adapter.c++`'s `getConnectingVertex`,
//! with the Boost Graph Library visitor/property-map indirection dropped:
//! callers ask for a vertex's out-edges directly instead of iterating a
//! `(begin, end)` pair of opaque edge descriptors one index at a time.

use crate::ids::StationID;
use crate::location::Location;
use crate::network::TrackNetwork;
use crate::schedule::Schedule;
use crate::Error;

/// A vertex of the time-expanded graph: a station, a time, and whether
/// that time is spent waiting at the station or riding a train through it.
#[derive(Debug, Clone, Copy)]
pub struct VertexDescriptor {
    pub vertex: StationID,
    pub time: f64,
    pub location: Location,
}

impl VertexDescriptor {
    pub fn new(vertex: StationID, time: f64, location: Location) -> Self {
        Self { vertex, time, location }
    }
}

impl PartialEq for VertexDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.vertex == other.vertex
            && self.location == other.location
            && self.time.to_bits() == other.time.to_bits()
    }
}

impl Eq for VertexDescriptor {}

impl std::hash::Hash for VertexDescriptor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.vertex.hash(state);
        self.location.hash(state);
        self.time.to_bits().hash(state);
    }
}

/// A read-only, lazily-expanded view of `(TrackNetwork, Schedule)` as a
/// time-expanded graph. Cheap to construct; safe to share across threads
/// since it only borrows immutable state.
pub struct ScheduleGraph<'a> {
    network: &'a TrackNetwork,
    schedule: &'a Schedule,
    /// Station "lookahead" quantum: a waiting passenger considers trains
    /// boardable within `[t, t+quantum)` before falling back to waiting.
    quantum: f64,
}

impl<'a> ScheduleGraph<'a> {
    pub fn new(network: &'a TrackNetwork, schedule: &'a Schedule, quantum: f64) -> Self {
        Self {
            network,
            schedule,
            quantum,
        }
    }

    /// The out-edges of `src`, as target vertex descriptors. Edge weight
    /// is always `target.time - src.time` (see [`Self::edge_weight`]).
    pub fn out_edges(&self, src: VertexDescriptor) -> Result<Vec<VertexDescriptor>, Error> {
        match src.location {
            Location::Train(train_id) => self.train_out_edges(src, train_id),
            Location::Station(station_id) => self.station_out_edges(src, station_id),
        }
    }

    fn train_out_edges(
        &self,
        src: VertexDescriptor,
        train_id: crate::ids::TrainID,
    ) -> Result<Vec<VertexDescriptor>, Error> {
        let mut out = Vec::with_capacity(2);

        // Alighting always takes one time unit and lands back at the same station.
        out.push(VertexDescriptor::new(
            src.vertex,
            src.time + 1.0,
            Location::Station(src.vertex),
        ));

        let route = self
            .schedule
            .route(train_id.route_id())
            .ok_or(Error::InvalidRouteQuery(src.vertex))?;
        let train = route.make_train_from_index(train_id.train_index());
        if let Some((next_station, arrival)) = train.next_stop_after_time(route, self.network, src.time)? {
            out.push(VertexDescriptor::new(next_station, arrival, Location::Train(train_id)));
        }

        Ok(out)
    }

    fn station_out_edges(
        &self,
        src: VertexDescriptor,
        station_id: StationID,
    ) -> Result<Vec<VertexDescriptor>, Error> {
        let mut out = Vec::new();

        for route in self.schedule.routes() {
            let mut skip = 0usize;
            loop {
                let trains = route.trains_at_vertex_in_interval(
                    self.network,
                    station_id,
                    (src.time, src.time + self.quantum),
                    skip,
                )?;
                if trains.is_empty() {
                    break;
                }
                for (train, arrival) in trains {
                    out.push(VertexDescriptor::new(station_id, arrival, Location::Train(train.id)));
                }
                skip += 1;
            }
        }

        // After every boardable train in this quantum, the passenger can
        // always simply wait one quantum at the station.
        out.push(VertexDescriptor::new(
            station_id,
            src.time + self.quantum,
            Location::Station(station_id),
        ));

        Ok(out)
    }

    pub fn edge_weight(&self, from: VertexDescriptor, to: VertexDescriptor) -> f64 {
        to.time - from.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RouteID;
    use crate::route::TrainRoute;

    fn linear_network() -> (TrackNetwork, StationID, StationID) {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let z = tn.create_vertex("Z", 1.0, 0.0).unwrap();
        tn.add_edge(a, z, 1.0);
        (tn, a, z)
    }

    #[test]
    fn station_out_edges_include_boarding_and_wait() {
        let (tn, a, z) = linear_network();
        let mut schedule = Schedule::new("s");
        schedule.add_route(|id| TrainRoute::new(id, vec![a, z], vec![0.0], 2.0, 0.5));

        let graph = ScheduleGraph::new(&tn, &schedule, 5.0);
        let src = VertexDescriptor::new(a, 0.0, Location::Station(a));
        let edges = graph.out_edges(src).unwrap();

        // one boarding edge plus the "wait one quantum" edge
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().any(|e| e.location.is_train()));
        assert!(edges
            .iter()
            .any(|e| e.location == Location::Station(a) && e.time == 5.0));
    }

    #[test]
    fn train_out_edges_include_alight_and_continue() {
        let (tn, a, z) = linear_network();
        let mut schedule = Schedule::new("s");
        let route_id = schedule.add_route(|id| TrainRoute::new(id, vec![a, z], vec![0.0], 2.0, 0.5));

        let graph = ScheduleGraph::new(&tn, &schedule, 5.0);
        let train_id = crate::ids::TrainID::new(route_id, 0);
        let src = VertexDescriptor::new(a, 0.0, Location::Train(train_id));
        let edges = graph.out_edges(src).unwrap();

        assert_eq!(edges.len(), 2);
        assert!(edges
            .iter()
            .any(|e| e.location == Location::Station(a) && e.time == 1.0));
        assert!(edges.iter().any(|e| e.vertex == z && e.location.is_train()));
    }
}
