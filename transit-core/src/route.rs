//! Repeating train routes and the trains materialized from them.
//!
//! Grounded on `algo/train_route.c++`'s `TrainRoute`/`Train` pair: a route
//! is an immutable path plus a set of start offsets repeating every
//! `repeat_time`; a train is one instance of that route, identified by an
//! index rather than carried around as its own object.

use crate::ids::{RouteID, StationID, TrainID};
use crate::network::TrackNetwork;
use crate::Error;

/// An immutable, repeating route: a path through the network, a set of
/// start offsets within one period, and a period length.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainRoute {
    id: RouteID,
    path: Vec<StationID>,
    start_offsets: Vec<f64>,
    repeat_time: f64,
    speed: f64,
}

impl TrainRoute {
    /// `start_offsets` must be sorted ascending and all less than `repeat_time`;
    /// `path` must have at least two stations.
    pub fn new(
        id: RouteID,
        path: Vec<StationID>,
        mut start_offsets: Vec<f64>,
        repeat_time: f64,
        speed: f64,
    ) -> Self {
        debug_assert!(path.len() >= 2, "a route needs at least two stations");
        debug_assert!(speed > 0.0, "speed must be positive");
        start_offsets.sort_by(|a, b| a.partial_cmp(b).unwrap());
        debug_assert!(
            start_offsets.iter().all(|&o| o < repeat_time),
            "start offsets must fall within one period"
        );
        Self {
            id,
            path,
            start_offsets,
            repeat_time,
            speed,
        }
    }

    pub fn id(&self) -> RouteID {
        self.id
    }

    pub fn path(&self) -> &[StationID] {
        &self.path
    }

    pub fn start_offsets(&self) -> &[f64] {
        &self.start_offsets
    }

    pub fn repeat_time(&self) -> f64 {
        self.repeat_time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Total expected travel time over the whole route, at this route's speed.
    pub fn avg_route_length_in_time(&self, network: &TrackNetwork) -> Result<f64, Error> {
        self.expected_travel_time_over(network, 0, self.path.len() - 1)
    }

    /// Sum of `edge_weight / speed` over `path[from_idx..=to_idx]`.
    fn expected_travel_time_over(
        &self,
        network: &TrackNetwork,
        from_idx: usize,
        to_idx: usize,
    ) -> Result<f64, Error> {
        let mut total = 0.0;
        for window in self.path[from_idx..=to_idx].windows(2) {
            let weight = network
                .edge_weight(window[0], window[1])
                .ok_or(Error::InvalidRouteQuery(window[0]))?;
            total += weight / self.speed;
        }
        Ok(total)
    }

    /// Expected travel time between the first occurrence of `from` and the
    /// first occurrence of `to` at or after it. Fails if either endpoint is
    /// not on the route.
    pub fn expected_travel_time(
        &self,
        network: &TrackNetwork,
        from: StationID,
        to: StationID,
    ) -> Result<f64, Error> {
        let from_idx = self
            .path
            .iter()
            .position(|&s| s == from)
            .ok_or(Error::InvalidRouteQuery(from))?;
        let to_idx = self.path[from_idx..]
            .iter()
            .position(|&s| s == to)
            .map(|i| i + from_idx)
            .ok_or(Error::InvalidRouteQuery(to))?;
        self.expected_travel_time_over(network, from_idx, to_idx)
    }

    /// `departure_time(index) = repeat_time * (index div k) + offsets[index mod k]`.
    pub fn departure_time(&self, index: u64) -> f64 {
        let k = self.start_offsets.len() as u64;
        let day = index / k;
        let offset = self.start_offsets[(index % k) as usize];
        self.repeat_time * (day as f64) + offset
    }

    pub fn make_train_from_index(&self, index: u64) -> Train {
        Train {
            id: TrainID::new(self.id, index),
            departure_time: self.departure_time(index),
        }
    }

    /// The `skip`-th (0-indexed) occurrence of `station` in `path`, if any.
    fn nth_occurrence(&self, station: StationID, skip: usize) -> Option<usize> {
        self.path
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == station)
            .nth(skip)
            .map(|(i, _)| i)
    }

    /// Smallest global train index `i` such that `departure_time(i) >= target`.
    fn first_index_departing_at_or_after(&self, target: f64) -> u64 {
        let k = self.start_offsets.len() as u64;
        if target <= 0.0 {
            return 0;
        }
        let day = (target / self.repeat_time).floor();
        let time_in_day = target - day * self.repeat_time;
        let pos = self.start_offsets.partition_point(|&o| o < time_in_day) as u64;
        if pos == k {
            ((day as i64 + 1).max(0) as u64) * k
        } else {
            (day.max(0.0) as u64) * k + pos
        }
    }

    /// Trains whose arrival at the `skip`-th occurrence of `station` falls
    /// in `[t0, t1)`. Returns an empty vector if `station` doesn't occur
    /// that many times on this route.
    pub fn trains_at_vertex_in_interval(
        &self,
        network: &TrackNetwork,
        station: StationID,
        interval: (f64, f64),
        skip: usize,
    ) -> Result<Vec<(Train, f64)>, Error> {
        let (t0, t1) = interval;
        if t1 < t0 {
            return Err(Error::BackwardInterval(t0, t1));
        }
        let Some(vertex_pos) = self.nth_occurrence(station, skip) else {
            return Ok(Vec::new());
        };
        let tau = self.expected_travel_time_over(network, 0, vertex_pos)?;

        let lo = self.first_index_departing_at_or_after(t0 - tau);
        let hi = self.first_index_departing_at_or_after(t1 - tau);

        Ok((lo..hi)
            .map(|index| {
                let train = self.make_train_from_index(index);
                (train, self.departure_time(index) + tau)
            })
            .collect())
    }
}

/// One materialized instance of a [`TrainRoute`], with a concrete
/// departure time from the start of its path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Train {
    pub id: TrainID,
    pub departure_time: f64,
}

impl Train {
    /// The next stop this train reaches strictly after time `t`, and its
    /// expected arrival time there. `None` if `t` is at or past the route's end.
    pub fn next_stop_after_time(
        &self,
        route: &TrainRoute,
        network: &TrackNetwork,
        t: f64,
    ) -> Result<Option<(StationID, f64)>, Error> {
        let mut arrival = self.departure_time;
        for window in route.path().windows(2) {
            let weight = network
                .edge_weight(window[0], window[1])
                .ok_or(Error::InvalidRouteQuery(window[0]))?;
            arrival += weight / route.speed();
            if arrival > t {
                return Ok(Some((window[1], arrival)));
            }
        }
        Ok(None)
    }

    /// Expected arrival time at `path[index]`, counting from this train's departure.
    pub fn expected_arrival_at(
        &self,
        route: &TrainRoute,
        network: &TrackNetwork,
        index: usize,
    ) -> Result<f64, Error> {
        let mut arrival = self.departure_time;
        for window in route.path()[..=index].windows(2) {
            let weight = network
                .edge_weight(window[0], window[1])
                .ok_or(Error::InvalidRouteQuery(window[0]))?;
            arrival += weight / route.speed();
        }
        Ok(arrival)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn linear_network(n: usize, weight: f64) -> (TrackNetwork, Vec<StationID>) {
        let mut tn = TrackNetwork::new();
        let stations: Vec<StationID> = (0..n)
            .map(|i| tn.create_vertex(format!("S{i}"), i as f64, 0.0).unwrap())
            .collect();
        for w in stations.windows(2) {
            tn.add_edge(w[0], w[1], weight);
        }
        (tn, stations)
    }

    #[test]
    fn departure_time_round_trips_make_train_from_index() {
        let (_tn, stations) = linear_network(2, 1.0);
        let route = TrainRoute::new(RouteID::new(0), stations, vec![0.0, 3.0], 10.0, 0.5);
        for index in 0..8u64 {
            let train = route.make_train_from_index(index);
            assert_eq!(train.departure_time, route.departure_time(index));
        }
        assert_eq!(route.departure_time(0), 0.0);
        assert_eq!(route.departure_time(1), 3.0);
        assert_eq!(route.departure_time(2), 10.0);
        assert_eq!(route.departure_time(3), 13.0);
    }

    #[test]
    fn single_edge_travel_time() {
        let (tn, stations) = linear_network(2, 1.0);
        let route = TrainRoute::new(RouteID::new(0), stations.clone(), vec![0.0], 2.0, 0.5);
        let t = route
            .expected_travel_time(&tn, stations[0], stations[1])
            .unwrap();
        assert_abs_diff_eq!(t, 2.0);
    }

    #[test]
    fn empty_interval_query_returns_nothing() {
        let (tn, stations) = linear_network(2, 1.0);
        let route = TrainRoute::new(RouteID::new(0), stations.clone(), vec![0.0], 2.0, 0.5);
        let trains = route
            .trains_at_vertex_in_interval(&tn, stations[0], (5.0, 5.0), 0)
            .unwrap();
        assert!(trains.is_empty());
    }

    #[test]
    fn station_revisit_skip_distinguishes_occurrences() {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let b = tn.create_vertex("B", 1.0, 0.0).unwrap();
        let c = tn.create_vertex("C", 2.0, 0.0).unwrap();
        tn.add_edge(a, b, 1.0);
        tn.add_edge(b, a, 1.0);
        tn.add_edge(a, c, 1.0);
        let route = TrainRoute::new(RouteID::new(0), vec![a, b, a, c], vec![0.0], 10.0, 0.5);

        let first_visit = route
            .trains_at_vertex_in_interval(&tn, a, (0.0, 10.0), 0)
            .unwrap();
        assert_eq!(first_visit.len(), 1);

        let second_visit = route
            .trains_at_vertex_in_interval(&tn, a, (0.0, 10.0), 1)
            .unwrap();
        assert_eq!(second_visit.len(), 1);

        let third_visit = route
            .trains_at_vertex_in_interval(&tn, a, (0.0, 10.0), 2)
            .unwrap();
        assert!(third_visit.is_empty());
    }

    #[test]
    fn backward_interval_is_rejected() {
        let (tn, stations) = linear_network(2, 1.0);
        let route = TrainRoute::new(RouteID::new(0), stations.clone(), vec![0.0], 2.0, 0.5);
        let err = route
            .trains_at_vertex_in_interval(&tn, stations[0], (5.0, 1.0), 0)
            .unwrap_err();
        assert!(matches!(err, Error::BackwardInterval(5.0, 1.0)));
    }
}
