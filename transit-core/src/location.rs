//! A passenger's position is always one of a station or a train; a journey
//! is a validated sequence of `(Location, time)` steps between the two.

use crate::ids::{StationID, TrainID};

/// Where something is: waiting at a station, or aboard a specific train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Station(StationID),
    Train(TrainID),
}

impl Location {
    pub fn is_station(self) -> bool {
        matches!(self, Location::Station(_))
    }

    pub fn is_train(self) -> bool {
        matches!(self, Location::Train(_))
    }

    pub fn as_station(self) -> Option<StationID> {
        match self {
            Location::Station(s) => Some(s),
            Location::Train(_) => None,
        }
    }

    pub fn as_train(self) -> Option<TrainID> {
        match self {
            Location::Train(t) => Some(t),
            Location::Station(_) => None,
        }
    }
}

/// One step of a journey: a location and the time the passenger is there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteElement {
    pub location: Location,
    pub time: f64,
}

impl RouteElement {
    pub fn new(location: Location, time: f64) -> Self {
        Self { location, time }
    }
}

/// A passenger's planned sequence of steps from entry station to exit
/// station: alternating Station/Train/Station/…, with non-decreasing times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journey {
    steps: Vec<RouteElement>,
}

impl Journey {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<RouteElement>) -> Self {
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[RouteElement] {
        &self.steps
    }

    pub fn first(&self) -> Option<&RouteElement> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&RouteElement> {
        self.steps.last()
    }

    /// The step immediately after the one at `location`, if `location`
    /// appears in this journey.
    pub fn next_after(&self, location: Location) -> Option<&RouteElement> {
        let pos = self.steps.iter().position(|s| s.location == location)?;
        self.steps.get(pos + 1)
    }

    /// Checks the adjacency invariant used by the simulator's move
    /// predicate: is there a `(from, to)` adjacent pair in this journey?
    pub fn permits_move(&self, from: Location, to: Location) -> bool {
        self.steps
            .windows(2)
            .any(|w| w[0].location == from && w[1].location == to)
    }

    /// Validates the invariants from the testable-properties section:
    /// non-empty, times non-decreasing, adjacent locations differ and
    /// alternate kind, first/last are stations.
    pub fn is_valid(&self) -> bool {
        if self.steps.is_empty() {
            return false;
        }
        if !self.steps[0].location.is_station() || !self.steps.last().unwrap().location.is_station() {
            return false;
        }
        self.steps.windows(2).all(|w| {
            w[0].time <= w[1].time
                && w[0].location != w[1].location
                && w[0].location.is_station() != w[1].location.is_station()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RouteID;

    fn station(i: u32) -> Location {
        Location::Station(StationID::new(petgraph::graph::NodeIndex::new(i as usize)))
    }

    fn train(i: u64) -> Location {
        Location::Train(TrainID::new(RouteID::new(0), i))
    }

    #[test]
    fn empty_journey_is_invalid() {
        assert!(!Journey::empty().is_valid());
    }

    #[test]
    fn alternating_journey_is_valid() {
        let j = Journey::from_steps(vec![
            RouteElement::new(station(0), 0.0),
            RouteElement::new(train(0), 0.0),
            RouteElement::new(station(1), 2.0),
        ]);
        assert!(j.is_valid());
        assert!(j.permits_move(station(0), train(0)));
        assert!(j.permits_move(train(0), station(1)));
        assert!(!j.permits_move(station(0), station(1)));
    }

    #[test]
    fn two_adjacent_stations_is_invalid() {
        let j = Journey::from_steps(vec![
            RouteElement::new(station(0), 0.0),
            RouteElement::new(station(1), 1.0),
        ]);
        assert!(!j.is_valid());
    }
}
