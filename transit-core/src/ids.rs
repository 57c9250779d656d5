//! Lightweight newtype identifiers threaded through the rest of the crate.
//!
//! `StationID` wraps a [`petgraph`] node index directly (stations *are*
//! vertices of the [`crate::network::TrackNetwork`] graph); the others are
//! plain integer wrappers so they can't be confused with each other at
//! call sites.

use petgraph::graph::NodeIndex;

/// A station, identified by its position in the [`crate::network::TrackNetwork`] graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationID(pub(crate) NodeIndex);

impl StationID {
    pub(crate) fn new(index: NodeIndex) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> NodeIndex {
        self.0
    }
}

/// A synthesized, repeating train route within a [`crate::schedule::Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteID(pub(crate) usize);

impl RouteID {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }
}

/// A single materialized instance of a [`RouteID`]'s route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrainID {
    pub(crate) route: RouteID,
    pub(crate) train_index: u64,
}

impl TrainID {
    pub(crate) fn new(route: RouteID, train_index: u64) -> Self {
        Self { route, train_index }
    }

    pub fn route_id(self) -> RouteID {
        self.route
    }

    pub fn train_index(self) -> u64 {
        self.train_index
    }
}

/// A passenger, unique for the lifetime of a schedule/simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassengerID(pub(crate) u64);

impl PassengerID {
    pub(crate) fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Hands out fresh, monotonically increasing [`PassengerID`]s.
#[derive(Debug, Default)]
pub struct PassengerIDGenerator {
    next: u64,
}

impl PassengerIDGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> PassengerID {
        let id = PassengerID::new(self.next);
        self.next += 1;
        id
    }
}
