//! The static track network: a directed, weighted graph of stations.
//!
//! Mirrors the `util/track_network` component of the original design —
//! `createVertex` returning a sentinel on a duplicate name, lookups
//! returning `None` on an unknown id — but expressed as `Option`/`Result`
//! instead of sentinel values.

use std::ops::{Deref, DerefMut};

use hashbrown::HashMap;
use petgraph::graph::{DiGraph, EdgeIndex};
use petgraph::visit::EdgeRef;

use crate::ids::StationID;
use crate::Error;

/// A station vertex: a name and a 2-D position.
#[derive(Debug, Clone, PartialEq)]
pub struct StationNode {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// A directed edge between two stations, carrying a positive travel distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackEdge {
    pub weight: f64,
}

/// The track network: a directed weighted graph of named stations.
///
/// Deref's to the underlying [`DiGraph`] so callers can use `petgraph`'s
/// traversal and query APIs directly.
#[derive(Debug, Clone, Default)]
pub struct TrackNetwork {
    graph: DiGraph<StationNode, TrackEdge>,
    name_to_id: HashMap<String, StationID>,
}

impl Deref for TrackNetwork {
    type Target = DiGraph<StationNode, TrackEdge>;

    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}

impl DerefMut for TrackNetwork {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.graph
    }
}

impl TrackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new station vertex. Returns `Err` if the name is already taken.
    pub fn create_vertex(&mut self, name: impl Into<String>, x: f64, y: f64) -> Result<StationID, Error> {
        let name = name.into();
        if self.name_to_id.contains_key(&name) {
            return Err(Error::DuplicateStationName(name));
        }
        let id = StationID::new(self.graph.add_node(StationNode {
            name: name.clone(),
            x,
            y,
        }));
        self.name_to_id.insert(name, id);
        Ok(id)
    }

    /// Adds a directed, weighted edge between two existing stations.
    pub fn add_edge(&mut self, from: StationID, to: StationID, weight: f64) -> EdgeIndex {
        self.graph.add_edge(from.index(), to.index(), TrackEdge { weight })
    }

    /// Looks up a station by its name.
    pub fn vertex_by_name(&self, name: &str) -> Option<StationID> {
        self.name_to_id.get(name).copied()
    }

    pub fn vertex_name(&self, id: StationID) -> Option<&str> {
        self.graph.node_weight(id.index()).map(|n| n.name.as_str())
    }

    pub fn vertex_position(&self, id: StationID) -> Option<(f64, f64)> {
        self.graph.node_weight(id.index()).map(|n| (n.x, n.y))
    }

    /// Weight of the edge directly connecting `from` to `to`, if one exists.
    pub fn edge_weight(&self, from: StationID, to: StationID) -> Option<f64> {
        self.graph
            .edges(from.index())
            .find(|e| e.target() == to.index())
            .map(|e| e.weight().weight)
    }

    pub fn station_ids(&self) -> impl Iterator<Item = StationID> + '_ {
        self.graph.node_indices().map(StationID::new)
    }

    pub fn station_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_is_rejected() {
        let mut tn = TrackNetwork::new();
        tn.create_vertex("A", 0.0, 0.0).unwrap();
        let err = tn.create_vertex("A", 1.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::DuplicateStationName(name) if name == "A"));
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let tn = TrackNetwork::new();
        assert_eq!(tn.vertex_by_name("nowhere"), None);
    }

    #[test]
    fn edge_weight_round_trips() {
        let mut tn = TrackNetwork::new();
        let a = tn.create_vertex("A", 0.0, 0.0).unwrap();
        let z = tn.create_vertex("Z", 1.0, 0.0).unwrap();
        tn.add_edge(a, z, 4.5);
        assert_eq!(tn.edge_weight(a, z), Some(4.5));
        assert_eq!(tn.edge_weight(z, a), None);
    }
}
