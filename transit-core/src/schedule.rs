//! A named, indexed set of [`TrainRoute`]s.

use hashbrown::HashMap;

use crate::ids::RouteID;
use crate::route::TrainRoute;

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    name: String,
    routes: Vec<TrainRoute>,
    by_id: HashMap<RouteID, usize>,
}

impl Schedule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a route, assigning it the next available [`RouteID`].
    pub fn add_route(
        &mut self,
        make_route: impl FnOnce(RouteID) -> TrainRoute,
    ) -> RouteID {
        let id = RouteID::new(self.routes.len());
        let route = make_route(id);
        debug_assert_eq!(route.id(), id, "route must be constructed with the id it was assigned");
        self.by_id.insert(id, self.routes.len());
        self.routes.push(route);
        id
    }

    pub fn route(&self, id: RouteID) -> Option<&TrainRoute> {
        self.by_id.get(&id).map(|&i| &self.routes[i])
    }

    pub fn routes(&self) -> &[TrainRoute] {
        &self.routes
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::StationID;
    use petgraph::graph::NodeIndex;

    #[test]
    fn add_route_assigns_sequential_ids() {
        let mut sch = Schedule::new("demo");
        let path = vec![StationID::new(NodeIndex::new(0)), StationID::new(NodeIndex::new(1))];
        let id0 = sch.add_route(|id| TrainRoute::new(id, path.clone(), vec![0.0], 2.0, 0.5));
        let id1 = sch.add_route(|id| TrainRoute::new(id, path.clone(), vec![0.0], 2.0, 0.5));
        assert_ne!(id0, id1);
        assert_eq!(sch.route_count(), 2);
        assert!(sch.route(id0).is_some());
    }
}
