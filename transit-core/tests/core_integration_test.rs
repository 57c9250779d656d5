//! End-to-end coverage across the full pipeline: build a network, synthesize
//! a schedule, route and simulate passengers through it.

use transit_core::algo::router::{PassengerRouter, RouterConfig};
use transit_core::algo::scheduler::{Scheduler, SchedulerConfig, Strategy};
use transit_core::ids::PassengerIDGenerator;
use transit_core::network::TrackNetwork;
use transit_core::passenger::{Passenger, PassengerList};
use transit_core::sim::{SimConfig, Simulator};

#[test]
fn single_edge_passenger_rides_start_to_finish() {
    let mut network = TrackNetwork::new();
    let a = network.create_vertex("A", 0.0, 0.0).unwrap();
    let z = network.create_vertex("Z", 1.0, 0.0).unwrap();
    network.add_edge(a, z, 1.0);

    let mut ids = PassengerIDGenerator::new();
    let passengers: PassengerList = vec![Passenger::new(ids.next_id(), "rider", a, z, 0.0)]
        .into_iter()
        .collect();

    let scheduler = Scheduler::new(SchedulerConfig::default());
    let schedule = scheduler.schedule(&network, &passengers).unwrap();
    assert_eq!(schedule.route_count(), 1);

    let mut sim = Simulator::new(&network, &schedule, SimConfig::default());
    for p in passengers.iter() {
        sim.inject_passenger(p.clone()).unwrap();
    }
    sim.run_for_time(10.0, 1.0).unwrap();

    let rider = passengers.iter().next().unwrap();
    let exit = sim.passenger_exit(rider.id).expect("rider should have reached Z");
    assert_eq!(exit.exit_time, 2.0);
}

#[test]
fn y_graph_coalesces_and_delivers_every_passenger() {
    let mut network = TrackNetwork::new();
    let a = network.create_vertex("A", 0.0, 0.0).unwrap();
    let b = network.create_vertex("B", 1.0, 1.0).unwrap();
    let c = network.create_vertex("C", 1.0, -1.0).unwrap();
    let d = network.create_vertex("D", 2.0, 0.0).unwrap();
    let z = network.create_vertex("Z", 3.0, 0.0).unwrap();
    network.add_edge(a, b, 1.0);
    network.add_edge(a, c, 2.0);
    network.add_edge(a, d, 2.0);
    network.add_edge(b, z, 2.0);
    network.add_edge(c, z, 2.0);
    network.add_edge(d, z, 1.0);

    let mut ids = PassengerIDGenerator::new();
    let passengers: PassengerList = (0..3)
        .map(|i| Passenger::new(ids.next_id(), format!("rider-{i}"), a, z, 0.0))
        .collect();

    let scheduler = Scheduler::new(SchedulerConfig {
        strategy: Strategy::ShortestPathCoalescing,
        ..SchedulerConfig::default()
    });
    let schedule = scheduler.schedule(&network, &passengers).unwrap();
    assert!(schedule.route_count() <= 2, "expected coalescing to cut route count, got {}", schedule.route_count());

    let mut sim = Simulator::new(&network, &schedule, SimConfig::default());
    for p in passengers.iter() {
        sim.inject_passenger(p.clone()).unwrap();
    }
    sim.run_for_time(20.0, 2.0).unwrap();

    for p in passengers.iter() {
        let exit = sim.passenger_exit(p.id).unwrap_or_else(|| panic!("{} never exited", p.name));
        assert!(exit.exit_time <= 20.0);
    }
}

#[test]
fn passenger_with_unreachable_destination_never_exits_but_never_errors() {
    let mut network = TrackNetwork::new();
    let a = network.create_vertex("A", 0.0, 0.0).unwrap();
    let isolated = network.create_vertex("Island", 9.0, 9.0).unwrap();

    let mut ids = PassengerIDGenerator::new();
    let stranded = Passenger::new(ids.next_id(), "stranded", a, isolated, 0.0);

    let schedule = Scheduler::new(SchedulerConfig::default())
        .schedule(&network, &PassengerList::new())
        .unwrap();

    let mut sim = Simulator::new(&network, &schedule, SimConfig::default());
    sim.inject_passenger(stranded.clone()).unwrap();
    sim.run_for_time(50.0, 5.0).unwrap();

    assert!(sim.passenger_exit(stranded.id).is_none());
}

#[test]
fn tight_horizon_yields_empty_journey_without_error() {
    let mut network = TrackNetwork::new();
    let a = network.create_vertex("A", 0.0, 0.0).unwrap();
    let z = network.create_vertex("Z", 1.0, 0.0).unwrap();
    network.add_edge(a, z, 1000.0);

    let mut ids = PassengerIDGenerator::new();
    let passengers: PassengerList = vec![Passenger::new(ids.next_id(), "rider", a, z, 0.0)]
        .into_iter()
        .collect();

    let schedule = Scheduler::new(SchedulerConfig::default())
        .schedule(&network, &passengers)
        .unwrap();

    let router = PassengerRouter::new(RouterConfig { quantum: 5.0, horizon: 1.0 });
    let journey = router.route(&network, &schedule, 0.0, a, z).unwrap();
    assert!(journey.is_empty());
}
