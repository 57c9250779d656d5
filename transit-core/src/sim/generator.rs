//! Deterministic periodic passenger injection.
//!
//! Grounded on `util/passenger_generator.c++`: `nextPassengerAfter(t)`
//! returns the smallest multiple of the firing period that is *strictly
//! greater* than `t`, not merely greater-or-equal — so a generator never
//! fires twice at the same instant when chained across simulation steps.

use crate::ids::{PassengerIDGenerator, StationID};
use crate::passenger::Passenger;

/// The statistical description of one passenger stream: everyone leaving
/// `entry` bound for `exit`, one every `period` time units.
#[derive(Debug, Clone)]
pub struct PassengerSpec {
    pub entry: StationID,
    pub exit: StationID,
    pub name_prefix: String,
    pub period: f64,
}

impl PassengerSpec {
    pub fn new(entry: StationID, exit: StationID, name_prefix: impl Into<String>, period: f64) -> Self {
        Self {
            entry,
            exit,
            name_prefix: name_prefix.into(),
            period,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PassengerGenerator {
    spec: PassengerSpec,
}

impl PassengerGenerator {
    pub fn new(spec: PassengerSpec) -> Self {
        Self { spec }
    }

    pub fn entry(&self) -> StationID {
        self.spec.entry
    }

    pub fn exit(&self) -> StationID {
        self.spec.exit
    }

    /// The next firing time strictly after `t`.
    pub fn next_after(&self, t: f64) -> f64 {
        let period = self.spec.period;
        let candidate = period * (t / period).ceil();
        if candidate > t {
            candidate
        } else {
            t + period
        }
    }

    /// Every passenger that leaves in `[t0, t1)`, each assigned a fresh id.
    pub fn leaving_during_interval(
        &self,
        t0: f64,
        t1: f64,
        ids: &mut PassengerIDGenerator,
    ) -> Vec<Passenger> {
        let mut out = Vec::new();
        let mut t = t0;
        loop {
            let fire_time = self.next_after(t);
            if fire_time >= t1 {
                break;
            }
            let id = ids.next_id();
            out.push(Passenger::new(
                id,
                format!("{}-{}", self.spec.name_prefix, id.raw()),
                self.spec.entry,
                self.spec.exit,
                fire_time,
            ));
            t = fire_time;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;

    fn station(i: u32) -> StationID {
        StationID::new(NodeIndex::new(i as usize))
    }

    #[test]
    fn next_after_is_strictly_greater() {
        let gen = PassengerGenerator::new(PassengerSpec::new(station(0), station(1), "p", 5.0));
        assert_eq!(gen.next_after(0.0), 5.0);
        assert_eq!(gen.next_after(5.0), 10.0);
        assert_eq!(gen.next_after(3.0), 5.0);
    }

    #[test]
    fn leaving_during_interval_yields_one_per_period() {
        let gen = PassengerGenerator::new(PassengerSpec::new(station(0), station(1), "p", 5.0));
        let mut ids = PassengerIDGenerator::new();
        let passengers = gen.leaving_during_interval(0.0, 21.0, &mut ids);
        let times: Vec<f64> = passengers.iter().map(|p| p.start_time).collect();
        assert_eq!(times, vec![5.0, 10.0, 15.0, 20.0]);
    }
}
