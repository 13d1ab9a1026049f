use crate::poller::Sensor;

/// An output channel the readings of a poll cycle are pushed to.
pub trait MetricCollector {
    fn publish(&mut self, sensor: &dyn Sensor);
}
