use crate::mqtt_config::MqttConfig;

#[derive(Clone, Copy, Debug)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

pub trait MqttWrapper {
    // Decouples the publishers in this crate from a concrete MQTT client.
    // The binary wraps its client in a newtype implementing this trait,
    // tests use a recording fake.

    fn publish<S, V>(&mut self, topic: S, qos: QoS, retain: bool, payload: V) -> anyhow::Result<()>
    where
        S: Clone + Into<String>,
        V: Clone + Into<Vec<u8>>;

    fn new(config: &MqttConfig, suffix: &str) -> Self;
}
