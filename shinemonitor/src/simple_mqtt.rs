use crate::{
    metric_collector::MetricCollector,
    mqtt_config::MqttConfig,
    mqtt_wrapper::{MqttWrapper, QoS},
    poller::Sensor,
};

use chrono::Local;
use log::{debug, warn};

pub struct SimpleMqtt<MQTT: MqttWrapper> {
    client: MQTT,
}

impl<MQTT: MqttWrapper> SimpleMqtt<MQTT> {
    pub fn new(config: &MqttConfig) -> Self {
        let client = MQTT::new(config, "-sm");
        Self { client }
    }

    pub fn client(&self) -> &MQTT {
        &self.client
    }
}

impl<MQTT: MqttWrapper> MetricCollector for SimpleMqtt<MQTT> {
    fn publish(&mut self, sensor: &dyn Sensor) {
        let base_topic = format!("shinemonitor/{}", sensor.plant_id());
        debug!("publishing {} reports below {base_topic}", sensor.snapshot().len());

        let mut topic_payload_pairs = vec![
            (format!("{base_topic}/name"), sensor.name().to_string()),
            (format!("{base_topic}/unit"), sensor.unit().to_string()),
            (
                format!("{base_topic}/last_update"),
                Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        ];
        topic_payload_pairs.extend(
            sensor
                .snapshot()
                .iter()
                .map(|(query, value)| (format!("{base_topic}/{query}"), value.to_string())),
        );

        topic_payload_pairs
            .into_iter()
            .for_each(|(topic, payload)| {
                if let Err(e) = self.client.publish(topic, QoS::AtMostOnce, true, payload) {
                    warn!("mqtt error: {e:?}")
                }
            });
    }
}
