use crate::home_assistant_config::{DeviceConfig, SensorConfig};
use crate::metric_collector::MetricCollector;
use crate::mqtt_config::MqttConfig;
use crate::mqtt_wrapper::{MqttWrapper, QoS};
use crate::poller::Sensor;
use crate::query::Query;

use log::{debug, error};
use serde_json::{Map, Value};

pub struct HomeAssistant<MQTT: MqttWrapper> {
    client: MQTT,
}

impl<MQTT: MqttWrapper> HomeAssistant<MQTT> {
    pub fn new(config: &MqttConfig) -> Self {
        let client = MQTT::new(config, "-ha");
        Self { client }
    }

    pub fn client(&self) -> &MQTT {
        &self.client
    }

    fn publish_json(&mut self, topic: &str, payload: serde_json::Value) {
        debug!("Publishing to {topic} with payload {payload}");

        let payload = payload.to_string();
        if let Err(e) = self.client.publish(topic, QoS::AtMostOnce, true, payload) {
            error!("Failed to publish message: {e:?}");
        }
    }

    fn publish_configs(&mut self, config_topic: &str, sensor_configs: &[SensorConfig]) {
        // configs let home assistant know what sensors are available and where to find them
        for sensor_config in sensor_configs {
            let config_topic = format!("{}/{}/config", config_topic, sensor_config.unique_id);
            match serde_json::to_value(sensor_config) {
                Ok(config_payload) => self.publish_json(&config_topic, config_payload),
                Err(e) => error!("Failed to serialize sensor config: {e}"),
            }
        }
    }

    fn publish_states(
        &mut self,
        sensor: &dyn Sensor,
        state_topic: &str,
        attributes_topic: &str,
    ) {
        // scalar states for the entities, the full reports as their attributes
        let mut states = Map::new();
        let mut attributes = Map::new();
        for (query, value) in sensor.snapshot().iter() {
            states.insert(query.action().to_owned(), state_of(value));
            attributes.insert(query.action().to_owned(), attributes_of(value));
        }
        self.publish_json(state_topic, Value::Object(states));
        self.publish_json(attributes_topic, Value::Object(attributes));
    }
}

impl<MQTT: MqttWrapper> MetricCollector for HomeAssistant<MQTT> {
    fn publish(&mut self, sensor: &dyn Sensor) {
        let config_topic = format!("homeassistant/sensor/shinemonitor_{}", sensor.plant_id());
        let state_topic = format!("solar/shinemonitor_{}/state", sensor.plant_id());
        let attributes_topic = format!("solar/shinemonitor_{}/attributes", sensor.plant_id());

        let sensor_configs = create_sensor_configs(sensor, &state_topic, &attributes_topic);

        self.publish_configs(&config_topic, &sensor_configs);
        self.publish_states(sensor, &state_topic, &attributes_topic);
    }
}

/// Home Assistant only accepts numbers for entities with a unit. Anything
/// else becomes `null`, which it shows as unknown.
fn state_of(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number),
        _ => Value::Null,
    }
}

// attributes must be a JSON object
fn attributes_of(value: &Value) -> Value {
    match value {
        Value::Object(_) => value.clone(),
        _ => {
            let mut wrapped = Map::new();
            wrapped.insert("value".to_owned(), value.clone());
            Value::Object(wrapped)
        }
    }
}

fn create_sensor_configs(
    sensor: &dyn Sensor,
    state_topic: &str,
    attributes_topic: &str,
) -> Vec<SensorConfig> {
    let device_config = DeviceConfig::new(
        format!("{} {}", sensor.name(), sensor.plant_id()),
        "ShineMonitor Plant".to_string(),
        Vec::from([format!("shinemonitor_{}", sensor.plant_id())]),
    );

    // One entity per report, all sharing the sensor's unit
    Query::ALL
        .iter()
        .map(|query| {
            SensorConfig::report(
                state_topic,
                attributes_topic,
                &device_config,
                query.label(),
                query.action(),
                sensor.unit(),
            )
        })
        .collect()
}
