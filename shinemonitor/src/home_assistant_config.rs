use serde::Serialize;

/// `DeviceConfig` groups the entities of one plant in Home Assistant's
/// MQTT discovery protocol.
///
#[derive(Serialize, Clone)]
pub struct DeviceConfig {
    name: String,
    model: String,
    identifiers: Vec<String>,
    manufacturer: String,
    sw_version: String, // Version of the application that supplies the discovered MQTT item.
}

impl DeviceConfig {
    pub fn new(name: String, model: String, identifiers: Vec<String>) -> Self {
        Self {
            name,
            model,
            identifiers,
            manufacturer: "ShineMonitor".to_string(),
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `SensorConfig` describes one Home Assistant sensor entity in the MQTT
/// discovery protocol.
///
/// More information about the MQTT discovery protocol can be found here:
/// https://www.home-assistant.io/docs/mqtt/discovery/
///
#[derive(Serialize)]
pub struct SensorConfig {
    pub unique_id: String,  // A globally unique identifier for the sensor.
    name: String,           // The name of the sensor.
    state_topic: String,    // The MQTT topic where sensor readings will be published.
    value_template: String, // Extracts this sensor's value from the state message.
    device: DeviceConfig,
    json_attributes_topic: String, // Where the full report is published.
    json_attributes_template: String, // Picks this sensor's report from the attributes message.
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<String>,
}

impl SensorConfig {
    pub fn report(
        state_topic: &str,
        attributes_topic: &str,
        device_config: &DeviceConfig,
        name: &str,
        key: &str,
        unit_of_measurement: &str,
    ) -> Self {
        let value_template = format!("{{{{ value_json.{} }}}}", key);
        let json_attributes_template = format!("{{{{ value_json.{} | tojson }}}}", key);
        let unique_id = format!("{}_{}", device_config.identifiers[0], key);
        SensorConfig {
            unique_id,
            name: name.to_string(),
            state_topic: state_topic.to_string(),
            value_template,
            json_attributes_topic: attributes_topic.to_string(),
            json_attributes_template,
            device: device_config.clone(),
            unit_of_measurement: (!unit_of_measurement.is_empty())
                .then(|| unit_of_measurement.to_string()),
        }
    }
}
