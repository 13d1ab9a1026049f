use std::{env, fs, path::Path};

use log::warn;
use serde_derive::Deserialize;
use shinemonitor::{credentials::Credentials, mqtt_config::MqttConfig};

pub static UPDATE_INTERVAL_DEFAULT: u64 = 300_000;
pub static UPDATE_INTERVAL_MIN: u64 = 60_000;
pub static REQUEST_TIMEOUT_DEFAULT: u64 = 10;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shinemonitor: Credentials,
    pub base_url: Option<String>,
    pub update_interval: Option<u64>,
    pub request_timeout: Option<u64>,
    pub debug: Option<bool>,
    pub home_assistant: Option<MqttConfig>,
    pub simple_mqtt: Option<MqttConfig>,
}

impl Config {
    pub fn is_valid(&self) -> bool {
        self.shinemonitor.is_valid()
            && (self.home_assistant.as_ref().is_some_and(|x| x.is_valid())
                || self.simple_mqtt.as_ref().is_some_and(|x| x.is_valid()))
    }

    /// Poll period in milliseconds, never shorter than a minute.
    pub fn update_interval(&self) -> u64 {
        self.update_interval
            .unwrap_or(UPDATE_INTERVAL_DEFAULT)
            .max(UPDATE_INTERVAL_MIN)
    }

    pub fn request_timeout(&self) -> u64 {
        self.request_timeout.unwrap_or(REQUEST_TIMEOUT_DEFAULT)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn load() -> Config {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Config {
        // parse config from TOML file if present
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                "".into()
            }
        };
        let mut config = Self::parse(&contents);
        config.apply_env(|key| env::var(key).ok());
        config
    }

    fn parse(contents: &str) -> Config {
        match toml::from_str::<Config>(contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("toml config unparsable: {e}");
                Config::default()
            }
        }
    }

    // overwrite config with whatever the environment provides
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(username) = var("SHINEMONITOR_USERNAME") {
            self.shinemonitor.username = username;
        }
        if let Some(password) = var("SHINEMONITOR_PASSWORD") {
            self.shinemonitor.password = password;
        }
        if let Some(company_id) = var("SHINEMONITOR_COMPANY_ID") {
            self.shinemonitor.company_id = company_id;
        }
        if let Some(plant_id) = var("SHINEMONITOR_PLANT_ID") {
            self.shinemonitor.plant_id = plant_id;
        }

        let mut mqtt_config_overwritten = false;
        if let Some(host) = var("MQTT_BROKER_HOST") {
            self.home_assistant.get_or_insert_with(MqttConfig::default).host = host;
            mqtt_config_overwritten = true;
        }
        if let Some(username) = var("MQTT_USERNAME") {
            self.home_assistant
                .get_or_insert_with(MqttConfig::default)
                .username = Some(username);
            mqtt_config_overwritten = true;
        }
        if let Some(password) = var("MQTT_PASSWORD") {
            self.home_assistant
                .get_or_insert_with(MqttConfig::default)
                .password = Some(password);
            mqtt_config_overwritten = true;
        }
        if let Some(port) = var("MQTT_PORT") {
            let port = port.parse().unwrap_or_else(|e| {
                warn!("ignoring MQTT_PORT={port}: {e}");
                1883
            });
            self.home_assistant
                .get_or_insert_with(MqttConfig::default)
                .port = Some(port);
            mqtt_config_overwritten = true;
        }
        if mqtt_config_overwritten {
            self.simple_mqtt = self.home_assistant.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONFIG: &str = r#"
        update_interval = 120000

        [shinemonitor]
        username = "solar"
        password = "secret"
        company_id = "acme"
        plant_id = "1234"

        [home_assistant]
        host = "broker.local"
        port = 1883
    "#;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(CONFIG);
        assert!(config.is_valid());
        assert_eq!(config.shinemonitor.plant_id, "1234");
        assert_eq!(config.update_interval(), 120_000);
        assert_eq!(config.request_timeout(), REQUEST_TIMEOUT_DEFAULT);
        assert!(!config.debug());
        assert!(config.simple_mqtt.is_none());
    }

    #[test]
    fn update_interval_has_a_floor() {
        let config = Config {
            update_interval: Some(1_000),
            ..Config::default()
        };
        assert_eq!(config.update_interval(), UPDATE_INTERVAL_MIN);
        assert_eq!(Config::default().update_interval(), UPDATE_INTERVAL_DEFAULT);
    }

    #[test]
    fn credentials_without_output_are_invalid() {
        let config = Config::parse(
            r#"
            [shinemonitor]
            username = "solar"
            password = "secret"
            company_id = "acme"
            plant_id = "1234"
            "#,
        );
        assert!(!config.is_valid());
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let config = Config::parse("this is = = not toml");
        assert!(!config.is_valid());
        assert!(config.home_assistant.is_none());
    }

    #[test]
    fn environment_overrides_file() {
        let env = HashMap::from([
            ("SHINEMONITOR_PASSWORD", "from-env"),
            ("MQTT_BROKER_HOST", "other.local"),
            ("MQTT_PORT", "8883"),
        ]);
        let mut config = Config::parse(CONFIG);
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.shinemonitor.password, "from-env");
        assert_eq!(config.shinemonitor.username, "solar");
        let home_assistant = config.home_assistant.as_ref().unwrap();
        assert_eq!(home_assistant.host, "other.local");
        assert_eq!(home_assistant.port, Some(8883));
        assert_eq!(config.simple_mqtt.as_ref().unwrap().host, "other.local");
    }

    #[test]
    fn password_from_environment_completes_partial_file() {
        let mut config = Config::parse(
            r#"
            [shinemonitor]
            username = "solar"
            company_id = "acme"
            plant_id = "1234"

            [home_assistant]
            host = "broker.local"
            "#,
        );
        assert_eq!(config.shinemonitor.username, "solar");
        assert!(config.home_assistant.is_some());
        assert!(!config.is_valid());

        let env = HashMap::from([("SHINEMONITOR_PASSWORD", "secret")]);
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert!(config.is_valid());
        assert_eq!(config.shinemonitor.password, "secret");
        assert_eq!(config.home_assistant.as_ref().unwrap().host, "broker.local");
    }

    #[test]
    fn environment_alone_is_enough() {
        let env = HashMap::from([
            ("SHINEMONITOR_USERNAME", "solar"),
            ("SHINEMONITOR_PASSWORD", "secret"),
            ("SHINEMONITOR_COMPANY_ID", "acme"),
            ("SHINEMONITOR_PLANT_ID", "1234"),
            ("MQTT_BROKER_HOST", "broker.local"),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.is_valid());
    }
}
