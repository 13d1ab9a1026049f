// externally visible interfaces
pub mod client;
pub mod clock;
pub mod credentials;
pub mod error;
pub mod home_assistant;
pub mod metric_collector;
pub mod mqtt_config;
pub mod mqtt_wrapper;
pub mod poller;
pub mod query;
pub mod simple_mqtt;

// internal interfaces
mod home_assistant_config;
mod signing;
