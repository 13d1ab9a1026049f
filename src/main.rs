mod config;
mod logging;
mod rumqttc_wrapper;

use config::Config;
use rumqttc_wrapper::RumqttcWrapper;
use shinemonitor::client::SigningClient;
use shinemonitor::home_assistant::HomeAssistant;
use shinemonitor::metric_collector::MetricCollector;
use shinemonitor::poller::MetricPoller;
use shinemonitor::simple_mqtt::SimpleMqtt;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

fn main() {
    let config = Config::load();
    logging::init_logger(config.debug());
    info!("Running revision: {}", env!("GIT_HASH"));
    if std::env::args().len() > 1 {
        error!("Arguments passed. Tool is configured by config.toml in its path");
    }

    if !config.is_valid() {
        error!("Configuration needs ShineMonitor credentials and at least one MQTT output");
        std::process::exit(1);
    }

    info!(
        "polling plant {} as {} every {:.2}s",
        config.shinemonitor.plant_id,
        config.shinemonitor.username,
        config.update_interval() as f64 / 1000.
    );

    let client = SigningClient::new(config.shinemonitor.clone())
        .and_then(|client| client.with_timeout(Duration::from_secs(config.request_timeout())));
    let mut client = match client {
        Ok(client) => client,
        Err(e) => {
            error!("Could not set up HTTP client: {e}");
            std::process::exit(1);
        }
    };
    if let Some(base_url) = &config.base_url {
        info!("using portal endpoint {base_url}");
        client = client.with_base_url(base_url);
    }

    // every poll logs in again, so a failed first login is not fatal
    match client.login() {
        Ok(()) => info!("Logged in to ShineMonitor"),
        Err(e) => warn!("Initial login failed: {e}"),
    }
    let mut poller = MetricPoller::new(client);

    let mut output_channels: Vec<Box<dyn MetricCollector>> = Vec::new();
    if let Some(config) = &config.home_assistant {
        info!("Publishing to Home Assistant");
        output_channels.push(Box::new(HomeAssistant::<RumqttcWrapper>::new(config)));
    }

    if let Some(config) = &config.simple_mqtt {
        info!("Publishing to simple MQTT broker");
        output_channels.push(Box::new(SimpleMqtt::<RumqttcWrapper>::new(config)));
    }

    loop {
        match poller.refresh() {
            Ok(()) => output_channels.iter_mut().for_each(|channel| {
                channel.publish(&poller);
            }),
            Err(e) => warn!("Skipping this update: {e}"),
        }

        thread::sleep(Duration::from_millis(config.update_interval()));
    }
}
