use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::client::SigningClient;
use crate::clock::{Clock, SystemClock};
use crate::error::ShineResult;
use crate::query::Query;

pub const SENSOR_NAME: &str = "ShineMonitor Sensor";

// Reported for every value, including status, temperature and CO2.
pub const UNIT_OF_MEASUREMENT: &str = "kWh";

/// Raw report values of one poll cycle, keyed by query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<Query, Value>);

impl Snapshot {
    pub fn get(&self, query: Query) -> Option<&Value> {
        self.0.get(&query)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Query, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, query: Query, value: Value) {
        self.0.insert(query, value);
    }
}

impl FromIterator<(Query, Value)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (Query, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What a host integration needs to expose the readings.
pub trait Sensor {
    fn name(&self) -> &str;
    fn unit(&self) -> &str;
    fn plant_id(&self) -> &str;
    fn snapshot(&self) -> &Snapshot;
}

/// Fetches every report of one plant and keeps the latest complete set.
pub struct MetricPoller<C: Clock = SystemClock> {
    client: SigningClient<C>,
    snapshot: Snapshot,
}

impl<C: Clock> MetricPoller<C> {
    pub fn new(client: SigningClient<C>) -> Self {
        Self {
            client,
            snapshot: Snapshot::default(),
        }
    }

    /// Runs all queries in order. The first failure aborts the cycle and the
    /// previous snapshot stays in place.
    pub fn refresh(&mut self) -> ShineResult<()> {
        let mut snapshot = Snapshot::default();
        for query in Query::ALL {
            let value = fetch(&mut self.client, query)?;
            debug!("{query}: {value}");
            snapshot.insert(query, value);
        }

        info!(
            "refreshed {} reports for plant {}",
            snapshot.len(),
            self.client.credentials().plant_id
        );
        self.snapshot = snapshot;
        Ok(())
    }
}

fn fetch<C: Clock>(client: &mut SigningClient<C>, query: Query) -> ShineResult<Value> {
    match query {
        Query::PowerDayPerTime => client.power_day_per_time(),
        Query::PowerMonthPerDay => client.power_month_per_day(),
        Query::PowerYearPerMonth => client.power_year_per_month(),
        Query::PowerPerYear => client.power_per_year(),
        Query::DeviceStatus => client.device_status(),
        Query::PlantCurrentData => client.plant_current_data(),
    }
}

impl<C: Clock> Sensor for MetricPoller<C> {
    fn name(&self) -> &str {
        SENSOR_NAME
    }

    fn unit(&self) -> &str {
        UNIT_OF_MEASUREMENT
    }

    fn plant_id(&self) -> &str {
        &self.client.credentials().plant_id
    }

    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}
