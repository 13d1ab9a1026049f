use serde::{Serialize, Serializer};
use std::fmt;

/// Extra fields requested from `queryPlantCurrentData`.
pub const PLANT_INFO: &str = "&par=ENERGY_TODAY,ENERGY_MONTH,ENERGY_YEAR,ENERGY_TOTAL,ENERGY_PROCEEDS,ENERGY_CO2,CURRENT_TEMP,CURRENT_RADIANT,BATTERY_SOC,ENERGY_COAL,ENERGY_SO2";

/// The plant reports the poller knows how to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Query {
    PowerDayPerTime,
    PowerMonthPerDay,
    PowerYearPerMonth,
    PowerPerYear,
    DeviceStatus,
    PlantCurrentData,
}

impl Query {
    pub const ALL: [Query; 6] = [
        Query::PowerDayPerTime,
        Query::PowerMonthPerDay,
        Query::PowerYearPerMonth,
        Query::PowerPerYear,
        Query::DeviceStatus,
        Query::PlantCurrentData,
    ];

    /// Name of the vendor action. Doubles as the key in published snapshots.
    pub fn action(&self) -> &'static str {
        match self {
            // sic, the portal spells it this way
            Query::PowerDayPerTime => "queryPlantActiveOuputPowerOneDay",
            Query::PowerMonthPerDay => "queryPlantEnergyMonthPerDay",
            Query::PowerYearPerMonth => "queryPlantEnergyYearPerMonth",
            Query::PowerPerYear => "queryPlantEnergyTotalPerYear",
            Query::DeviceStatus => "queryPlantDeviceStatus",
            Query::PlantCurrentData => "queryPlantCurrentData",
        }
    }

    pub fn extra_params(&self) -> Option<&'static str> {
        match self {
            Query::PlantCurrentData => Some(PLANT_INFO),
            _ => None,
        }
    }

    /// Human readable name used for Home Assistant entities.
    pub fn label(&self) -> &'static str {
        match self {
            Query::PowerDayPerTime => "Output Power Per Time",
            Query::PowerMonthPerDay => "Energy Month Per Day",
            Query::PowerYearPerMonth => "Energy Year Per Month",
            Query::PowerPerYear => "Energy Total Per Year",
            Query::DeviceStatus => "Device Status",
            Query::PlantCurrentData => "Plant Current Data",
        }
    }

    /// Signed parameter string for this query on `date`.
    pub fn params(&self, plant_id: &str, date: &str) -> String {
        let mut params = format!(
            "&action={}&plantid={plant_id}&date={date}&i18n=pt_BR&lang=pt_BR",
            self.action()
        );
        if let Some(extra) = self.extra_params() {
            params.push_str(extra);
        }
        params
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.action())
    }
}
