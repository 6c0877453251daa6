// Canonical sensor sample
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One normalized reading of a crop channel. Built only by the telemetry
/// client, so the remote field naming never leaks past it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub threshold: f64,
    pub soil_moisture: f64,
    pub water_level: f64,
    pub pump_on: bool,
}

impl Sample {
    pub fn new(
        timestamp: DateTime<Utc>,
        threshold: f64,
        soil_moisture: f64,
        water_level: f64,
        pump_on: bool,
    ) -> Self {
        Self {
            timestamp,
            threshold,
            soil_moisture,
            water_level,
            pump_on,
        }
    }

    /// Charted value of a metric; the pump is plotted as 0/1.
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Threshold => self.threshold,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::WaterLevel => self.water_level,
            Metric::PumpStatus => {
                if self.pump_on {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Threshold,
    SoilMoisture,
    WaterLevel,
    PumpStatus,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Threshold,
        Metric::SoilMoisture,
        Metric::WaterLevel,
        Metric::PumpStatus,
    ];

    pub fn index(self) -> usize {
        match self {
            Metric::Threshold => 0,
            Metric::SoilMoisture => 1,
            Metric::WaterLevel => 2,
            Metric::PumpStatus => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Threshold => "Max Threshold",
            Metric::SoilMoisture => "Soil Moisture",
            Metric::WaterLevel => "Water Level (cm)",
            Metric::PumpStatus => "Pump Status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pump_charted_as_binary() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let on = Sample::new(at, 60.0, 41.5, 12.0, true);
        let off = Sample { pump_on: false, ..on.clone() };

        assert_eq!(on.value(Metric::PumpStatus), 1.0);
        assert_eq!(off.value(Metric::PumpStatus), 0.0);
        assert_eq!(on.value(Metric::SoilMoisture), 41.5);
    }

    #[test]
    fn test_metric_indices_are_distinct() {
        let mut seen: Vec<usize> = Metric::ALL.iter().map(|m| m.index()).collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }
}
