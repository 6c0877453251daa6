// Scalar "latest value" readouts shown above the charts
use super::sample::Sample;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

pub const PLACEHOLDER: &str = "--";
const PUMP_ERROR: &str = "Error";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readouts {
    pub soil_moisture: String,
    pub water_level: String,
    pub pump_status: String,
    pub threshold: String,
    pub last_updated: Option<String>,
}

impl Default for Readouts {
    fn default() -> Self {
        Self {
            soil_moisture: PLACEHOLDER.to_string(),
            water_level: with_unit(PLACEHOLDER),
            pump_status: PLACEHOLDER.to_string(),
            threshold: PLACEHOLDER.to_string(),
            last_updated: None,
        }
    }
}

impl Readouts {
    pub fn from_sample(sample: &Sample, offset: FixedOffset) -> Self {
        Self {
            soil_moisture: sample.soil_moisture.to_string(),
            water_level: with_unit(&sample.water_level.to_string()),
            pump_status: if sample.pump_on { "ON" } else { "OFF" }.to_string(),
            threshold: sample.threshold.to_string(),
            last_updated: Some(format_timestamp(sample.timestamp, offset)),
        }
    }

    /// Failed tick: every value becomes a placeholder, the last-updated time
    /// keeps pointing at the last good sample.
    pub fn mark_unavailable(&mut self) {
        self.soil_moisture = PLACEHOLDER.to_string();
        self.water_level = with_unit(PLACEHOLDER);
        self.pump_status = PUMP_ERROR.to_string();
        self.threshold = PLACEHOLDER.to_string();
    }
}

fn with_unit(value: &str) -> String {
    format!("{} cm", value)
}

/// Format like "16 Oct 2026, 02:03:04 pm" in the dashboard's local offset.
pub fn format_timestamp(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp
        .with_timezone(&offset)
        .format("%-d %b %Y, %I:%M:%S %P")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    #[test]
    fn test_format_timestamp_in_offset() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 8, 33, 4).unwrap();
        assert_eq!(format_timestamp(ts, ist()), "16 Oct 2026, 02:03:04 pm");
    }

    #[test]
    fn test_readouts_from_sample() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let sample = Sample::new(ts, 65.0, 42.5, 12.0, true);
        let readouts = Readouts::from_sample(&sample, ist());

        assert_eq!(readouts.soil_moisture, "42.5");
        assert_eq!(readouts.water_level, "12 cm");
        assert_eq!(readouts.pump_status, "ON");
        assert_eq!(readouts.threshold, "65");
        assert_eq!(readouts.last_updated.as_deref(), Some("2 Jan 2026, 05:30:00 am"));
    }

    #[test]
    fn test_mark_unavailable_keeps_last_updated() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let mut readouts = Readouts::from_sample(&Sample::new(ts, 1.0, 2.0, 3.0, false), ist());
        readouts.mark_unavailable();

        assert_eq!(readouts.soil_moisture, PLACEHOLDER);
        assert_eq!(readouts.water_level, "-- cm");
        assert_eq!(readouts.pump_status, "Error");
        assert!(readouts.last_updated.is_some());
    }
}
