// Rolling time-series store - one bounded series per metric
use super::sample::{Metric, Sample};
use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_SERIES_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// Chronologically ordered points of a single metric. Oldest is evicted
/// first once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct Series {
    metric: Metric,
    capacity: usize,
    points: VecDeque<SeriesPoint>,
}

impl Series {
    fn new(metric: Metric, capacity: usize) -> Self {
        Self {
            metric,
            capacity,
            points: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> Vec<SeriesPoint> {
        self.points.iter().copied().collect()
    }

    fn push(&mut self, point: SeriesPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    fn clear(&mut self) {
        self.points.clear();
    }
}

/// The four metric series, always mutated in lockstep.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    series: [Series; 4],
}

impl SeriesStore {
    pub fn new(capacity: usize) -> Self {
        // A zero capacity would silently drop every point.
        let capacity = capacity.max(1);
        Self {
            series: Metric::ALL.map(|m| Series::new(m, capacity)),
        }
    }

    pub fn reset(&mut self) {
        for series in &mut self.series {
            series.clear();
        }
    }

    /// Push one sample into all four series. Takes `&mut self`, so no reader
    /// can observe a partially applied sample.
    pub fn append(&mut self, sample: &Sample) {
        let time_ms = sample.timestamp.timestamp_millis();
        for series in &mut self.series {
            let value = sample.value(series.metric);
            series.push(SeriesPoint::new(time_ms, value));
        }
    }

    /// Replace the contents with a historical batch (oldest first).
    pub fn seed(&mut self, samples: &[Sample]) {
        self.reset();
        for sample in samples {
            self.append(sample);
        }
    }

    pub fn get(&self, metric: Metric) -> &Series {
        &self.series[metric.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.iter()
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERIES_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn sample(secs: i64) -> Sample {
        Sample::new(at(secs), 70.0, secs as f64, secs as f64 * 2.0, secs % 2 == 0)
    }

    #[test]
    fn test_append_never_exceeds_capacity() {
        let mut store = SeriesStore::default();
        for i in 0..57 {
            store.append(&sample(i));
            for series in store.iter() {
                assert!(series.len() <= DEFAULT_SERIES_CAPACITY);
            }
        }
    }

    #[test]
    fn test_eviction_keeps_most_recent_in_order() {
        let mut store = SeriesStore::default();
        for i in 0..35 {
            store.append(&sample(i));
        }

        let soil = store.get(Metric::SoilMoisture).points();
        let values: Vec<f64> = soil.iter().map(|p| p.value).collect();
        let expected: Vec<f64> = (15..35).map(|i| i as f64).collect();
        assert_eq!(values, expected);
        assert!(soil.windows(2).all(|w| w[0].time_ms < w[1].time_ms));
    }

    #[test]
    fn test_series_move_in_lockstep() {
        let mut store = SeriesStore::new(3);
        for i in 0..5 {
            store.append(&sample(i));
        }

        let times: Vec<Vec<i64>> = store
            .iter()
            .map(|s| s.points().iter().map(|p| p.time_ms).collect())
            .collect();
        assert!(times.iter().all(|t| t == &times[0]));
        assert_eq!(store.get(Metric::PumpStatus).points()[0].value, 1.0);
    }

    #[test]
    fn test_seed_then_live_append() {
        let mut store = SeriesStore::default();
        store.append(&sample(-100));

        let history: Vec<Sample> = (0..20).map(sample).collect();
        store.seed(&history);
        store.append(&sample(20));

        let water = store.get(Metric::WaterLevel).points();
        assert_eq!(water.len(), 20);
        assert_eq!(water.last().unwrap().value, 40.0);
        // Earlier points are the tail of the history
        let expected: Vec<f64> = (1..20).map(|i| i as f64 * 2.0).collect();
        let actual: Vec<f64> = water[..19].iter().map(|p| p.value).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_reset_clears_every_series() {
        let mut store = SeriesStore::default();
        store.append(&sample(1));
        store.reset();
        assert!(store.iter().all(|s| s.is_empty()));
    }
}
