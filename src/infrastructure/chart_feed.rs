// Broadcast-backed chart renderer
use crate::application::display_sink::ChartRenderer;
use crate::domain::sample::Metric;
use crate::domain::series::SeriesPoint;
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Full replacement of one chart's points
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartUpdate {
    pub metric: Metric,
    pub label: &'static str,
    pub points: Vec<SeriesPoint>,
}

#[derive(Clone)]
pub struct BroadcastRenderer {
    tx: broadcast::Sender<ChartUpdate>,
    closed: watch::Sender<bool>,
}

impl BroadcastRenderer {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        let (closed, _) = watch::channel(false);
        Self { tx, closed }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChartUpdate> {
        self.tx.subscribe()
    }

    pub fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    /// End every open chart stream; later streams end after their replay.
    pub fn close(&self) {
        self.closed.send_replace(true);
        tracing::debug!(streams = self.closed.receiver_count(), "chart feed closed");
    }
}

impl ChartRenderer for BroadcastRenderer {
    fn redraw(&self, metric: Metric, points: &[SeriesPoint]) {
        let update = ChartUpdate {
            metric,
            label: metric.label(),
            points: points.to_vec(),
        };
        // No open dashboard means nobody to draw for
        if self.tx.send(update).is_err() {
            tracing::trace!(?metric, "no chart subscribers");
        }
    }
}

/// Current charts first, then every redraw as it happens, until `closed`
/// flips. Lagging subscribers skip ahead; each update carries the whole
/// series.
pub fn chart_stream(
    initial: Vec<ChartUpdate>,
    rx: broadcast::Receiver<ChartUpdate>,
    mut closed: watch::Receiver<bool>,
) -> impl Stream<Item = ChartUpdate> + Send + 'static {
    let mut live = BroadcastStream::new(rx);
    async_stream::stream! {
        for update in initial {
            yield update;
        }
        loop {
            let done = *closed.borrow_and_update();
            if done {
                break;
            }
            let item = tokio::select! {
                item = live.next() => item,
                changed = closed.changed() => match changed {
                    Ok(()) => continue,
                    // Renderer dropped
                    Err(_) => None,
                },
            };
            let Some(item) = item else { break };
            match item {
                Ok(update) => yield update,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "chart stream lagged");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_replays_initial_then_live() {
        let renderer = BroadcastRenderer::new(16);
        let initial = vec![ChartUpdate {
            metric: Metric::Threshold,
            label: Metric::Threshold.label(),
            points: vec![],
        }];
        let stream = chart_stream(initial, renderer.subscribe(), renderer.closed_signal());
        tokio::pin!(stream);

        renderer.redraw(Metric::WaterLevel, &[SeriesPoint::new(1_000, 12.0)]);

        let first = stream.next().await.unwrap();
        assert_eq!(first.metric, Metric::Threshold);
        let second = stream.next().await.unwrap();
        assert_eq!(second.metric, Metric::WaterLevel);
        assert_eq!(second.points, vec![SeriesPoint::new(1_000, 12.0)]);
    }

    #[tokio::test]
    async fn test_close_ends_open_stream() {
        let renderer = BroadcastRenderer::new(16);
        let stream = chart_stream(vec![], renderer.subscribe(), renderer.closed_signal());
        tokio::pin!(stream);

        renderer.redraw(Metric::SoilMoisture, &[SeriesPoint::new(1_000, 30.0)]);
        assert_eq!(stream.next().await.unwrap().metric, Metric::SoilMoisture);

        renderer.close();
        let ended = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next()).await;
        assert_eq!(ended.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_opened_after_close_only_replays() {
        let renderer = BroadcastRenderer::new(16);
        renderer.close();
        let initial = vec![ChartUpdate {
            metric: Metric::PumpStatus,
            label: Metric::PumpStatus.label(),
            points: vec![],
        }];

        let updates: Vec<_> = chart_stream(initial, renderer.subscribe(), renderer.closed_signal())
            .collect()
            .await;

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].metric, Metric::PumpStatus);
    }

    #[test]
    fn test_redraw_without_subscribers_is_silent() {
        let renderer = BroadcastRenderer::new(4);
        renderer.redraw(Metric::PumpStatus, &[]);
    }
}
