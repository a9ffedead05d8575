//! Bounded hand-off between the fetch loop and the sinks
//!
//! The fetcher hands each item to [`SinkDispatcher::dispatch`] and gives up its
//! copy. A single worker task drains the queue and writes every item to every
//! sink in arrival order. When the queue is full, `dispatch` waits, which slows
//! the fetch loop down to the speed of the slowest sink.

use crate::api::Item;
use crate::output::events::EventEmitter;
use crate::output::traits::{ItemSink, SinkConfig, SinkError, SinkResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Totals reported by the sink worker when it shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Items taken off the queue
    pub received: usize,

    /// Successful sink writes, counted per sink
    pub written: usize,

    /// Failed sink writes and failed finishes
    pub failures: usize,
}

/// Handle for feeding items to the sink worker
pub struct SinkDispatcher {
    tx: mpsc::Sender<Item>,
    worker: JoinHandle<SinkReport>,
}

impl SinkDispatcher {
    /// Spawns the sink worker
    ///
    /// # Arguments
    ///
    /// * `sinks` - Sinks every item is written to
    /// * `config` - Sink configuration for this task
    /// * `capacity` - Maximum number of queued items
    /// * `emitter` - Where sink failures are reported
    pub fn spawn(
        sinks: Vec<Arc<dyn ItemSink>>,
        config: SinkConfig,
        capacity: usize,
        emitter: EventEmitter,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(rx, sinks, config, emitter));
        Self { tx, worker }
    }

    /// Queues an item, waiting while the queue is full
    pub async fn dispatch(&self, item: Item) -> SinkResult<()> {
        self.tx.send(item).await.map_err(|_| SinkError::Closed)
    }

    /// Closes the queue and waits for every queued item to be written
    pub async fn close(self) -> SinkReport {
        drop(self.tx);
        match self.worker.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("Sink worker stopped abnormally: {}", e);
                SinkReport::default()
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Item>,
    sinks: Vec<Arc<dyn ItemSink>>,
    config: SinkConfig,
    emitter: EventEmitter,
) -> SinkReport {
    let mut report = SinkReport::default();

    while let Some(item) = rx.recv().await {
        report.received += 1;
        for sink in &sinks {
            match sink.write(&item, &config).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    report.failures += 1;
                    emitter.warn(format!(
                        "{} sink failed for note {}: {}",
                        sink.name(),
                        item.id,
                        e
                    ));
                }
            }
        }
    }

    for sink in &sinks {
        if let Err(e) = sink.finish().await {
            report.failures += 1;
            emitter.warn(format!("{} sink failed to finish: {}", sink.name(), e));
        }
    }

    tracing::debug!(
        "Sink worker done: {} items, {} writes, {} failures",
        report.received,
        report.written,
        report.failures
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::item;
    use crate::output::events::{channel, Record};
    use crate::output::traits::{MediaFilter, SaveMode};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<String>>,
        fail_on: Option<String>,
        finished: Mutex<bool>,
    }

    #[async_trait]
    impl ItemSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn write(&self, item: &Item, _config: &SinkConfig) -> SinkResult<()> {
            if self.fail_on.as_deref() == Some(item.id.as_str()) {
                return Err(SinkError::Lock("broken".to_string()));
            }
            self.seen.lock().unwrap().push(item.id.clone());
            Ok(())
        }

        async fn finish(&self) -> SinkResult<()> {
            *self.finished.lock().unwrap() = true;
            Ok(())
        }
    }

    fn config() -> SinkConfig {
        SinkConfig {
            mode: SaveMode::None,
            media_filter: MediaFilter::All,
            media_dir: PathBuf::from("media"),
            tabular_dir: PathBuf::from("excel"),
            table_name: "t".to_string(),
        }
    }

    #[tokio::test]
    async fn test_items_reach_sinks_in_order() {
        let (emitter, _rx) = channel();
        let sink = Arc::new(RecordingSink::default());
        let sinks: Vec<Arc<dyn ItemSink>> = vec![sink.clone()];
        let dispatcher = SinkDispatcher::spawn(sinks, config(), 1, emitter);

        for id in ["a", "b", "c", "d"] {
            dispatcher.dispatch(item(id)).await.unwrap();
        }
        let report = dispatcher.close().await;

        assert_eq!(report.received, 4);
        assert_eq!(report.written, 4);
        assert_eq!(report.failures, 0);
        assert_eq!(*sink.seen.lock().unwrap(), vec!["a", "b", "c", "d"]);
        assert!(*sink.finished.lock().unwrap());
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported_not_fatal() {
        let (emitter, mut rx) = channel();
        let sink = Arc::new(RecordingSink {
            fail_on: Some("b".to_string()),
            ..Default::default()
        });
        let sinks: Vec<Arc<dyn ItemSink>> = vec![sink.clone()];
        let dispatcher = SinkDispatcher::spawn(sinks, config(), 4, emitter);

        for id in ["a", "b", "c"] {
            dispatcher.dispatch(item(id)).await.unwrap();
        }
        let report = dispatcher.close().await;

        assert_eq!(report.written, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(*sink.seen.lock().unwrap(), vec!["a", "c"]);

        let warning = rx.try_recv().unwrap();
        match warning {
            Record::Log { message, .. } => assert!(message.contains("note b")),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_sinks_still_drains() {
        let (emitter, _rx) = channel();
        let dispatcher = SinkDispatcher::spawn(Vec::new(), config(), 2, emitter);
        dispatcher.dispatch(item("a")).await.unwrap();
        let report = dispatcher.close().await;
        assert_eq!(report.received, 1);
        assert_eq!(report.written, 0);
    }
}
