use crate::{
    connectors::sink::{Sink, WriteResult},
    error::SinkError,
};
use futures::future::join_all;
use model::pagination::page::Page;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a page is handed to the registered sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// One sink after another; the first failure stops the page.
    #[default]
    Sequential,
    /// All sinks at once; the page is done when every sink is.
    Concurrent,
}

#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: String,
    pub result: Result<WriteResult, SinkError>,
}

/// The sinks active for a run, in registration order.
#[derive(Default, Clone)]
pub struct SinkSet {
    sinks: Vec<Arc<dyn Sink>>,
    mode: DistributionMode,
}

impl SinkSet {
    pub fn new(mode: DistributionMode) -> Self {
        SinkSet {
            sinks: Vec::new(),
            mode,
        }
    }

    pub fn register(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.register(sink);
        self
    }

    pub fn mode(&self) -> DistributionMode {
        self.mode
    }

    pub fn names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Delivers `page` to every sink and reports each sink's result in
    /// registration order. In sequential mode sinks after a failing one are
    /// not called and have no outcome.
    pub async fn distribute(&self, page: &Page) -> Vec<SinkOutcome> {
        match self.mode {
            DistributionMode::Sequential => {
                let mut outcomes = Vec::with_capacity(self.sinks.len());
                for sink in &self.sinks {
                    let result = sink.consume_page(page).await;
                    let failed = result.is_err();
                    outcomes.push(SinkOutcome {
                        sink: sink.name().to_string(),
                        result,
                    });
                    if failed {
                        break;
                    }
                }
                outcomes
            }
            DistributionMode::Concurrent => {
                let results = join_all(self.sinks.iter().map(|sink| sink.consume_page(page))).await;
                self.sinks
                    .iter()
                    .zip(results)
                    .map(|(sink, result)| SinkOutcome {
                        sink: sink.name().to_string(),
                        result,
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Records how many pages it saw and can be told to fail.
    struct ProbeSink {
        name: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ProbeSink {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(ProbeSink {
                name,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Sink for ProbeSink {
        fn name(&self) -> &str {
            self.name
        }

        async fn consume_page(&self, page: &Page) -> Result<WriteResult, SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SinkError::InvalidBatchSize(
                    model::error::BatchError::InvalidBatchSize(0),
                ));
            }
            Ok(WriteResult {
                records_written: page.len(),
                ..WriteResult::default()
            })
        }
    }

    fn page() -> Page {
        Page::new(0, vec![model::records::record::Record::new().with("id", 1)])
    }

    #[tokio::test]
    async fn sequential_stops_at_first_failure() {
        let first = ProbeSink::new("first", true);
        let second = ProbeSink::new("second", false);
        let set = SinkSet::new(DistributionMode::Sequential)
            .with_sink(first.clone())
            .with_sink(second.clone());

        let outcomes = set.distribute(&page()).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_err());
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_reaches_every_sink() {
        let first = ProbeSink::new("first", true);
        let second = ProbeSink::new("second", false);
        let set = SinkSet::new(DistributionMode::Concurrent)
            .with_sink(first.clone())
            .with_sink(second.clone());

        let outcomes = set.distribute(&page()).await;
        let names: Vec<_> = outcomes.iter().map(|o| o.sink.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].result.as_ref().unwrap().records_written, 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_set_has_no_outcomes() {
        let set = SinkSet::default();
        assert!(set.is_empty());
        assert!(set.distribute(&page()).await.is_empty());
    }
}
