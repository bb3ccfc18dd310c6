//! Runs a compiled filter over whole segments.

use std::sync::Arc;
use std::thread;

use crate::error::Result;
use crate::evaluator::EvaluatorState;
use crate::factory::FilterFactory;
use crate::metrics::FilterMetrics;
use crate::model::DocAddress;
use crate::segment::SegmentReader;

/// Collects the documents of one or more segments that pass a filter.
///
/// Hits come back ordered by segment position, then by doc id. The first
/// document that fails to evaluate aborts the search with its error.
pub struct Searcher<'f> {
    factory: &'f FilterFactory,
    metrics: Option<Arc<FilterMetrics>>,
}

impl<'f> Searcher<'f> {
    pub fn new(factory: &'f FilterFactory) -> Self {
        Self {
            factory,
            metrics: None,
        }
    }

    /// Records evaluation counters into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<FilterMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Evaluates docs `0..max_doc` of `segment` in order.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn search_segment(&self, segment: &dyn SegmentReader) -> Result<Vec<DocAddress>> {
        let mut evaluator = self.factory.new_evaluator(segment);
        if evaluator.state() == EvaluatorState::BoundNoField {
            if let Some(metrics) = &self.metrics {
                metrics.segments_missing_field_total.inc();
            }
        }

        let mut hits = Vec::new();
        for doc in 0..segment.max_doc() {
            let outcome = evaluator.evaluate(doc);
            if let Some(metrics) = &self.metrics {
                metrics.documents_evaluated_total.inc();
                match outcome {
                    Ok(true) => {
                        metrics.documents_passed_total.inc();
                    }
                    Ok(false) => {}
                    Err(_) => {
                        metrics.evaluation_errors_total.inc();
                    }
                }
            }
            if outcome? {
                hits.push(DocAddress::new(segment.id(), doc));
            }
        }

        tracing::debug!(
            "Segment {}: {} of {} documents passed",
            segment.id(),
            hits.len(),
            segment.max_doc()
        );
        Ok(hits)
    }

    /// Searches `segments` one after the other.
    pub fn search<S: SegmentReader>(&self, segments: &[S]) -> Result<Vec<DocAddress>> {
        let mut hits = Vec::new();
        for segment in segments {
            hits.extend(self.search_segment(segment)?);
        }
        Ok(hits)
    }

    /// Searches `segments` with one thread per segment.
    pub fn search_parallel<S: SegmentReader>(&self, segments: &[S]) -> Result<Vec<DocAddress>> {
        let results: Vec<Result<Vec<DocAddress>>> = thread::scope(|scope| {
            let handles: Vec<_> = segments
                .iter()
                .map(|segment| scope.spawn(move || self.search_segment(segment)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut hits = Vec::new();
        for result in results {
            hits.extend(result?);
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodedSet;
    use crate::error::Error;
    use crate::model::{FieldSelector, OperationMode};
    use crate::segment::{MemoryDocument, MemorySegment};

    fn segments() -> Vec<MemorySegment> {
        vec![
            MemorySegment::from_documents(
                0,
                vec![
                    MemoryDocument::with_id("1").value("n", 10),
                    MemoryDocument::with_id("2").value("n", 20),
                ],
            ),
            MemorySegment::from_documents(
                1,
                vec![MemoryDocument::with_id("3"), MemoryDocument::with_id("4")],
            ),
            MemorySegment::from_documents(2, vec![MemoryDocument::with_id("5").value("n", 10)]),
        ]
    }

    fn factory(mode: OperationMode) -> FilterFactory {
        FilterFactory::from_parts(
            FieldSelector::Stored("n".to_string()),
            mode,
            DecodedSet::from_values([10]),
        )
    }

    #[test]
    fn should_collect_hits_in_segment_then_doc_order() {
        // given
        let factory = factory(OperationMode::Exclude);
        let searcher = Searcher::new(&factory);

        // when
        let hits = searcher.search(&segments()).unwrap();

        // then
        assert_eq!(
            hits,
            vec![
                DocAddress::new(0, 1),
                DocAddress::new(1, 0),
                DocAddress::new(1, 1),
            ]
        );
    }

    #[test]
    fn should_match_sequential_results_when_parallel() {
        // given
        let factory = factory(OperationMode::Include);
        let searcher = Searcher::new(&factory);
        let segments = segments();

        // when
        let sequential = searcher.search(&segments).unwrap();
        let parallel = searcher.search_parallel(&segments).unwrap();

        // then
        assert_eq!(sequential, vec![DocAddress::new(0, 0), DocAddress::new(2, 0)]);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn should_record_metrics() {
        // given
        let factory = factory(OperationMode::Include);
        let metrics = Arc::new(FilterMetrics::new());
        let searcher = Searcher::new(&factory).with_metrics(Arc::clone(&metrics));

        // when
        searcher.search_parallel(&segments()).unwrap();

        // then
        assert_eq!(metrics.documents_evaluated_total.get(), 5);
        assert_eq!(metrics.documents_passed_total.get(), 2);
        assert_eq!(metrics.evaluation_errors_total.get(), 0);
        assert_eq!(metrics.segments_missing_field_total.get(), 1);
    }

    #[test]
    fn should_stop_at_first_evaluation_error() {
        // given
        let factory = FilterFactory::from_parts(
            FieldSelector::Identifier,
            OperationMode::Include,
            DecodedSet::from_values([1]),
        );
        let segment = MemorySegment::from_documents(
            0,
            vec![
                MemoryDocument::with_id("1"),
                MemoryDocument::with_id("x"),
                MemoryDocument::with_id("3"),
            ],
        );
        let metrics = Arc::new(FilterMetrics::new());
        let searcher = Searcher::new(&factory).with_metrics(Arc::clone(&metrics));

        // when
        let result = searcher.search(&[segment]);

        // then
        assert_eq!(
            result,
            Err(Error::ValueParse {
                doc: 1,
                value: "x".to_string()
            })
        );
        assert_eq!(metrics.documents_evaluated_total.get(), 2);
        assert_eq!(metrics.evaluation_errors_total.get(), 1);
    }
}
