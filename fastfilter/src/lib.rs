//! fastfilter - per-document include/exclude filtering against a compressed
//! integer set.
//!
//! A query supplies three parameters: the `field` whose value is tested, the
//! `terms` set as base64 text in the portable Roaring serialization, and an
//! `operation` of `include` or `exclude`. The set is decoded once into a
//! [`FilterFactory`]; the factory then hands out one [`FilterEvaluator`] per
//! index segment, which answers pass or fail for each document in doc id
//! order.
//!
//! # Key Concepts
//!
//! - **DecodedSet**: An immutable, queryable `u32` set kept in its compressed
//!   container form and shared by all evaluators through an `Arc`.
//! - **ValueCursor**: Reads the value tested for each document, either by
//!   parsing the document's `_id` or from the segment's numeric doc values.
//! - **Segment without the field**: Every document gets the same verdict.
//!   It fails an include filter and passes an exclude filter.
//!
//! # Example
//!
//! ```
//! use fastfilter::{FilterFactory, MemoryDocument, MemorySegment, Params};
//! use serde_json::json;
//!
//! let params: Params = [
//!     ("field", json!("_id")),
//!     ("terms", json!("OjAAAAIAAAAAAAEADwAAABgAAAAcAAAABQDoA0BC")),
//!     ("operation", json!("include")),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v))
//! .collect();
//!
//! let factory = FilterFactory::new(&params)?;
//! let segment = MemorySegment::from_documents(
//!     0,
//!     vec![MemoryDocument::with_id("5"), MemoryDocument::with_id("6")],
//! );
//! let mut evaluator = factory.new_evaluator(&segment);
//! assert!(evaluator.evaluate(0)?);
//! assert!(!evaluator.evaluate(1)?);
//! # Ok::<(), fastfilter::Error>(())
//! ```

pub mod codec;
pub mod config;
mod cursor;
mod engine;
mod error;
mod evaluator;
mod factory;
mod metrics;
mod model;
mod search;
mod segment;

pub use codec::{DecodedSet, decode_terms, encode_terms};
pub use cursor::{CursorBinding, IdentifierCursor, StoredFieldCursor, ValueCursor};
pub use engine::{FastFilterEngine, ScriptContext};
pub use error::{Error, Result};
pub use evaluator::{EvaluatorState, FilterEvaluator};
pub use factory::{FIELD_PARAM, FilterFactory, OPERATION_PARAM, Params, TERMS_PARAM};
pub use metrics::FilterMetrics;
pub use model::{DocAddress, DocId, FieldSelector, ID_FIELD, OperationMode, SegmentId};
pub use search::Searcher;
pub use segment::{MemoryDocument, MemorySegment, NumericDocValues, SegmentReader};
