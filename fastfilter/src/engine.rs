//! Script engine glue for hosts that compile filters by name.

use std::fmt;

use crate::error::{Error, Result};
use crate::factory::{FilterFactory, Params};

/// Contexts a host may compile a script for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptContext {
    Filter,
    Score,
    Aggregation,
    Update,
}

impl ScriptContext {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptContext::Filter => "filter",
            ScriptContext::Score => "score",
            ScriptContext::Aggregation => "aggs",
            ScriptContext::Update => "update",
        }
    }
}

impl fmt::Display for ScriptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiles `fast_filter` scripts into [`FilterFactory`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastFilterEngine;

impl FastFilterEngine {
    /// Language name the engine registers under.
    pub const TYPE: &'static str = "fast_filter";

    /// The only script source the engine knows.
    pub const SCRIPT_SOURCE: &'static str = "fast_filter";

    pub fn new() -> Self {
        Self
    }

    /// Compiles the script `source` for `context` with query `params`.
    ///
    /// `script_name` is only used for logging.
    pub fn compile(
        &self,
        script_name: &str,
        source: &str,
        context: ScriptContext,
        params: &Params,
    ) -> Result<FilterFactory> {
        if !self.supported_contexts().contains(&context) {
            return Err(Error::UnsupportedContext {
                engine: Self::TYPE,
                context: context.name(),
            });
        }
        if source != Self::SCRIPT_SOURCE {
            return Err(Error::UnknownScript(source.to_string()));
        }
        tracing::debug!("Compiling script [{}] for context {}", script_name, context);
        FilterFactory::new(params)
    }

    pub fn supported_contexts(&self) -> &'static [ScriptContext] {
        &[ScriptContext::Filter]
    }
}
