use std::path::Path;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::stage::SeedFactory;
use crate::value::{Accumulator, ByteSink, TextAccumulator};

/// Seeds a streaming sink at the destination. The file is created lazily.
#[derive(Clone, Copy, Debug, Default)]
pub struct SinkSeed;

#[async_trait]
impl SeedFactory for SinkSeed {
    async fn seed(&self, destination: &Path) -> PipelineResult<Accumulator> {
        Ok(Accumulator::Sink(ByteSink::new(destination)))
    }
}

/// Seeds an empty in-memory text record for the destination.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextSeed;

#[async_trait]
impl SeedFactory for TextSeed {
    async fn seed(&self, destination: &Path) -> PipelineResult<Accumulator> {
        Ok(Accumulator::Text(TextAccumulator::new(destination)))
    }
}
