use async_trait::async_trait;

use crate::encoding::TextEncoding;
use crate::error::{PipelineError, PipelineResult};
use crate::file::SourceFile;
use crate::stage::Reducer;
use crate::value::{Accumulator, ByteSink, ByteStream, Mapped};

/// Default reduce: appends each mapped value to the accumulator.
///
/// | accumulator | stream              | text              |
/// |-------------|---------------------|-------------------|
/// | sink        | pipe, keep open     | encode and write  |
/// | text record | drain, append       | append            |
/// | plain       | drain, concatenate  | concatenate       |
///
/// An [`Accumulator::Opaque`] is a configuration error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultReduce {
    encoding: TextEncoding,
}

impl DefaultReduce {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }
}

#[async_trait]
impl Reducer for DefaultReduce {
    async fn reduce(&self, acc: Accumulator, file: &mut SourceFile) -> PipelineResult<Accumulator> {
        let mapped = file.take_mapped()?;
        match (acc, mapped) {
            (Accumulator::Sink(mut sink), Mapped::Stream(mut stream)) => {
                pipe_into_sink(&mut sink, &mut stream).await?;
                Ok(Accumulator::Sink(sink))
            }
            (Accumulator::Sink(mut sink), Mapped::Text(text)) => {
                write_into_sink(&mut sink, &text, self.encoding).await?;
                Ok(Accumulator::Sink(sink))
            }
            (Accumulator::Text(mut record), mapped) => {
                append_text(&mut record.content, mapped, self.encoding).await?;
                Ok(Accumulator::Text(record))
            }
            (Accumulator::Plain(mut content), mapped) => {
                append_text(&mut content, mapped, self.encoding).await?;
                Ok(Accumulator::Plain(content))
            }
            (Accumulator::Opaque(_), _) => Err(PipelineError::Configuration(format!(
                "default reduce cannot fold {} into a custom accumulator; configure a reduce stage",
                file.path.display()
            ))),
        }
    }
}

async fn pipe_into_sink(sink: &mut ByteSink, stream: &mut ByteStream) -> PipelineResult<()> {
    sink.pipe_from(stream).await.map(|_| ())
}

async fn write_into_sink(
    sink: &mut ByteSink,
    text: &str,
    encoding: TextEncoding,
) -> PipelineResult<()> {
    let bytes = encoding.encode(text)?;
    sink.write_all(&bytes).await
}

async fn append_text(
    target: &mut String,
    mapped: Mapped,
    encoding: TextEncoding,
) -> PipelineResult<()> {
    target.push_str(&mapped.into_text(encoding).await?);
    Ok(())
}
