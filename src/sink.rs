//! Destinations for finished records and for per-topic failures.
//!
//! Records and diagnostics are kept on separate channels so the structured
//! output can be piped somewhere while failures end up in the log.
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    error::{Error, Result},
    topic::Topic,
};

/// Receives complete records, one at a time.
///
/// Only the pipeline's serializer ever calls into a sink, so
/// implementations need no synchronization of their own.
#[async_trait]
pub trait RecordSink {
    async fn emit(&mut self, topic: &Topic) -> Result<()>;

    /// No more records will arrive.
    async fn finish(&mut self) -> Result<()>;
}

/// Where per-topic failures are reported.
pub trait Diagnostics {
    fn topic_failed(&self, topic: &str, error: &Error);
}

/// Reports failures as `tracing` error events.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn topic_failed(&self, topic: &str, error: &Error) {
        tracing::error!(topic, %error, "failed to read info for topic");
    }
}

/// How [`JsonSink`] frames consecutive records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Every record is its own JSON document followed by a newline.
    #[default]
    Lines,
    /// All records form a single JSON array, closed by
    /// [`finish`](RecordSink::finish).
    Array,
}

/// Writes records as JSON to any async writer.
///
/// ### Example
/// ```rust
/// let sink = kt::prelude::JsonSink::new(tokio::io::stdout())
///     .pretty(true)
///     .layout(kt::prelude::Layout::Lines);
/// ```
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
    pretty: bool,
    layout: Layout,
    written: usize,
}

impl<W> JsonSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
            layout: Layout::default(),
            written: 0,
        }
    }

    /// Indent every record.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn encode(&self, topic: &Topic) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        if self.layout == Layout::Array {
            let separator: &[u8] = if self.written == 0 { b"[\n" } else { b",\n" };
            buffer.extend_from_slice(separator);
        }

        if self.pretty {
            serde_json::to_writer_pretty(&mut buffer, topic)?;
        } else {
            serde_json::to_writer(&mut buffer, topic)?;
        }

        if self.layout == Layout::Lines {
            buffer.push(b'\n');
        }
        Ok(buffer)
    }
}

#[async_trait]
impl<W> RecordSink for JsonSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&mut self, topic: &Topic) -> Result<()> {
        // encode up front so a record hits the writer in one piece
        let buffer = self.encode(topic)?;
        self.writer.write_all(&buffer).await?;
        self.writer.flush().await?;
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if self.layout == Layout::Array {
            let closing: &[u8] = if self.written == 0 { b"[]\n" } else { b"\n]\n" };
            self.writer.write_all(closing).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::topic::Partition;

    fn purchases() -> Topic {
        Topic {
            name: String::from("purchases"),
            partitions: Some(vec![Partition::new(0, 0, 12)]),
        }
    }

    #[tokio::test]
    async fn test_lines_layout() {
        let mut sink = JsonSink::new(Vec::new());
        sink.emit(&Topic::bare("orders")).await.unwrap();
        sink.emit(&purchases()).await.unwrap();
        sink.finish().await.unwrap();

        assert_eq!(sink.written(), 2);
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "{\"name\":\"orders\"}\n\
             {\"name\":\"purchases\",\"partitions\":[{\"id\":0,\"oldest\":0,\"newest\":12}]}\n"
        );
    }

    #[tokio::test]
    async fn test_pretty_lines_layout() {
        let mut sink = JsonSink::new(Vec::new()).pretty(true);
        sink.emit(&Topic::bare("orders")).await.unwrap();
        sink.finish().await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "{\n  \"name\": \"orders\"\n}\n");
    }

    #[tokio::test]
    async fn test_array_layout() {
        let mut sink = JsonSink::new(Vec::new()).layout(Layout::Array);
        sink.emit(&Topic::bare("orders")).await.unwrap();
        sink.emit(&purchases()).await.unwrap();
        sink.finish().await.unwrap();

        let output = sink.into_inner();
        let parsed: Vec<Topic> = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed, vec![Topic::bare("orders"), purchases()]);
    }

    #[tokio::test]
    async fn test_empty_array_layout() {
        let mut sink = JsonSink::new(Vec::new()).layout(Layout::Array);
        sink.finish().await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(output, "[]\n");
    }
}
