//! Work items and record sinks exchanged with the crawl loop.

use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use redharvest_core::CanonicalRecord;

use crate::normalize::ThreadContext;
use crate::pagination::PageCursor;

/// One request to make, together with the state needed to handle its
/// response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub url: String,
    pub kind: TaskKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// A page of a listing or search stream.
    ListPage(PageCursor),
    /// A post seed URL; the response carries the post and its thread.
    PostDetail { seed_key: String },
    /// The comment thread of a post held in the pending arena.
    FetchComments(ThreadContext),
}

impl Task {
    #[must_use]
    pub fn list_page(url: String, cursor: PageCursor) -> Self {
        Self {
            url,
            kind: TaskKind::ListPage(cursor),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match &self.kind {
            TaskKind::ListPage(cursor) => format!("{} page {}", cursor.stream, cursor.page),
            TaskKind::PostDetail { .. } => "post".to_owned(),
            TaskKind::FetchComments(_) => "comments".to_owned(),
        }
    }
}

/// Append-only destination for emitted records.
pub trait RecordSink: Send + Sync {
    fn emit(&self, record: CanonicalRecord);
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CanonicalRecord>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<CanonicalRecord> {
        self.records.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, record: CanonicalRecord) {
        self.records.lock().push(record);
    }
}

/// Forwards records to a writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CanonicalRecord>,
}

impl RecordSink for ChannelSink {
    fn emit(&self, record: CanonicalRecord) {
        if self.tx.send(record).is_err() {
            tracing::error!("record writer has stopped, dropping record");
        }
    }
}

/// Spawns a task writing every record sent to the returned sink to `writer`
/// as one JSON line. The task finishes, returning the number of lines
/// written, once every clone of the sink is dropped.
#[must_use]
pub fn spawn_jsonl_writer<W>(mut writer: W) -> (ChannelSink, JoinHandle<std::io::Result<u64>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<CanonicalRecord>();
    let handle = tokio::spawn(async move {
        let mut written = 0u64;
        while let Some(record) = rx.recv().await {
            let mut line = serde_json::to_vec(&record).map_err(std::io::Error::other)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
            written += 1;
        }
        writer.flush().await?;
        Ok(written)
    });
    (ChannelSink { tx }, handle)
}
