//! Concurrent gathering of topic metadata.
//!
//! Every topic gets its own worker task. Workers talk to the cluster in
//! parallel and hand finished records to a single serializer, which is the
//! only thing that ever touches the [`RecordSink`]. A worker waits for the
//! serializer to confirm the write before it counts as done, so once all
//! workers are joined all of their output has been written.
//!
//! Records come out in the order their metadata was complete, not in the
//! order the topics were given. Sort downstream if order matters.
use std::sync::Arc;

use regex::Regex;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinSet,
};
use tracing::instrument;

use crate::{
    cluster::{ClusterClient, OffsetPosition},
    error::{Error, Result},
    sink::{Diagnostics, RecordSink},
    topic::{DetailFlags, Partition, Topic},
};

/// Outcome of one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Records written to the sink.
    pub emitted: usize,
    /// Topics that were reported as failed.
    pub errors: usize,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// A finished record on its way to the serializer.
struct Submission {
    topic: Topic,
    /// Answered once the record has been written, or failed to be.
    written: oneshot::Sender<Result<()>>,
}

/// Keep the topics whose name matches `filter`, in listing order.
pub fn select_topics(all: Vec<String>, filter: &Regex) -> Vec<String> {
    all.into_iter().filter(|name| filter.is_match(name)).collect()
}

/// Gather the records of `topics` and write them to `sink`.
///
/// Failures of individual topics are reported to `diagnostics` and counted
/// in the returned [`Summary`]; they never stop the other topics. The call
/// only fails if the sink cannot be finished.
///
/// ### Example
/// ```rust,no_run
/// # async fn run(client: std::sync::Arc<kt::prelude::KafkaCluster>) -> kt::prelude::Result<()> {
/// use kt::prelude::*;
///
/// let mut sink = JsonSink::new(tokio::io::stdout());
/// let flags = DetailFlags::new().partitions(true);
/// let topics = vec![String::from("purchases")];
///
/// let summary = gather_and_emit(topics, flags, client, &mut sink, &LogDiagnostics).await?;
/// println!("{} written, {} failed", summary.emitted, summary.errors);
/// # Ok(())
/// # }
/// ```
#[instrument(skip_all, fields(topics = topics.len()))]
pub async fn gather_and_emit<C, S, D>(
    topics: Vec<String>,
    flags: DetailFlags,
    client: Arc<C>,
    sink: &mut S,
    diagnostics: &D,
) -> Result<Summary>
where
    C: ClusterClient + Send + Sync + 'static,
    S: RecordSink + Send + ?Sized,
    D: Diagnostics + ?Sized,
{
    // capacity 1 so a submission is a hand-off, the ack does the rest
    let (submissions, receiver) = mpsc::channel(1);

    let mut workers = JoinSet::new();
    for name in topics {
        let client = Arc::clone(&client);
        let submissions = submissions.clone();
        workers.spawn(async move {
            let result = gather_topic(client.as_ref(), &name, flags, &submissions).await;
            (name, result)
        });
    }
    // the serializer stops once the last worker drops its sender
    drop(submissions);

    let collect = async {
        let mut summary = Summary::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((_, Ok(()))) => summary.emitted += 1,
                Ok((name, Err(err))) => {
                    diagnostics.topic_failed(&name, &err);
                    summary.errors += 1;
                }
                Err(err) => {
                    tracing::error!("Topic worker did not finish {:?}", err);
                    summary.errors += 1;
                }
            }
        }
        summary
    };

    let (summary, finished) = tokio::join!(collect, serialize(receiver, sink));
    finished?;

    tracing::debug!(
        "Emitted {} topics with {} errors",
        summary.emitted,
        summary.errors
    );
    Ok(summary)
}

/// Write submissions one by one until every sender is gone.
async fn serialize<S>(mut receiver: mpsc::Receiver<Submission>, sink: &mut S) -> Result<()>
where
    S: RecordSink + Send + ?Sized,
{
    while let Some(submission) = receiver.recv().await {
        let result = sink.emit(&submission.topic).await;
        if submission.written.send(result).is_err() {
            tracing::warn!(
                "Worker for topic {} hung up before the write was confirmed",
                submission.topic.name
            );
        }
    }

    sink.finish().await
}

async fn gather_topic<C>(
    client: &C,
    name: &str,
    flags: DetailFlags,
    submissions: &mpsc::Sender<Submission>,
) -> Result<()>
where
    C: ClusterClient + Sync + ?Sized,
{
    tracing::debug!("Reading topic {}", name);
    let topic = read_topic(client, name, flags).await?;

    let (written, confirmation) = oneshot::channel();
    submissions
        .send(Submission { topic, written })
        .await
        .map_err(|_| Error::SerializerClosed)?;

    confirmation.await.map_err(|_| Error::SerializerClosed)?
}

/// Build the record of a single topic.
///
/// Per partition the details are fetched in a fixed order: oldest offset,
/// newest offset, leader, replicas, in-sync replicas. The first failure
/// abandons the whole topic.
pub async fn read_topic<C>(client: &C, name: &str, flags: DetailFlags) -> Result<Topic>
where
    C: ClusterClient + Sync + ?Sized,
{
    if !flags.partitions {
        return Ok(Topic::bare(name));
    }

    let ids = client.partitions_of(name).await?;
    let mut partitions = Vec::with_capacity(ids.len());

    for id in ids {
        let oldest = client.get_offset(name, id, OffsetPosition::Oldest).await?;
        let newest = client.get_offset(name, id, OffsetPosition::Newest).await?;
        let mut partition = Partition::new(id, oldest, newest);

        if flags.leaders {
            partition.leader = Some(client.leader_of(name, id).await?);
        }

        if flags.replicas {
            partition.replicas = Some(client.replicas_of(name, id).await?);
            partition.in_sync_replicas = Some(client.in_sync_replicas_of(name, id).await?);
        }

        partitions.push(partition);
    }

    Ok(Topic {
        name: name.to_owned(),
        partitions: Some(partitions),
    })
}
