//! The view of the cluster the pipeline works against.
//!
//! [`ClusterClient`] is the seam between the metadata pipeline and whatever
//! talks to the brokers. The production implementation is
//! [`KafkaCluster`](crate::prelude::KafkaCluster); tests script their own.
use async_trait::async_trait;

use crate::error::Result;

/// Which end of a partition's log to ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OffsetPosition {
    /// The low watermark, the oldest offset still retained.
    Oldest,
    /// The high watermark, the offset the next message will get.
    Newest,
}

/// Read-only metadata access to a cluster.
///
/// Implementations are shared between all workers of a pipeline run and
/// must tolerate concurrent calls.
#[async_trait]
pub trait ClusterClient {
    /// Names of every topic in the cluster.
    ///
    /// Failing here is fatal for a run and should surface as
    /// [`Error::Connection`](crate::prelude::Error::Connection).
    async fn list_topics(&self) -> Result<Vec<String>>;

    /// Partition ids of `topic`, in the order the cluster reports them.
    async fn partitions_of(&self, topic: &str) -> Result<Vec<i32>>;

    async fn get_offset(
        &self,
        topic: &str,
        partition: i32,
        which: OffsetPosition,
    ) -> Result<i64>;

    /// Address (`host:port`) of the broker leading the partition.
    async fn leader_of(&self, topic: &str, partition: i32) -> Result<String>;

    async fn replicas_of(&self, topic: &str, partition: i32) -> Result<Vec<i32>>;

    async fn in_sync_replicas_of(&self, topic: &str, partition: i32) -> Result<Vec<i32>>;
}
