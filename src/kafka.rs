//! [`ClusterClient`] on top of librdkafka.
//!
//! librdkafka calls block, so every lookup runs on tokio's blocking pool.
//! Topic metadata is fetched once per topic and kept for the lifetime of
//! the client; offsets are always asked for fresh.
use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use rdkafka::{
    consumer::{BaseConsumer, Consumer},
    error::RDKafkaErrorCode,
    metadata::Metadata,
};
use tracing::instrument;

use crate::{
    cluster::{ClusterClient, OffsetPosition},
    config::ConnectionConfig,
    error::{Error, Result},
};

/// Partition layout of one topic at the time it was looked up.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicSnapshot {
    pub name: String,
    pub partitions: Vec<PartitionSnapshot>,
    /// Broker id to `host:port`.
    pub brokers: HashMap<i32, String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartitionSnapshot {
    pub id: i32,
    /// Broker id of the leader, negative while there is none.
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

impl TopicSnapshot {
    fn from_metadata(metadata: &Metadata, name: &str) -> Result<Self> {
        let topic = metadata
            .topics()
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::UnknownTopic(name.to_owned()))?;

        if let Some(err) = topic.error() {
            let code = RDKafkaErrorCode::from(err);
            if code == RDKafkaErrorCode::UnknownTopicOrPartition {
                return Err(Error::UnknownTopic(name.to_owned()));
            }
            return Err(Error::Metadata {
                topic: name.to_owned(),
                reason: code.to_string(),
            });
        }

        let mut partitions = topic
            .partitions()
            .iter()
            .map(|p| PartitionSnapshot {
                id: p.id(),
                leader: p.leader(),
                replicas: p.replicas().to_vec(),
                isr: p.isr().to_vec(),
            })
            .collect::<Vec<_>>();
        partitions.sort_by_key(|p| p.id);

        let brokers = metadata
            .brokers()
            .iter()
            .map(|b| (b.id(), format!("{}:{}", b.host(), b.port())))
            .collect();

        Ok(Self {
            name: name.to_owned(),
            partitions,
            brokers,
        })
    }

    pub fn partition_ids(&self) -> Vec<i32> {
        self.partitions.iter().map(|p| p.id).collect()
    }

    pub fn partition(&self, id: i32) -> Result<&PartitionSnapshot> {
        self.partitions
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::UnknownPartition {
                topic: self.name.clone(),
                partition: id,
            })
    }

    /// `host:port` of the broker leading partition `id`.
    pub fn leader_addr(&self, id: i32) -> Result<String> {
        let partition = self.partition(id)?;
        if partition.leader < 0 {
            return Err(Error::LeaderNotAvailable {
                topic: self.name.clone(),
                partition: id,
            });
        }

        self.brokers
            .get(&partition.leader)
            .cloned()
            .ok_or(Error::UnknownBroker(partition.leader))
    }
}

/// Cluster access through a librdkafka consumer that never subscribes.
pub struct KafkaCluster {
    consumer: Arc<BaseConsumer>,
    timeout: Duration,
    topics: Mutex<HashMap<String, Arc<TopicSnapshot>>>,
}

impl std::fmt::Debug for KafkaCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaCluster")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl KafkaCluster {
    /// Create the client. No request is sent until the first lookup.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        tracing::info!("Connecting to cluster at {}", config.brokers.join(","));
        let consumer: BaseConsumer = config
            .client_config()
            .create()
            .map_err(|err| Error::Connection(err.to_string()))?;

        Ok(Self {
            consumer: Arc::new(consumer),
            timeout: config.timeout,
            topics: Mutex::new(HashMap::new()),
        })
    }

    async fn blocking<T, F>(&self, lookup: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&BaseConsumer, Duration) -> Result<T> + Send + 'static,
    {
        let consumer = Arc::clone(&self.consumer);
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || lookup(consumer.as_ref(), timeout))
            .await
            .map_err(|err| Error::Connection(format!("lookup was interrupted: {}", err)))?
    }

    #[instrument(level = "debug", skip(self))]
    async fn describe(&self, topic: &str) -> Result<Arc<TopicSnapshot>> {
        let cached = self.topics.lock().get(topic).cloned();
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }

        let name = topic.to_owned();
        let snapshot = self
            .blocking(move |consumer, timeout| {
                let metadata = consumer
                    .fetch_metadata(Some(name.as_str()), timeout)
                    .map_err(|err| Error::Metadata {
                        topic: name.clone(),
                        reason: err.to_string(),
                    })?;
                TopicSnapshot::from_metadata(&metadata, &name)
            })
            .await?;

        let snapshot = Arc::new(snapshot);
        self.topics
            .lock()
            .insert(topic.to_owned(), Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

#[async_trait]
impl ClusterClient for KafkaCluster {
    #[instrument(level = "debug", skip(self))]
    async fn list_topics(&self) -> Result<Vec<String>> {
        self.blocking(|consumer, timeout| {
            let metadata = consumer
                .fetch_metadata(None, timeout)
                .map_err(|err| Error::Connection(err.to_string()))?;

            let mut names = metadata
                .topics()
                .iter()
                .map(|t| t.name().to_owned())
                .collect::<Vec<_>>();
            names.sort();
            Ok(names)
        })
        .await
    }

    async fn partitions_of(&self, topic: &str) -> Result<Vec<i32>> {
        Ok(self.describe(topic).await?.partition_ids())
    }

    async fn get_offset(
        &self,
        topic: &str,
        partition: i32,
        which: OffsetPosition,
    ) -> Result<i64> {
        let name = topic.to_owned();
        let (low, high) = self
            .blocking(move |consumer, timeout| {
                consumer
                    .fetch_watermarks(&name, partition, timeout)
                    .map_err(|err| Error::Metadata {
                        topic: name.clone(),
                        reason: format!("partition {}: {}", partition, err),
                    })
            })
            .await?;

        Ok(match which {
            OffsetPosition::Oldest => low,
            OffsetPosition::Newest => high,
        })
    }

    async fn leader_of(&self, topic: &str, partition: i32) -> Result<String> {
        self.describe(topic).await?.leader_addr(partition)
    }

    async fn replicas_of(&self, topic: &str, partition: i32) -> Result<Vec<i32>> {
        Ok(self.describe(topic).await?.partition(partition)?.replicas.clone())
    }

    async fn in_sync_replicas_of(&self, topic: &str, partition: i32) -> Result<Vec<i32>> {
        Ok(self.describe(topic).await?.partition(partition)?.isr.clone())
    }
}
