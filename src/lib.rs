//! # kt
//! Inspect the topics of a Kafka/Redpanda cluster.
//!
//! This crate backs the `kt` command line tool. It lists the topics of a
//! cluster and, when asked, the offsets, leaders and replicas of every
//! partition. Topics are looked up concurrently and written out as JSON
//! the moment their metadata is complete.
//!
//! It also answers which partition a JVM producer would route a key to,
//! byte for byte compatible with `String#hashCode`.
//!
//! ## Table of contents
//! - [Getting started](#getting-started)
//!     - [Listing topics](#listing-topics)
//!     - [Partition for a key](#partition-for-a-key)
//! - [Resources](#resources)
//!
//! ## Getting started
//!
//! ```text
//! $ kt topic --brokers localhost:9092 --partitions --leaders --filter '^purchases'
//! {
//!   "name": "purchases",
//!   "partitions": [
//!     { "id": 0, "oldest": 0, "newest": 1200, "leader": "localhost:9092" },
//!     ...
//!   ]
//! }
//! ```
//!
//! ### Listing topics
//! The [`gather_and_emit`](prelude::gather_and_emit) pipeline takes any
//! [`ClusterClient`](prelude::ClusterClient), fans out one task per topic and
//! funnels the finished records through a single writer into a
//! [`RecordSink`](prelude::RecordSink).
//! ```rust,no_run
//! use std::sync::Arc;
//! use kt::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let config = ConnectionConfig::new("localhost:9092")?;
//! let client = Arc::new(KafkaCluster::connect(&config)?);
//!
//! let topics = select_topics(client.list_topics().await?, &compile_filter("^purchases")?);
//! let flags = DetailFlags::new().partitions(true).leaders(true);
//! let mut sink = JsonSink::new(tokio::io::stdout()).pretty(true);
//!
//! let summary = gather_and_emit(topics, flags, client, &mut sink, &LogDiagnostics).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Partition for a key
//! ```rust
//! use kt::prelude::partition_for;
//!
//! assert_eq!(partition_for("hello", 12), 10);
//! assert_eq!(partition_for("hello", 0), -1);
//! ```
//!
//! ## Resources
//! - [Kafka Protocol Spec](https://kafka.apache.org/protocol.html)
//! - [librdkafka configuration](https://github.com/confluentinc/librdkafka/blob/master/CONFIGURATION.md)

mod cluster;
mod config;
mod error;
mod kafka;
mod partitioner;
mod pipeline;
mod sink;
mod topic;

pub mod prelude {
    //! Main export of various structures and methods
    //!
    //! The crate splits into three parts:
    //! - [Records](#records)
    //! - [Gathering](#gathering)
    //! - [Partitioning](#partitioning)
    //!
    //! # Records
    //! A [`Topic`] carries its name and, if requested through [`DetailFlags`],
    //! one [`Partition`] per partition. Optional details that were not
    //! requested are left out of the JSON output entirely.
    //!
    //! # Gathering
    //! [`gather_and_emit`] drives a [`ClusterClient`] for many topics at once.
    //! Finished records go to a [`RecordSink`] such as [`JsonSink`]; topics
    //! that fail go to [`Diagnostics`] and are counted in the [`Summary`].
    //!
    //! [`KafkaCluster`] is the [`ClusterClient`] for real clusters, set up
    //! from a [`ConnectionConfig`].
    //!
    //! # Partitioning
    //! [`partition_for`] picks a partition for a key like the JVM default
    //! partitioner does, built on [`hash_code`] and [`java_abs`].
    pub use crate::cluster::{ClusterClient, OffsetPosition};
    pub use crate::config::{
        broker_version_fallback, compile_filter, default_client_id, normalize_brokers,
        sanitize_username, ConnectionConfig, BROKERS_ENV, DEFAULT_BROKERS, DEFAULT_PORT,
        DEFAULT_TIMEOUT_MS,
    };
    pub use crate::error::{Error, Result};
    pub use crate::kafka::{KafkaCluster, PartitionSnapshot, TopicSnapshot};
    pub use crate::partitioner::{hash_code, java_abs, partition_for, NO_PARTITION};
    pub use crate::pipeline::{gather_and_emit, read_topic, select_topics, Summary};
    pub use crate::sink::{Diagnostics, JsonSink, Layout, LogDiagnostics, RecordSink};
    pub use crate::topic::{DetailFlags, Partition, Topic};
}
