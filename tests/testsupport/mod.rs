use std::{collections::HashMap, env, time::Duration};

use async_trait::async_trait;
use kt::prelude::{
    ClusterClient, Diagnostics, Error, OffsetPosition, RecordSink, Result, Topic,
};
use parking_lot::Mutex;

const KAFKA_BROKERS: &str = "KAFKA_BROKERS";
const KAFKA_TOPIC: &str = "KAFKA_TOPIC";

#[allow(dead_code)]
pub fn get_brokers_and_topic() -> (bool, String, String) {
    let brokers = match env::var(KAFKA_BROKERS) {
        Ok(brokers) => brokers,
        Err(_) => {
            tracing::warn!("Skipping test because no {} is set", KAFKA_BROKERS);
            return (true, String::new(), String::new());
        }
    };
    let topic = match env::var(KAFKA_TOPIC) {
        Ok(topic) => topic,
        Err(_) => {
            tracing::warn!("Skipping test because no {} is set", KAFKA_TOPIC);
            return (true, String::new(), String::new());
        }
    };
    (false, brokers, topic)
}

/// One request made against a [`ScriptedCluster`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Partitions(String),
    Offset(String, i32, OffsetPosition),
    Leader(String, i32),
    Replicas(String, i32),
    InSyncReplicas(String, i32),
}

/// How a scripted topic answers.
#[derive(Clone, Debug, Default)]
pub struct Script {
    pub partitions: Vec<i32>,
    /// Time the partition listing takes.
    pub delay: Duration,
    pub fail_listing: bool,
    /// Partition whose leader lookup fails.
    pub fail_leader_of: Option<i32>,
}

impl Script {
    pub fn partitions(count: i32) -> Self {
        Self {
            partitions: (0..count).collect(),
            ..Self::default()
        }
    }

    pub fn delay_ms(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    #[allow(dead_code)]
    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    #[allow(dead_code)]
    pub fn fail_leader_of(mut self, partition: i32) -> Self {
        self.fail_leader_of = Some(partition);
        self
    }
}

/// In-memory cluster that records every call made to it.
///
/// Partition `p` reports offsets `10 * p ..= 10 * p + 5`, leader
/// `broker-{p % 3}:9092`, replicas `[1, 2, 3]` and in-sync replicas `[1, 2]`.
#[derive(Debug, Default)]
pub struct ScriptedCluster {
    topics: HashMap<String, Script>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl ScriptedCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(mut self, name: &str, script: Script) -> Self {
        self.topics.insert(name.to_owned(), script);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn script(&self, topic: &str) -> Result<&Script> {
        self.topics
            .get(topic)
            .ok_or_else(|| Error::UnknownTopic(topic.to_owned()))
    }
}

#[async_trait]
impl ClusterClient for ScriptedCluster {
    async fn list_topics(&self) -> Result<Vec<String>> {
        let mut names = self.topics.keys().cloned().collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    async fn partitions_of(&self, topic: &str) -> Result<Vec<i32>> {
        self.record(Call::Partitions(topic.to_owned()));
        let script = self.script(topic)?;
        tokio::time::sleep(script.delay).await;

        if script.fail_listing {
            return Err(Error::Metadata {
                topic: topic.to_owned(),
                reason: String::from("listing partitions failed"),
            });
        }
        Ok(script.partitions.clone())
    }

    async fn get_offset(
        &self,
        topic: &str,
        partition: i32,
        which: OffsetPosition,
    ) -> Result<i64> {
        self.record(Call::Offset(topic.to_owned(), partition, which));
        let base = i64::from(partition) * 10;
        Ok(match which {
            OffsetPosition::Oldest => base,
            OffsetPosition::Newest => base + 5,
        })
    }

    async fn leader_of(&self, topic: &str, partition: i32) -> Result<String> {
        self.record(Call::Leader(topic.to_owned(), partition));
        if self.script(topic)?.fail_leader_of == Some(partition) {
            return Err(Error::LeaderNotAvailable {
                topic: topic.to_owned(),
                partition,
            });
        }
        Ok(format!("broker-{}:9092", partition % 3))
    }

    async fn replicas_of(&self, topic: &str, partition: i32) -> Result<Vec<i32>> {
        self.record(Call::Replicas(topic.to_owned(), partition));
        Ok(vec![1, 2, 3])
    }

    async fn in_sync_replicas_of(&self, topic: &str, partition: i32) -> Result<Vec<i32>> {
        self.record(Call::InSyncReplicas(topic.to_owned(), partition));
        Ok(vec![1, 2])
    }
}

/// Keeps every record it is handed.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<Topic>,
    pub finished: bool,
    /// Topic whose write fails.
    pub fail_on: Option<String>,
}

#[allow(dead_code)]
impl CollectingSink {
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|t| t.name.clone()).collect()
    }
}

#[async_trait]
impl RecordSink for CollectingSink {
    async fn emit(&mut self, topic: &Topic) -> Result<()> {
        assert!(!self.finished, "record after finish");
        if self.fail_on.as_deref() == Some(topic.name.as_str()) {
            return Err(Error::Output(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "closed",
            )));
        }
        self.records.push(topic.clone());
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Keeps `(topic, error message)` for every reported failure.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    failures: Mutex<Vec<(String, String)>>,
}

#[allow(dead_code)]
impl CollectingDiagnostics {
    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().clone()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn topic_failed(&self, topic: &str, error: &Error) {
        self.failures
            .lock()
            .push((topic.to_owned(), error.to_string()));
    }
}
