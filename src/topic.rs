//! Topic and partition records as they are written to the output.
use serde_derive::{Deserialize, Serialize};

/// Which optional details a [`Topic`] record carries.
///
/// `leaders` and `replicas` only have an effect together with `partitions`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetailFlags {
    pub partitions: bool,
    pub leaders: bool,
    pub replicas: bool,
}

impl DetailFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partitions(mut self, partitions: bool) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn leaders(mut self, leaders: bool) -> Self {
        self.leaders = leaders;
        self
    }

    pub fn replicas(mut self, replicas: bool) -> Self {
        self.replicas = replicas;
        self
    }
}

/// One topic of the cluster.
///
/// `partitions` is `None` when partition details were not requested, which
/// is different from a topic that reports no partitions at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<Vec<Partition>>,
}

impl Topic {
    /// A topic record without any partition details.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub id: i32,
    /// Low watermark.
    #[serde(rename = "oldest")]
    pub oldest_offset: i64,
    /// High watermark.
    #[serde(rename = "newest")]
    pub newest_offset: i64,
    /// Address of the leading broker, `host:port`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<Vec<i32>>,
    #[serde(default, rename = "isrs", skip_serializing_if = "Option::is_none")]
    pub in_sync_replicas: Option<Vec<i32>>,
}

impl Partition {
    pub fn new(id: i32, oldest_offset: i64, newest_offset: i64) -> Self {
        Self {
            id,
            oldest_offset,
            newest_offset,
            leader: None,
            replicas: None,
            in_sync_replicas: None,
        }
    }
}
