//! Error types shared by the pipeline, the cluster client and the CLI.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The cluster could not be reached or the topic listing failed.
    #[error("failed to reach cluster: {0}")]
    Connection(String),

    #[error("failed to read metadata for topic {topic}: {reason}")]
    Metadata { topic: String, reason: String },

    #[error("topic {0} does not exist")]
    UnknownTopic(String),

    #[error("partition {partition} does not exist for topic {topic}")]
    UnknownPartition { topic: String, partition: i32 },

    #[error("no leader available for topic {topic} partition {partition}")]
    LeaderNotAvailable { topic: String, partition: i32 },

    #[error("broker {0} is not part of the cluster metadata")]
    UnknownBroker(i32),

    #[error("failed to write record: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The serializer went away before acknowledging a submission.
    #[error("record serializer stopped before the record was written")]
    SerializerClosed,

    #[error("invalid topic filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Errors that only concern a single topic and never abort the run.
    pub fn is_per_topic(&self) -> bool {
        matches!(
            self,
            Error::Metadata { .. }
                | Error::UnknownTopic(_)
                | Error::UnknownPartition { .. }
                | Error::LeaderNotAvailable { .. }
                | Error::UnknownBroker(_)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_per_topic_family() {
        assert!(Error::UnknownTopic("purchases".to_string()).is_per_topic());
        assert!(Error::LeaderNotAvailable {
            topic: "purchases".to_string(),
            partition: 3
        }
        .is_per_topic());
        assert!(!Error::Connection("refused".to_string()).is_per_topic());
        assert!(!Error::SerializerClosed.is_per_topic());
    }

    #[test]
    fn test_messages_name_the_topic() {
        let err = Error::Metadata {
            topic: String::from("purchases"),
            reason: String::from("timed out"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read metadata for topic purchases: timed out"
        );
    }
}
