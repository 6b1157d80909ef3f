//! Connection settings and the small bits of input massaging around them.
use std::{env, path::PathBuf, time::Duration};

use rdkafka::ClientConfig;
use regex::Regex;

use crate::error::{Error, Result};

pub const DEFAULT_BROKERS: &str = "localhost:9092";
pub const DEFAULT_PORT: u16 = 9092;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const BROKERS_ENV: &str = "KT_BROKERS";

const CLIENT_ID_PREFIX: &str = "kt-topic-";
const DEFAULT_BROKER_VERSION: &str = "0.10.0.0";

/// Everything needed to reach a cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionConfig {
    /// Bootstrap brokers, each `host:port`.
    pub brokers: Vec<String>,
    pub client_id: String,
    /// Protocol version of the brokers, e.g. `v0.9.0.1`.
    pub version: Option<String>,
    pub tls: bool,
    /// PEM file holding both the client certificate and its key.
    pub client_cert: Option<PathBuf>,
    /// Upper bound for a single metadata or offset request.
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Settings for the comma separated `brokers` list.
    pub fn new(brokers: &str) -> Result<Self> {
        let brokers = normalize_brokers(brokers);
        if brokers.is_empty() {
            return Err(Error::InvalidConfig(String::from("no brokers given")));
        }

        Ok(Self {
            brokers,
            client_id: default_client_id(),
            version: None,
            tls: false,
            client_cert: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        })
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn client_cert(mut self, client_cert: Option<PathBuf>) -> Self {
        self.client_cert = client_cert;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// librdkafka configuration for these settings.
    pub fn client_config(&self) -> ClientConfig {
        let fallback = broker_version_fallback(self.version.as_deref());

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.brokers.join(","))
            .set("client.id", &self.client_id)
            .set("broker.version.fallback", fallback)
            .set("socket.timeout.ms", self.timeout.as_millis().to_string());

        // brokers older than 0.10 cannot answer ApiVersions requests
        if fallback != DEFAULT_BROKER_VERSION {
            config.set("api.version.request", "false");
        }

        if self.tls {
            config.set("security.protocol", "ssl");
        }

        if let Some(cert) = &self.client_cert {
            let path = cert.to_string_lossy().into_owned();
            config
                .set("ssl.certificate.location", &path)
                .set("ssl.key.location", &path)
                .set("enable.ssl.certificate.verification", "false");
        }

        config
    }
}

/// Split a comma separated broker list, adding the default port where
/// none is given.
pub fn normalize_brokers(brokers: &str) -> Vec<String> {
    brokers
        .split(',')
        .map(str::trim)
        .filter(|broker| !broker.is_empty())
        .map(|broker| {
            if broker.contains(':') {
                broker.to_owned()
            } else {
                format!("{}:{}", broker, DEFAULT_PORT)
            }
        })
        .collect()
}

/// Reduce a login name to the characters allowed in a client id.
///
/// Windows logins like `DOMAIN\user` keep only the part after the last
/// backslash.
pub fn sanitize_username(username: &str) -> String {
    let user = username.rsplit('\\').next().unwrap_or_default();
    user.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// `kt-topic-<user>` for the current login.
pub fn default_client_id() -> String {
    let username = env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_default();
    format!("{}{}", CLIENT_ID_PREFIX, sanitize_username(&username))
}

/// The `broker.version.fallback` matching a `--version` flag.
///
/// Anything that is not one of the known pre 0.10 versions is treated as
/// 0.10.0.0.
pub fn broker_version_fallback(version: Option<&str>) -> &'static str {
    match version {
        Some("v0.8.2.0") => "0.8.2.0",
        Some("v0.8.2.1") => "0.8.2.1",
        Some("v0.8.2.2") => "0.8.2.2",
        Some("v0.9.0.0") => "0.9.0.0",
        Some("v0.9.0.1") => "0.9.0.1",
        _ => DEFAULT_BROKER_VERSION,
    }
}

/// Compile a topic name filter. The empty pattern matches every topic.
pub fn compile_filter(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(pattern)?)
}
