use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::{ArgAction, Args, Parser, Subcommand};
use kt::prelude::*;
use tracing::Level;

#[derive(Parser)]
#[command(name = "kt")]
#[command(about = "Kafka command line tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Information about topics
    Topic(TopicArgs),
    /// Partition a key would be produced to by the default JVM partitioner
    Partition(PartitionArgs),
}

#[derive(Args)]
struct TopicArgs {
    /// Comma separated list of brokers. Port defaults to 9092 when omitted.
    #[arg(long, env = BROKERS_ENV, default_value = DEFAULT_BROKERS)]
    brokers: String,

    /// Regex to filter topics by name.
    #[arg(long, default_value = "")]
    filter: String,

    /// Include information per partition.
    #[arg(long)]
    partitions: bool,

    /// Include leader information per partition.
    #[arg(long)]
    leaders: bool,

    /// Include replica ids per partition.
    #[arg(long)]
    replicas: bool,

    /// Control output pretty printing.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pretty: bool,

    /// Write all topics as one JSON array instead of one document each.
    #[arg(long)]
    array: bool,

    /// More verbose logging to stderr.
    #[arg(long)]
    verbose: bool,

    /// Kafka protocol version, e.g. v0.9.0.1
    #[arg(long)]
    version: Option<String>,

    /// Enable TLS
    #[arg(long)]
    tls: bool,

    /// Path to client certificate
    #[arg(long)]
    client_cert: Option<PathBuf>,

    /// Timeout for a single metadata or offset request.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
}

#[derive(Args)]
struct PartitionArgs {
    /// Message key
    #[arg(long)]
    key: String,

    /// Number of partitions of the topic
    #[arg(long, allow_hyphen_values = true)]
    partitions: i32,
}

#[tokio::main]
async fn main() -> ExitCode {
    // a missing .env is fine, flags and the environment still apply
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Topic(args) => run_topic(args).await,
        Commands::Partition(args) => {
            println!("{}", partition_for(&args.key, args.partitions));
            ExitCode::SUCCESS
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        // Records go to stdout, everything else to stderr
        .with_writer(std::io::stderr)
        // Don't display the event's target (module path)
        .with_target(false)
        .init();
}

async fn run_topic(args: TopicArgs) -> ExitCode {
    init_tracing(args.verbose);

    match topic(args).await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            tracing::warn!(
                "Failed to read {} of {} topics",
                summary.errors,
                summary.errors + summary.emitted
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn topic(args: TopicArgs) -> Result<Summary> {
    let filter = compile_filter(&args.filter)?;
    let config = ConnectionConfig::new(&args.brokers)?
        .version(args.version)
        .tls(args.tls)
        .client_cert(args.client_cert)
        .timeout(Duration::from_millis(args.timeout_ms));
    tracing::debug!("Client configuration {:?}", config.client_config());

    let client = Arc::new(KafkaCluster::connect(&config)?);
    let topics = select_topics(client.list_topics().await?, &filter);

    let flags = DetailFlags::new()
        .partitions(args.partitions)
        .leaders(args.leaders)
        .replicas(args.replicas);
    let layout = if args.array {
        Layout::Array
    } else {
        Layout::Lines
    };
    let mut sink = JsonSink::new(tokio::io::stdout())
        .pretty(args.pretty)
        .layout(layout);

    gather_and_emit(topics, flags, client, &mut sink, &LogDiagnostics).await
}
