use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use lpgctl::commands::{self, Command};
use lpgctl::config::{OciConfig, DEFAULT_PROFILE};
use lpgctl::peering::{PeeringInputs, PollPolicy};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Peer Oracle Cloud VCNs through Local Peering Gateways
#[derive(Parser, Debug)]
#[command(name = "lpgctl", version, about, long_about = None)]
struct Cli {
    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Peer two VCNs of the same tenancy
    #[command(name = "peer_intra_tenant")]
    PeerIntraTenant(IntraTenantArgs),

    /// Peer VCNs of two tenancies, filling omitted identifiers from inventory
    #[command(name = "peer_inter_tenant")]
    PeerInterTenant(InterTenantArgs),

    /// List VCNs of the tenancy
    #[command(name = "list_vcn")]
    ListVcn(ProfileArgs),

    /// List groups of the tenancy
    #[command(name = "list_group")]
    ListGroup(ProfileArgs),

    /// List route tables of the tenancy
    #[command(name = "list_route_table")]
    ListRouteTable {
        #[command(flatten)]
        profile: ProfileArgs,

        /// Only list route tables of this VCN
        #[arg(long, value_name = "OCID")]
        vcn_ocid: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ApiConfigArgs {
    /// OCI API config file path
    #[arg(long, value_name = "FILE", default_value_os_t = OciConfig::default_path())]
    api_config_file: PathBuf,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[command(flatten)]
    api_config: ApiConfigArgs,

    /// Profile in the config file
    #[arg(long, default_value = DEFAULT_PROFILE)]
    profile: String,
}

#[derive(Args, Debug)]
struct PollArgs {
    /// Seconds between checks for the acceptor's LPG
    #[arg(long, default_value_t = 1)]
    poll_interval_secs: u64,

    /// Checks for the acceptor's LPG before giving up
    #[arg(long, default_value_t = 120)]
    poll_max_attempts: u32,
}

impl PollArgs {
    fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.poll_max_attempts,
        }
    }
}

#[derive(Args, Debug)]
struct IntraTenantArgs {
    #[command(flatten)]
    profile: ProfileArgs,

    /// VCN OCID of requestor
    #[arg(long, value_name = "OCID")]
    requestor_vcn_ocid: String,

    /// VCN OCID of acceptor
    #[arg(long, value_name = "OCID")]
    acceptor_vcn_ocid: String,

    /// Group OCID of requestor
    #[arg(long, value_name = "OCID")]
    requestor_group_ocid: String,

    /// Route Table OCID of requestor to register LPG
    #[arg(long, value_name = "OCID")]
    requestor_route_table_ocid: String,

    /// Route Table OCID of acceptor to register LPG
    #[arg(long, value_name = "OCID")]
    acceptor_route_table_ocid: String,

    /// CIDR of requestor to add to acceptor's Route Table
    #[arg(long)]
    requestor_cidr: String,

    /// CIDR of acceptor to add to requestor's Route Table
    #[arg(long)]
    acceptor_cidr: String,

    #[command(flatten)]
    poll: PollArgs,
}

#[derive(Args, Debug)]
struct InterTenantArgs {
    #[command(flatten)]
    api_config: ApiConfigArgs,

    /// Profile of the requestor tenancy
    #[arg(long)]
    requestor_profile: String,

    /// Profile of the acceptor tenancy
    #[arg(long)]
    acceptor_profile: String,

    /// VCN OCID of requestor
    #[arg(long, value_name = "OCID")]
    requestor_vcn_ocid: Option<String>,

    /// VCN OCID of acceptor
    #[arg(long, value_name = "OCID")]
    acceptor_vcn_ocid: Option<String>,

    /// Group OCID of requestor
    #[arg(long, value_name = "OCID")]
    requestor_group_ocid: Option<String>,

    /// Route Table OCID of requestor to register LPG
    #[arg(long, value_name = "OCID")]
    requestor_route_table_ocid: Option<String>,

    /// Route Table OCID of acceptor to register LPG
    #[arg(long, value_name = "OCID")]
    acceptor_route_table_ocid: Option<String>,

    /// CIDR of requestor to add to acceptor's Route Table
    #[arg(long)]
    requestor_cidr: Option<String>,

    /// CIDR of acceptor to add to requestor's Route Table
    #[arg(long)]
    acceptor_cidr: Option<String>,

    #[command(flatten)]
    poll: PollArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let (writer, guard, ansi) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (writer, guard, false)
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (writer, guard, true)
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .init();

    tracing::debug!("lpgctl {} started", env!("CARGO_PKG_VERSION"));

    Ok(guard)
}

fn load_profile(path: &Path, profile: &str) -> Result<OciConfig> {
    OciConfig::from_file(path, profile)
        .with_context(|| format!("Failed to load profile {} from {:?}", profile, path))
}

fn build_command(command: Commands) -> Result<Command> {
    let command = match command {
        Commands::PeerIntraTenant(args) => Command::PeerIntraTenant {
            config: load_profile(&args.profile.api_config.api_config_file, &args.profile.profile)?,
            inputs: PeeringInputs {
                requestor_vcn: Some(args.requestor_vcn_ocid),
                acceptor_vcn: Some(args.acceptor_vcn_ocid),
                requestor_group: Some(args.requestor_group_ocid),
                requestor_route_table: Some(args.requestor_route_table_ocid),
                acceptor_route_table: Some(args.acceptor_route_table_ocid),
                requestor_cidr: Some(args.requestor_cidr),
                acceptor_cidr: Some(args.acceptor_cidr),
            },
            poll: args.poll.policy(),
        },
        Commands::PeerInterTenant(args) => Command::PeerInterTenant {
            requestor: load_profile(&args.api_config.api_config_file, &args.requestor_profile)?,
            acceptor: load_profile(&args.api_config.api_config_file, &args.acceptor_profile)?,
            inputs: PeeringInputs {
                requestor_vcn: args.requestor_vcn_ocid,
                acceptor_vcn: args.acceptor_vcn_ocid,
                requestor_group: args.requestor_group_ocid,
                requestor_route_table: args.requestor_route_table_ocid,
                acceptor_route_table: args.acceptor_route_table_ocid,
                requestor_cidr: args.requestor_cidr,
                acceptor_cidr: args.acceptor_cidr,
            },
            poll: args.poll.policy(),
        },
        Commands::ListVcn(args) => Command::ListVcns {
            config: load_profile(&args.api_config.api_config_file, &args.profile)?,
        },
        Commands::ListGroup(args) => Command::ListGroups {
            config: load_profile(&args.api_config.api_config_file, &args.profile)?,
        },
        Commands::ListRouteTable { profile, vcn_ocid } => Command::ListRouteTables {
            config: load_profile(&profile.api_config.api_config_file, &profile.profile)?,
            vcn_id: vcn_ocid,
        },
    };
    Ok(command)
}

async fn run(cli: Cli) -> Result<()> {
    let command = build_command(cli.command)?;
    let mut stdout = std::io::stdout();
    commands::execute(command, &mut stdout).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match setup_logging(cli.log_level, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
