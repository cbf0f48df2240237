mod cli;
mod config;
mod logging;
mod utils;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use cli::{rest, stream, ColorMode};
use utils::errors::{configure_color, error_chain};

#[derive(
    Parser, Default, Clone, Copy, ValueEnum, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum RequestedColorMode {
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Parser)]
#[command(name = "shodanx")]
#[command(
    about = "Query the Shodan REST, streaming and exploits APIs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Read the configuration from this file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = RequestedColorMode::default())]
    color: RequestedColorMode,
    /// Log requests to stderr, twice for more detail
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show plan and credit information for the API key
    Info,
    /// Show everything known about a host
    Host(HostArgs),
    /// Search for hosts
    Search(SearchArgs),
    /// Count search results without consuming query credits
    Count(CountArgs),
    /// Show the public address of this machine
    Myip,
    /// List the ports the crawlers look at
    Ports(FormatArgs),
    /// List the protocols available for on-demand scans
    Protocols(FormatArgs),
    /// Print banners from the real-time stream, one JSON document per line
    Stream(StreamArgs),
    /// Search the exploit database
    Exploits(ExploitsArgs),
    /// Call an arbitrary REST endpoint
    Get(GetArgs),
}

/// Output formats
#[derive(
    Parser, ValueEnum, Default, Clone, Copy, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ListingFormat {
    /// Format the output as a table
    #[default]
    Table,
    /// Format the output as JSON
    Json,
    /// Format the output as a table without a header
    HeaderlessTable,
}

#[derive(Parser)]
pub(crate) struct FormatArgs {
    /// Output the listing with the specified format
    #[arg(short, long, default_value_t = ListingFormat::default())]
    format: ListingFormat,
}

#[derive(Parser)]
pub(crate) struct HostArgs {
    ip: String,
    /// Include historical banners
    #[arg(long)]
    history: bool,
    /// Only return the list of ports and general host information
    #[arg(long)]
    minify: bool,
}

#[derive(Parser)]
pub(crate) struct SearchArgs {
    /// Search query, e.g. `nginx country:DE`
    #[arg(required = true)]
    query: Vec<String>,
    /// Summarize results by a facet, as `name` or `name:size`
    #[arg(long = "facet")]
    facets: Vec<String>,
    #[arg(long)]
    page: Option<u32>,
    #[command(flatten)]
    output: FormatArgs,
}

#[derive(Parser)]
pub(crate) struct CountArgs {
    #[arg(required = true)]
    query: Vec<String>,
    #[arg(long = "facet")]
    facets: Vec<String>,
}

#[derive(Parser)]
pub(crate) struct StreamArgs {
    #[command(subcommand)]
    source: StreamSource,
}

#[derive(Subcommand)]
pub(crate) enum StreamSource {
    /// All banners, or those matching one filter
    Banners(BannerArgs),
    /// Banners matching the key's network alerts
    Alerts(AlertArgs),
}

#[derive(Parser)]
pub(crate) struct BannerArgs {
    /// Stop after this many banners
    #[arg(short, long)]
    limit: Option<usize>,
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["countries", "asns"])]
    ports: Vec<u16>,
    /// Two letter country codes
    #[arg(long, value_delimiter = ',', conflicts_with = "asns")]
    countries: Vec<String>,
    /// Autonomous systems, e.g. AS15169
    #[arg(long, value_delimiter = ',')]
    asns: Vec<String>,
}

#[derive(Parser)]
pub(crate) struct AlertArgs {
    /// Stop after this many banners
    #[arg(short, long)]
    limit: Option<usize>,
    /// Only this alert
    #[arg(long)]
    id: Option<String>,
}

#[derive(Parser)]
pub(crate) struct ExploitsArgs {
    #[arg(required = true)]
    query: Vec<String>,
    #[arg(long = "facet")]
    facets: Vec<String>,
    #[arg(long)]
    page: Option<u32>,
    #[command(flatten)]
    output: FormatArgs,
}

#[derive(Parser)]
pub(crate) struct GetArgs {
    /// Endpoint path, e.g. /shodan/host/8.8.8.8
    path: String,
    /// Query parameters as name=value
    #[arg(value_parser = rest::parse_param)]
    params: Vec<(String, String)>,
    /// Send a POST with the parameters form-encoded in the body
    #[arg(long)]
    post: bool,
}

fn main() {
    let cli = Cli::parse();

    configure_color(ColorMode::resolve_auto(cli.color));

    logging::init_tracing(cli.verbose);

    let config = match config::read_config(cli.config) {
        Ok(config) => config,
        Err(err) => die!("{}", error_chain(&err)),
    };

    match &cli.command {
        Commands::Info => rest::info_cmd(&config),
        Commands::Host(args) => rest::host_cmd(&config, args),
        Commands::Search(args) => rest::search_cmd(&config, args),
        Commands::Count(args) => rest::count_cmd(&config, args),
        Commands::Myip => rest::myip_cmd(&config),
        Commands::Ports(args) => rest::ports_cmd(&config, args),
        Commands::Protocols(args) => rest::protocols_cmd(&config, args),
        Commands::Stream(args) => stream::stream_cmd(&config, args),
        Commands::Exploits(args) => rest::exploits_cmd(&config, args),
        Commands::Get(args) => rest::get_cmd(&config, args),
    }
}
