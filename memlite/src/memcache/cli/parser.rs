use byte_unit::Byte;
use clap::Parser;
use std::{fmt::Debug, net::IpAddr, ops::RangeInclusive};

const DEFAULT_PORT: u16 = 11211;
const DEFAULT_ADDRESS: IpAddr = IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
const LISTEN_BACKLOG: u32 = 1024;
const MAX_ITEM_SIZE: &str = "1MiB";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
/// memlited - memcached compatible in-memory cache server
pub struct MemliteConfig {
    #[arg(short, long, value_name = "PORT", value_parser = port_in_range, default_value_t = DEFAULT_PORT)]
    /// TCP port to listen on
    pub port: u16,

    #[arg(short, long, value_name = "ADDRESS", default_value_t = DEFAULT_ADDRESS)]
    /// interface to listen on
    pub listen: IpAddr,

    #[arg(short = 'b', long, value_name = "BACKLOG", default_value_t = LISTEN_BACKLOG)]
    /// set the backlog queue limit
    pub listen_backlog: u32,

    #[arg(short = 'n', long, value_name = "RECORDS")]
    /// evict the earliest inserted records above this many entries, 0 means no limit
    pub max_records: Option<usize>,

    #[arg(short = 'm', long, value_name = "MB")]
    /// evict the earliest inserted records while process memory is above this many megabytes, 0 means no limit
    pub max_size_mb: Option<u64>,

    #[arg(short = 'I', long, value_name = "ITEM-SIZE", value_parser = parse_item_size, default_value = MAX_ITEM_SIZE)]
    /// adjusts max item size (min: 1k, max: 1024m)
    pub max_item_size: u64,

    #[arg(short, long)]
    /// answer every request with ERROR, sheds load
    pub fast: bool,

    #[arg(short = 'D', long)]
    /// keep Nagle's algorithm enabled on client sockets
    pub delay: bool,

    #[arg(short, action = clap::ArgAction::Count)]
    /// sets the level of verbosity
    pub verbose: u8,
}

const PORT_RANGE: RangeInclusive<usize> = 1..=65535;
const ITEM_SIZE_RANGE: RangeInclusive<u64> = 1024..=1024 * 1024 * 1024;

fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` isn't a port number"))?;
    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

fn parse_item_size(s: &str) -> Result<u64, String> {
    let bytes = match Byte::parse_str(s, true) {
        Ok(bytes) => bytes.as_u64(),
        Err(byte_error) => return Err(format!("{}", byte_error)),
    };
    if ITEM_SIZE_RANGE.contains(&bytes) {
        Ok(bytes)
    } else {
        Err(format!(
            "item size not in range {}-{} bytes",
            ITEM_SIZE_RANGE.start(),
            ITEM_SIZE_RANGE.end()
        ))
    }
}

impl MemliteConfig {
    fn from_args(args: Vec<String>) -> Result<MemliteConfig, clap::Error> {
        let mut config = MemliteConfig::try_parse_from(args.iter())?;
        config.max_records = config.max_records.filter(|records| *records > 0);
        config.max_size_mb = config.max_size_mb.filter(|mb| *mb > 0);
        Ok(config)
    }
}

pub fn parse(args: Vec<String>) -> Result<MemliteConfig, clap::Error> {
    MemliteConfig::from_args(args)
}
