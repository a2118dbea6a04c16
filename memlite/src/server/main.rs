use crate::memcache;
use crate::memcache_server;
use crate::server::timer;
use log::info;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing_log::LogTracer;
extern crate clap;

fn get_log_level(verbose: u8) -> tracing::Level {
    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'myprog -v -v -v' or 'myprog -vvv' vs 'myprog -v'
    match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

pub fn run(args: Vec<String>) {
    let cli_config = match memcache::cli::parser::parse(args) {
        Ok(config) => config,
        Err(err) => {
            if !err.use_stderr() {
                // --help and --version
                err.exit();
            }
            eprint!("{}", err);
            process::exit(1);
        }
    };

    if let Err(err) = LogTracer::init() {
        eprintln!("Cannot initialize logger: {}", err);
        process::exit(1);
    }
    tracing_subscriber::fmt()
        .with_max_level(get_log_level(cli_config.verbose))
        .init();

    info!("Listen address: {}", cli_config.listen);
    info!("Listen port: {}", cli_config.port);
    info!("Listen backlog: {}", cli_config.listen_backlog);
    info!("Max records: {:?}", cli_config.max_records);
    info!("Max size: {:?} MB", cli_config.max_size_mb);
    info!(
        "Max item size: {}",
        byte_unit::Byte::from_u64(cli_config.max_item_size)
            .get_appropriate_unit(byte_unit::UnitType::Binary)
    );
    info!("Fast mode: {}", cli_config.fast);
    info!("TCP_NODELAY: {}", !cli_config.delay);

    let runtime = match memcache_server::runtime_builder::create_current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Cannot create runtime: {}", err);
            process::exit(1);
        }
    };

    let system_timer: Arc<timer::SystemTimer> = Arc::new(timer::SystemTimer::new());
    let addr = SocketAddr::new(cli_config.listen, cli_config.port);
    let result = runtime.block_on(async move {
        let mut server =
            memcache_server::runtime_builder::create_memlite_server(&cli_config, system_timer);
        server.start(addr).await?;
        signal::ctrl_c().await?;
        info!("Shutting down");
        server.stop().await;
        Ok::<(), std::io::Error>(())
    });

    if let Err(err) = result {
        eprintln!("Server error: {}", err);
        process::exit(1);
    }
}
