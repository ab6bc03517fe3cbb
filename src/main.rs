use backtrace::Backtrace;
use clap::{value_parser, Arg, ArgAction, Command};
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;

use std::path::PathBuf;
use std::sync::Arc;

mod api;
mod config;
mod model;
mod source;
mod views;
mod window;

use api::Api;
use config::Config;
use source::FileStore;

fn main() {
    // custom panic hook to terminate whole process after unwinding
    std::panic::set_hook(Box::new(|s| {
        eprintln!("{s}");
        eprintln!("{:?}", Backtrace::new());
        std::process::exit(101);
    }));

    // parse command line options
    let matches = Command::new(env!("CARGO_BIN_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_about(
            "Vantage serves CPU dashboards for applications and nodes, assembled \
            from a cached window of metrics and the topology of each project.",
        )
        .arg(
            Arg::new("CONFIG")
                .help("Vantage configuration file")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("VERBOSE")
                .long("verbose")
                .short('v')
                .help("Increase the log verbosity, can be repeated")
                .action(ArgAction::Count),
        )
        .get_matches();

    // load config from file
    let config = {
        let file = matches
            .get_one::<PathBuf>("CONFIG")
            .cloned()
            .unwrap_or_default();

        match Config::load(&file) {
            Ok(c) => c,
            Err(error) => {
                eprintln!("error loading config file: {}\n{error}", file.display());
                std::process::exit(1);
            }
        }
    };

    // configure logging, -v enables debug and -vv trace unless the config
    // already asks for more
    let verbosity = match matches.get_count("VERBOSE") {
        0 => LevelFilter::OFF,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log().level().max(verbosity))
        .with_target(false)
        .init();

    let listen = match config.general().listen() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    for (id, project) in config.projects() {
        info!(
            "project {id} ({}), refresh interval {}",
            project.name(id),
            project.refresh_interval()
        );
    }

    let snapshots = config.general().snapshots();
    let timeout = config.general().request_timeout();

    debug!("reading snapshots from {}", snapshots.display());

    // initialize async runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("vantage")
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to launch async runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = ctrlc::set_handler(move || {
        info!("terminating");
        std::process::exit(2);
    }) {
        error!("failed to set ctrl-c handler: {e}");
        std::process::exit(1);
    }

    let store = Arc::new(FileStore::new(snapshots));
    let api = Api::new(Arc::new(config), store.clone(), store);

    if let Err(e) = rt.block_on(api::http::serve(listen, api, timeout)) {
        error!("http server failed: {e}");
        std::process::exit(1);
    }
}
