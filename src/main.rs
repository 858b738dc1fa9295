mod app;
mod cat;
mod config;
mod debug;
mod error;
mod input;
mod render;
mod session;

use clap::Parser;

use crate::config::Config;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!("catwalk starting up ({config:?})");

    if let Err(e) = app::run(config) {
        log::error!("Fatal error: {e}");
        eprintln!("catwalk: {e}");
        std::process::exit(e.exit_code());
    }
}
