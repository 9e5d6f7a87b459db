use std::process;
use anyhow::Result;
use clap::{App, load_yaml};
use env_logger::Builder;
use jemallocator::Jemalloc;
use log::debug;
use log::LevelFilter::*;
use reprotrace::{args, command};

#[global_allocator]
static ALLOC: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let yaml = load_yaml!("args.yml");
    let ver  = env!("CARGO_PKG_VERSION");
    let args = App::from_yaml(&yaml).version(ver).get_matches();

    let verbose = match args.subcommand() {
        (_, Some(sub)) => args::verbose(&args, sub),
        (_, None)      => args.occurrences_of("verbose"),
    };

    let (module, level) = match verbose {
        0 => (Some(module_path!()), Info),
        1 => (Some(module_path!()), Debug),
        2 => (Some(module_path!()), Trace),
        _ => (None,                 Trace),
    };
    Builder::from_default_env().filter(module, level).init();

    debug!("reprotrace {}", ver);

    let code = command::dispatch(&args)?;

    process::exit(code);
}
