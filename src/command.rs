use std::fs;
use std::io;
use std::path::Path;
use anyhow::Result;
use clap::{value_t, ArgMatches};
use log::{info, warn};
use crate::args::{self, Globals};
use crate::config::{write_configuration, JsonConfigurator};
use crate::harness;
use crate::pack::{ensure_extension, Packer, ZipPacker};
use crate::pipeline::{Options, Pipeline};
use crate::publish::{Deferred, Publication};
use crate::store::{self, TRACE};
use crate::tracer::ProcTracer;
use crate::usage;

/// Runs the selected subcommand and returns the process exit code.
pub fn dispatch(args: &ArgMatches) -> Result<i32> {
    match args.subcommand() {
        ("trace",        Some(sub)) => trace(&Globals::new(args, sub), sub),
        ("testrun",      Some(sub)) => testrun(&Globals::new(args, sub), sub),
        ("reset",        Some(sub)) => reset(&Globals::new(args, sub)),
        ("pack",         Some(sub)) => pack(&Globals::new(args, sub), sub),
        ("combine",      Some(sub)) => combine(&Globals::new(args, sub), sub),
        ("usage_report", Some(sub)) => usage_report(sub),
        _                           => {
            eprintln!("{}", args.usage());
            Ok(2)
        }
    }
}

pub fn trace(globals: &Globals, args: &ArgMatches) -> Result<i32> {
    let cmd = match args::cmdline(args) {
        Ok(cmd) => cmd,
        Err(e)  => return usage_error(e),
    };
    let project = value_t!(args, "project", String)?;

    let opts = Options {
        dir:                 globals.dir.clone(),
        identify_packages:   globals.identify_packages,
        find_inputs_outputs: globals.find_inputs_outputs,
        append:              args.is_present("continue"),
        verbosity:           globals.verbosity,
    };

    let mut pipeline = Pipeline::new(
        Box::new(ProcTracer::new()),
        Box::new(JsonConfigurator::new()),
        Box::new(ZipPacker::default()),
    );

    if let Some(config) = args.value_of("config") {
        pipeline = pipeline.publisher(Box::new(Deferred::new(Path::new(config))));
    }

    let outcome = pipeline.run(&project, &cmd, &opts, &mut io::stdout())?;

    match outcome.publication {
        Publication::Published { project, record } => info!("published record {} in project {}", record, project),
        Publication::Failed(_)                     => warn!("{} was not published", outcome.bundle.display()),
        Publication::Skipped                       => (),
    }

    Ok(0)
}

pub fn testrun(globals: &Globals, args: &ArgMatches) -> Result<i32> {
    let cmd = match args::cmdline(args) {
        Ok(cmd) => cmd,
        Err(e)  => return usage_error(e),
    };
    let stdout = io::stdout();
    harness::testrun(&ProcTracer::new(), &cmd, globals.verbosity, &mut stdout.lock())?;
    Ok(0)
}

pub fn reset(globals: &Globals) -> Result<i32> {
    write_configuration(&globals.dir, globals.identify_packages, globals.find_inputs_outputs, true)?;
    Ok(0)
}

pub fn pack(globals: &Globals, args: &ArgMatches) -> Result<i32> {
    let target = ensure_extension(Path::new(args.value_of("target").unwrap_or("experiment.rpz")));
    ZipPacker::default().pack(&target, &globals.dir, globals.identify_packages)?;
    Ok(0)
}

pub fn combine(globals: &Globals, args: &ArgMatches) -> Result<i32> {
    let traces = args.values_of("traces").map(|vs| {
        vs.map(|arg| args::trace_path(arg, &globals.dir)).collect::<Vec<_>>()
    }).unwrap_or_default();

    fs::create_dir_all(&globals.dir)?;
    store::combine(&traces, &globals.dir.join(TRACE))?;
    write_configuration(&globals.dir, globals.identify_packages, globals.find_inputs_outputs, true)?;

    Ok(0)
}

pub fn usage_report(args: &ArgMatches) -> Result<i32> {
    usage::toggle(args.is_present("enable"), args.is_present("disable"), &usage::path()?)
}

// Argument errors print the usage and exit with 2, like clap's own.
fn usage_error(e: anyhow::Error) -> Result<i32> {
    match e.downcast::<clap::Error>() {
        Ok(e)  => {
            eprintln!("{}", e.message);
            Ok(2)
        }
        Err(e) => Err(e),
    }
}
