use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::{debug, info};
use crate::config::{Configurator, CONFIG};
use crate::pack::Packer;
use crate::publish::{Publication, Publisher, BUNDLE};
use crate::store::TRACE;
use crate::tracer::{Command, Status, Tracer};

#[derive(Clone, Debug)]
pub struct Options {
    pub dir:                 PathBuf,
    pub identify_packages:   bool,
    pub find_inputs_outputs: bool,
    pub append:              bool,
    pub verbosity:           u64,
}

#[derive(Debug)]
pub struct Outcome {
    pub status:      i32,
    pub bundle:      PathBuf,
    pub publication: Publication,
}

/// Trace, configure, pack and publish, each stage consuming what the
/// previous one left in the working directory.
pub struct Pipeline {
    tracer:    Box<dyn Tracer>,
    config:    Box<dyn Configurator>,
    packer:    Box<dyn Packer>,
    publisher: Option<Box<dyn Publisher>>,
    bundle:    PathBuf,
}

impl Pipeline {
    pub fn new(tracer: Box<dyn Tracer>, config: Box<dyn Configurator>, packer: Box<dyn Packer>) -> Self {
        Self {
            tracer:    tracer,
            config:    config,
            packer:    packer,
            publisher: None,
            bundle:    PathBuf::from(BUNDLE),
        }
    }

    pub fn publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn bundle(mut self, bundle: &Path) -> Self {
        self.bundle = bundle.to_owned();
        self
    }

    /// Runs every stage in order. An error from the first three stages
    /// aborts the run; publication failures only show in the outcome.
    pub fn run<W: Write>(&self, project: &str, cmd: &Command, opts: &Options, out: &mut W) -> Result<Outcome> {
        let status = self.trace(cmd, opts, out)?;

        debug!("deriving configuration in {}", opts.dir.display());
        self.config.configure(&opts.dir, opts.identify_packages, opts.find_inputs_outputs, false)?;

        if self.bundle.exists() {
            fs::remove_file(&self.bundle).with_context(|| {
                format!("unable to remove previous bundle {}", self.bundle.display())
            })?;
        }

        self.packer.pack(&self.bundle, &opts.dir, opts.identify_packages)?;

        let publication = match &self.publisher {
            Some(publisher) => publisher.publish(project, &self.bundle),
            None            => {
                info!("Config file not provided.");
                Publication::Skipped
            }
        };

        Ok(Outcome {
            status:      status,
            bundle:      self.bundle.clone(),
            publication: publication,
        })
    }

    fn trace<W: Write>(&self, cmd: &Command, opts: &Options, out: &mut W) -> Result<i32> {
        let store = opts.dir.join(TRACE);

        fs::create_dir_all(&opts.dir).with_context(|| {
            format!("unable to create {}", opts.dir.display())
        })?;

        if !opts.append {
            for stale in &[store.clone(), opts.dir.join(CONFIG)] {
                if stale.exists() {
                    info!("removing previous {}", stale.display());
                    fs::remove_file(stale)?;
                }
            }
        }

        debug!("starting tracer, binary={:?}, argv={:?}", cmd.binary, cmd.argv);

        let status = self.tracer.trace(&cmd.binary, &cmd.argv, &store, opts.verbosity)?;

        if let Some(warning) = Status::decode(status).warning() {
            writeln!(out, "\nWarning: {}", warning)?;
        }

        Ok(status)
    }
}
