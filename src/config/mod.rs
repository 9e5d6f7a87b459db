use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use anyhow::Result;
use log::{debug, info};
use crate::store::{self, Store};

pub use files::{Accesses, Filter};
pub use model::{Config, InputsOutputs, Package, Run, CONFIG, VERSION};
pub use packages::{Packages, DPKG};

mod files;
mod model;
mod packages;


/// Derives the reproducibility configuration of a working directory
/// from its trace store.
pub trait Configurator {
    fn configure(&self, dir: &Path, identify_packages: bool, find_inputs_outputs: bool, overwrite: bool) -> Result<()>;
}

/// Writes `config.json` beside `trace.sqlite3`.
pub struct JsonConfigurator {
    packages: PathBuf,
}

impl JsonConfigurator {
    pub fn new() -> Self {
        Self {
            packages: PathBuf::from(DPKG),
        }
    }

    /// Directory of dpkg `*.list` manifests.
    pub fn packages(mut self, dir: &Path) -> Self {
        self.packages = dir.to_owned();
        self
    }
}

impl Default for JsonConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurator for JsonConfigurator {
    fn configure(&self, dir: &Path, identify_packages: bool, find_inputs_outputs: bool, overwrite: bool) -> Result<()> {
        let target = dir.join(CONFIG);

        if !overwrite && target.exists() {
            info!("configuration file {} exists, leaving it as is", target.display());
            return Ok(());
        }

        let store    = Store::open(&dir.join(store::TRACE))?;
        let packages = match identify_packages {
            true  => Some(Packages::load(&self.packages)),
            false => None,
        };

        let config = derive(&store, packages.as_ref(), find_inputs_outputs)?;
        config.save(&target)?;

        info!("configuration written to {}", target.display());

        Ok(())
    }
}

pub fn write_configuration(dir: &Path, identify_packages: bool, find_inputs_outputs: bool, overwrite: bool) -> Result<()> {
    JsonConfigurator::new().configure(dir, identify_packages, find_inputs_outputs, overwrite)
}

pub fn derive(store: &Store, packages: Option<&Packages>, find_inputs_outputs: bool) -> Result<Config> {
    let processes = store.processes()?;
    let executed  = store.executed_files()?;
    let opened    = store.opened_files()?;

    let runs = processes.iter().filter(|p| p.parent.is_none()).map(|root| {
        let exec = executed.iter().find(|e| e.process == root.id);
        Run {
            id:         root.run,
            binary:     exec.map(|e| e.name.clone()).unwrap_or_default(),
            argv:       exec.map(|e| e.argv.clone()).unwrap_or_default(),
            workingdir: exec.map(|e| e.workingdir.clone()).unwrap_or_default(),
            exitcode:   root.exitcode,
        }
    }).collect::<Vec<_>>();

    let filter   = Filter::new()?;
    let accesses = Accesses::collect(&opened, &executed, &filter);

    let mut owned = BTreeMap::<&str, Vec<String>>::new();
    let mut other = Vec::new();

    for path in accesses.all() {
        match packages.and_then(|p| p.owner(path)) {
            Some(name) => owned.entry(name).or_default().push(path.to_owned()),
            None       => other.push(path.to_owned()),
        }
    }

    debug!("{} runs, {} packages, {} other files", runs.len(), owned.len(), other.len());

    let packages = owned.into_iter().map(|(name, files)| Package {
        name:  name.to_owned(),
        files: files,
    }).collect();

    Ok(Config {
        version:        VERSION.to_owned(),
        runs:           runs,
        packages:       packages,
        other_files:    other,
        inputs_outputs: match find_inputs_outputs {
            true  => Some(accesses.inputs_outputs(&filter)),
            false => None,
        },
    })
}
