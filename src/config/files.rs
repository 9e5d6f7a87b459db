use std::collections::BTreeSet;
use anyhow::Result;
use regex::Regex;
use crate::store::{ExecutedFile, OpenedFile};
use super::model::InputsOutputs;

/// Files touched by a trace, split by how they were accessed.
#[derive(Debug, Default)]
pub struct Accesses {
    pub read:    BTreeSet<String>,
    pub written: BTreeSet<String>,
}

pub struct Filter {
    ignored: Regex,
    system:  Regex,
}

impl Filter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ignored: Regex::new(r"^/(proc|sys|dev|run)(/|$)")?,
            system:  Regex::new(r"^/(usr|lib|lib32|lib64|libx32|bin|sbin|etc|opt|var/lib|var/cache)(/|$)")?,
        })
    }

    /// Pseudo file systems, never packed.
    pub fn ignored(&self, path: &str) -> bool {
        path.is_empty() || self.ignored.is_match(path)
    }

    pub fn system(&self, path: &str) -> bool {
        self.system.is_match(path)
    }
}

impl Accesses {
    pub fn collect(opened: &[OpenedFile], executed: &[ExecutedFile], filter: &Filter) -> Self {
        let mut accesses = Self::default();

        let opened = opened.iter().filter(|f| !f.is_directory && !filter.ignored(&f.name));
        for file in opened {
            match file.mode.is_write() {
                true  => accesses.written.insert(file.name.clone()),
                false => accesses.read.insert(file.name.clone()),
            };
        }

        for exec in executed.iter().filter(|e| !filter.ignored(&e.name)) {
            accesses.read.insert(exec.name.clone());
        }

        accesses
    }

    pub fn all(&self) -> BTreeSet<&str> {
        self.read.iter().chain(self.written.iter()).map(String::as_str).collect()
    }

    /// Inputs are user files read and never written, outputs are
    /// everything written.
    pub fn inputs_outputs(&self, filter: &Filter) -> InputsOutputs {
        let inputs = self.read.iter().filter(|path| {
            !self.written.contains(*path) && !filter.system(path)
        }).cloned().collect();

        InputsOutputs {
            inputs:  inputs,
            outputs: self.written.iter().cloned().collect(),
        }
    }
}
