use std::collections::HashMap;
use std::fs;
use std::path::Path;
use log::{debug, warn};

pub const DPKG: &str = "/var/lib/dpkg/info";

/// Owning package of each file installed by dpkg.
#[derive(Debug, Default)]
pub struct Packages {
    owners: HashMap<String, String>,
}

impl Packages {
    /// Reads the `*.list` manifests under `dir`. A missing database is
    /// an empty index.
    pub fn load(dir: &Path) -> Self {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e)      => {
                debug!("no package database at {}: {}", dir.display(), e);
                return Self::default();
            }
        };

        let mut owners = HashMap::new();

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "list") {
                continue;
            }

            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.split(':').next().unwrap_or(stem).to_owned(),
                None       => continue,
            };

            match fs::read_to_string(&path) {
                Ok(list) => Self::insert(&mut owners, &name, &list),
                Err(e)   => warn!("unable to read {}: {}", path.display(), e),
            }
        }

        debug!("indexed {} packaged files", owners.len());

        Self { owners }
    }

    pub fn parse(manifests: &[(&str, &str)]) -> Self {
        let mut owners = HashMap::new();
        for (name, list) in manifests {
            Self::insert(&mut owners, name, list);
        }
        Self { owners }
    }

    pub fn owner(&self, path: &str) -> Option<&str> {
        self.owners.get(path).map(String::as_str)
    }

    fn insert(owners: &mut HashMap<String, String>, name: &str, list: &str) {
        for line in list.lines().filter(|l| l.starts_with('/') && *l != "/.") {
            owners.insert(line.to_owned(), name.to_owned());
        }
    }
}
