use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG:  &str = "config.json";
pub const VERSION: &str = "0.8";

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub version:        String,
    pub runs:           Vec<Run>,
    #[serde(default)]
    pub packages:       Vec<Package>,
    #[serde(default)]
    pub other_files:    Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_outputs: Option<InputsOutputs>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id:         i64,
    pub binary:     String,
    pub argv:       Vec<String>,
    pub workingdir: String,
    pub exitcode:   Option<i32>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name:  String,
    pub files: Vec<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct InputsOutputs {
    pub inputs:  Vec<String>,
    pub outputs: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read(path).with_context(|| {
            format!("unable to read configuration {}", path.display())
        })?;
        Ok(serde_json::from_slice(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).with_context(|| {
            format!("unable to write configuration {}", path.display())
        })
    }

    /// Every file the configuration lists, packaged or not.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        let packaged = self.packages.iter().flat_map(|p| p.files.iter());
        packaged.chain(self.other_files.iter()).map(String::as_str)
    }
}
