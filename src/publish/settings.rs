use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use serde::Deserialize;
use corr_api::{Record, Settings};

/// Registry section of the config file passed to `trace --config`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegistryConfig {
    pub settings: Settings,
    pub record:   Record,
}

#[derive(Deserialize, Debug, Default)]
struct File {
    #[serde(default)]
    default: Scope,
}

#[derive(Deserialize, Debug, Default)]
struct Scope {
    #[serde(default)]
    api:    Api,
    #[serde(default)]
    app:    String,
    #[serde(default)]
    record: Record,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct Api {
    host: String,
    port: Port,
    key:  String,
    path: String,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Port {
    Num(u16),
    Str(String),
}

impl RegistryConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| {
            format!("unable to read registry config {}", path.display())
        })?;
        Self::parse(&json).with_context(|| {
            format!("invalid registry config {}", path.display())
        })
    }

    pub fn parse(json: &str) -> Result<Self> {
        let scope = serde_json::from_str::<File>(json)?.default;
        let port  = match scope.api.port {
            Port::Num(n) => n,
            Port::Str(s) => s.trim().parse()?,
        };

        Ok(Self {
            settings: Settings {
                host:  scope.api.host,
                port:  port,
                path:  scope.api.path,
                key:   scope.api.key,
                token: scope.app,
            },
            record: scope.record,
        })
    }
}

impl Default for Api {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Port::Num(80),
            key:  String::new(),
            path: String::new(),
        }
    }
}
