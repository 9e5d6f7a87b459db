use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::runtime::Runtime;
use corr_api::{Client, Project, Record, RESOURCE_RECORD};

pub use settings::RegistryConfig;

mod settings;

#[cfg(test)]
mod test;

pub const BUNDLE: &str = "bundle.rpz";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Publication {
    Skipped,
    Published { project: String, record: String },
    Failed(String),
}

/// Submits a packaged run to a provenance registry. Failures are
/// reported in the returned [`Publication`], never raised.
pub trait Publisher {
    fn publish(&self, project: &str, bundle: &Path) -> Publication;
}

/// Publishes to a CoRR registry, one blocking call sequence per bundle.
pub struct Registry {
    client: Client,
    record: Record,
    rt:     Runtime,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = Client::new(&config.settings)?;
        let rt     = Runtime::new()?;
        debug!("registry {}", client.base());
        Ok(Self {
            client: client,
            record: config.record,
            rt:     rt,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::new(RegistryConfig::load(path)?)
    }
}

impl Publisher for Registry {
    fn publish(&self, project: &str, bundle: &Path) -> Publication {
        match self.rt.block_on(submit(&self.client, &self.record, project, bundle)) {
            Ok(publication) => publication,
            Err(e)          => {
                error!("publication abandoned: {:#}", e);
                Publication::Failed(format!("{:#}", e))
            }
        }
    }
}

/// Registry whose config file is only read once a bundle is ready, so a
/// broken file costs the publication but not the trace.
pub struct Deferred {
    path: PathBuf,
}

impl Deferred {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
        }
    }
}

impl Publisher for Deferred {
    fn publish(&self, project: &str, bundle: &Path) -> Publication {
        match Registry::load(&self.path) {
            Ok(registry) => registry.publish(project, bundle),
            Err(e)       => {
                error!("unable to load registry config {}: {:#}", self.path.display(), e);
                Publication::Failed(format!("{:#}", e))
            }
        }
    }
}

async fn submit(client: &Client, record: &Record, name: &str, bundle: &Path) -> Result<Publication> {
    let data = fs::read(bundle).with_context(|| {
        format!("unable to read bundle {}", bundle.display())
    })?;

    let project = get_or_create_project(client, name).await?;

    let url    = format!("project/record/create/{}", project.id);
    let record = client.create_record(&project.id, record).await.context(url)?;
    info!("created record {} in project {}", record, project.id);

    let upload = client.upload(RESOURCE_RECORD, &record, BUNDLE, data).await;
    match upload {
        Ok(upload) if upload.is_success() => info!("uploaded {} to record {}", BUNDLE, record),
        Ok(upload)                        => error!("upload to record {} returned {}: {}", record, upload.status, upload.body),
        Err(e)                            => error!("upload to record {} failed: {}", record, e),
    }

    Ok(Publication::Published {
        project: project.id,
        record:  record,
    })
}

// Unguarded: a concurrent publisher may create the same project between
// the list and the create.
async fn get_or_create_project(client: &Client, name: &str) -> Result<Project> {
    let projects = client.projects().await.context("projects")?;
    let project  = match projects.into_iter().find(|p| p.name == name) {
        Some(project) => project,
        None          => create_project(client, name).await?,
    };
    debug!("project {:?}", project);
    Ok(project)
}

async fn create_project(client: &Client, name: &str) -> Result<Project> {
    debug!("creating project {}", name);
    Ok(client.create_project(name, None, None).await.context("project/create")?)
}
