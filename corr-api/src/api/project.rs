use serde::{Serialize, Deserialize};
use crate::{Client, Error};
use crate::client::Envelope;

pub const NO_GOALS:       &str = "No goals provided.";
pub const NO_DESCRIPTION: &str = "No description provided.";

#[derive(Clone, Default, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(with = "crate::serde::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
struct Projects {
    total_projects: u64,
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Serialize, Debug)]
struct Create<'a> {
    name:        &'a str,
    goals:       &'a str,
    description: &'a str,
}

impl Client {
    pub async fn projects(&self) -> Result<Vec<Project>, Error> {
        let url  = format!("{}projects", self.base);
        let list = self.get::<Envelope<Projects>>(&url).await?.content;
        Ok(match list.total_projects {
            0 => Vec::new(),
            _ => list.projects,
        })
    }

    pub async fn create_project(&self, name: &str, goals: Option<&str>, description: Option<&str>) -> Result<Project, Error> {
        let url = format!("{}project/create", self.base);
        let arg = Create {
            name:        name,
            goals:       goals.unwrap_or(NO_GOALS),
            description: description.unwrap_or(NO_DESCRIPTION),
        };
        Ok(self.post::<Create, Envelope<Project>>(&url, &arg).await?.content)
    }
}
