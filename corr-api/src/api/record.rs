use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use crate::{Client, Error};
use crate::client::Envelope;

const NOT_CAPTURED: &str = "not captured";

/// Metadata submitted when a run is registered.
///
/// Most fields have no source yet and default to placeholders; the
/// registry config file may override any of them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub label:            String,
    pub tags:             Vec<String>,
    pub system:           Map<String, Value>,
    pub inputs:           Vec<Value>,
    pub outputs:          Vec<Value>,
    pub dependencies:     Vec<Value>,
    pub execution:        Map<String, Value>,
    pub status:           String,
    pub timestamp:        String,
    pub reason:           String,
    pub duration:         String,
    pub executable:       Map<String, Value>,
    pub repository:       Map<String, Value>,
    pub main_file:        String,
    pub version:          String,
    pub parameters:       Map<String, Value>,
    pub script_arguments: String,
    pub datastore:        Map<String, Value>,
    pub input_datastore:  Map<String, Value>,
    pub outcome:          String,
    pub stdout_stderr:    String,
    pub diff:             String,
    pub user:             String,
}

#[derive(Deserialize, Debug)]
struct Created {
    head: Head,
}

#[derive(Deserialize, Debug)]
struct Head {
    #[serde(with = "crate::serde::id")]
    id: String,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            label:            "no label provided".to_owned(),
            tags:             Vec::new(),
            system:           Map::new(),
            inputs:           Vec::new(),
            outputs:          Vec::new(),
            dependencies:     Vec::new(),
            execution:        Map::new(),
            status:           "finished".to_owned(),
            timestamp:        NOT_CAPTURED.to_owned(),
            reason:           "no reason provided".to_owned(),
            duration:         NOT_CAPTURED.to_owned(),
            executable:       Map::new(),
            repository:       Map::new(),
            main_file:        String::new(),
            version:          NOT_CAPTURED.to_owned(),
            parameters:       Map::new(),
            script_arguments: NOT_CAPTURED.to_owned(),
            datastore:        Map::new(),
            input_datastore:  Map::new(),
            outcome:          "no outcome provided".to_owned(),
            stdout_stderr:    NOT_CAPTURED.to_owned(),
            diff:             NOT_CAPTURED.to_owned(),
            user:             NOT_CAPTURED.to_owned(),
        }
    }
}

impl Client {
    /// Registers a run under the project and returns the new record id.
    pub async fn create_record(&self, project: &str, record: &Record) -> Result<String, Error> {
        let url = format!("{}project/record/create/{}", self.base, project);
        let res = self.post::<Record, Envelope<Created>>(&url, record).await?;
        Ok(res.content.head.id)
    }
}
