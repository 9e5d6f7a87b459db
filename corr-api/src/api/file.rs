use log::debug;
use reqwest::multipart::{Form, Part};
use crate::{Client, Error};

pub const RESOURCE_RECORD: &str = "resource-record";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Upload {
    pub status: u16,
    pub body:   String,
}

impl Upload {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl Client {
    /// Attaches a file to a record. The response status is reported,
    /// not checked.
    pub async fn upload(&self, group: &str, record: &str, name: &str, data: Vec<u8>) -> Result<Upload, Error> {
        let url = format!("{}file/upload/{}/{}", self.base, group, record);
        debug!("uploading {} ({} bytes) to {}", name, data.len(), url);

        let part = Part::bytes(data).file_name(name.to_owned());
        let form = Form::new().part("file", part);

        let res    = self.client.post(&url).multipart(form).send().await?;
        let status = res.status().as_u16();
        let body   = res.text().await?;

        Ok(Upload { status, body })
    }
}
