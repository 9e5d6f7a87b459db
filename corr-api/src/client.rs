use http::header::ACCEPT;
use log::trace;
use reqwest::{RequestBuilder, Response};
use serde::{Serialize, Deserialize, de::DeserializeOwned};
use url::Url;
use crate::Error;

#[derive(Clone)]
pub struct Client {
    pub(crate) client: reqwest::Client,
    pub(crate) base:   String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub host:  String,
    pub port:  u16,
    pub path:  String,
    pub key:   String,
    pub token: String,
}

#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    pub content: T,
}

impl Client {
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let base = settings.url();

        if Url::parse(&base)?.cannot_be_a_base() {
            return Err(Error::Other(format!("invalid registry url '{}'", base)));
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client: client,
            base:   base,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let request = self.client.get(url).header(ACCEPT, "application/json");
        decode(self.send(request).await?).await
    }

    pub async fn post<T: Serialize, U: DeserializeOwned>(&self, url: &str, body: &T) -> Result<U, Error> {
        let request = self.client.post(url).json(body);
        decode(self.send(request).await?).await
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await?;
        let status   = response.status();
        trace!("{} {}", response.url(), status);
        match status {
            _ if status.is_success() => Ok(response),
            _                        => Err(error(response).await),
        }
    }
}

impl Settings {
    pub fn url(&self) -> String {
        format!("{}:{}{}/private/{}/{}/", self.host, self.port, self.path, self.key, self.token)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host:  String::new(),
            port:  80,
            path:  String::new(),
            key:   String::new(),
            token: String::new(),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        Error::Envelope(format!("{}: {}", e, body))
    })
}

async fn error(response: Response) -> Error {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => Error::Status(status, body),
        Err(_)   => Error::Status(status, String::new()),
    }
}
