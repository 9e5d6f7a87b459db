use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use anyhow::Result;
use tempfile::tempdir;
use corr_api::Settings;
use super::*;

#[derive(Clone, Debug)]
struct Request {
    method: String,
    path:   String,
    body:   Vec<u8>,
}

/// Minimal HTTP/1.1 server answering one request per connection.
struct Server {
    addr: SocketAddr,
    log:  Arc<Mutex<Vec<Request>>>,
}

impl Server {
    fn start<F>(handler: F) -> Result<Self>
    where
        F: Fn(&Request) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr     = listener.local_addr()?;
        let log      = Arc::new(Mutex::new(Vec::new()));
        let seen     = log.clone();

        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                if let Ok(request) = read(&stream) {
                    let (status, body) = handler(&request);
                    seen.lock().unwrap().push(request);
                    let _ = respond(stream, status, &body);
                }
            }
        });

        Ok(Self { addr, log })
    }

    fn config(&self) -> RegistryConfig {
        RegistryConfig {
            settings: Settings {
                host:  "http://127.0.0.1".to_owned(),
                port:  self.addr.port(),
                path:  "/api".to_owned(),
                key:   "key".to_owned(),
                token: "app".to_owned(),
            },
            record: Record::default(),
        }
    }

    fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| format!("{} {}", r.method, r.path)).collect()
    }
}

fn read(stream: &TcpStream) -> io::Result<Request> {
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path   = parts.next().unwrap_or_default().to_owned();

    let mut length  = 0;
    let mut chunked = false;

    loop {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let header = header.trim_end().to_lowercase();
        if header.is_empty() {
            break;
        }
        if let Some(n) = header.strip_prefix("content-length:") {
            length = n.trim().parse().unwrap_or(0);
        }
        if header.starts_with("transfer-encoding:") && header.ends_with("chunked") {
            chunked = true;
        }
    }

    let mut body = Vec::new();

    if chunked {
        loop {
            let mut size = String::new();
            reader.read_line(&mut size)?;
            let size = usize::from_str_radix(size.trim(), 16).unwrap_or(0);
            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk)?;
            if size == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..size]);
        }
    } else {
        body.resize(length, 0);
        reader.read_exact(&mut body)?;
    }

    Ok(Request { method, path, body })
}

fn respond(mut stream: TcpStream, status: u16, body: &str) -> io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body,
    )?;
    stream.flush()
}

fn bundle(dir: &Path) -> Result<std::path::PathBuf> {
    let path = dir.join(BUNDLE);
    fs::write(&path, b"PK-bundle-bytes")?;
    Ok(path)
}

const LISTED: &str = r#"{"content": {"total_projects": 1, "projects": [
    {"id": "p1", "name": "existing", "goals": "g", "description": "d"}
]}}"#;

fn registry(request: &Request) -> (u16, String) {
    let path = request.path.trim_start_matches("/api/private/key/app/");
    match (request.method.as_str(), path) {
        ("GET", "projects")                          => (200, LISTED.to_owned()),
        ("POST", "project/create")                   => (200, r#"{"content": {"id": 7, "name": "new"}}"#.to_owned()),
        ("POST", p) if p.starts_with("project/record/create/") => (200, r#"{"content": {"head": {"id": "r1"}}}"#.to_owned()),
        ("POST", "file/upload/resource-record/r1")   => (200, r#"{"content": {}}"#.to_owned()),
        _                                            => (404, "not found".to_owned()),
    }
}

#[test]
fn existing_project() -> Result<()> {
    let dir    = tempdir()?;
    let server = Server::start(registry)?;
    let pub_   = Registry::new(server.config())?;

    let result = pub_.publish("existing", &bundle(dir.path())?);
    assert_eq!(result, Publication::Published {
        project: "p1".to_owned(),
        record:  "r1".to_owned(),
    });

    assert_eq!(server.paths(), vec![
        "GET /api/private/key/app/projects",
        "POST /api/private/key/app/project/record/create/p1",
        "POST /api/private/key/app/file/upload/resource-record/r1",
    ]);

    let requests = server.requests();
    let record   = serde_json::from_slice::<serde_json::Value>(&requests[1].body)?;
    assert_eq!(record["status"],  "finished");
    assert_eq!(record["outcome"], "no outcome provided");
    assert_eq!(record["user"],    "not captured");

    let upload = String::from_utf8_lossy(&requests[2].body);
    assert!(upload.contains("name=\"file\""));
    assert!(upload.contains("filename=\"bundle.rpz\""));
    assert!(upload.contains("PK-bundle-bytes"));

    Ok(())
}

#[test]
fn new_project() -> Result<()> {
    let dir    = tempdir()?;
    let server = Server::start(registry)?;
    let pub_   = Registry::new(server.config())?;

    let result = pub_.publish("new", &bundle(dir.path())?);
    assert_eq!(result, Publication::Published {
        project: "7".to_owned(),
        record:  "r1".to_owned(),
    });

    let requests = server.requests();
    assert_eq!(requests[1].path, "/api/private/key/app/project/create");
    assert_eq!(requests[2].path, "/api/private/key/app/project/record/create/7");

    let create = serde_json::from_slice::<serde_json::Value>(&requests[1].body)?;
    assert_eq!(create["name"],        "new");
    assert_eq!(create["goals"],       "No goals provided.");
    assert_eq!(create["description"], "No description provided.");

    Ok(())
}

#[test]
fn project_reused() -> Result<()> {
    let dir     = tempdir()?;
    let created = Arc::new(Mutex::new(Vec::<String>::new()));
    let names   = created.clone();

    let server = Server::start(move |request| {
        let path = request.path.trim_start_matches("/api/private/key/app/");
        let mut names = names.lock().unwrap();
        match (request.method.as_str(), path) {
            ("GET", "projects") => {
                let projects = names.iter().enumerate().map(|(n, name)| {
                    serde_json::json!({"id": n, "name": name})
                }).collect::<Vec<_>>();
                let list = serde_json::json!({"content": {
                    "total_projects": projects.len(),
                    "projects":       projects,
                }});
                (200, list.to_string())
            }
            ("POST", "project/create") => {
                let body = serde_json::from_slice::<serde_json::Value>(&request.body).unwrap();
                let name = body["name"].as_str().unwrap_or_default().to_owned();
                names.push(name.clone());
                (200, serde_json::json!({"content": {"id": names.len() - 1, "name": name}}).to_string())
            }
            _ => registry(request),
        }
    })?;

    let pub_   = Registry::new(server.config())?;
    let bundle = bundle(dir.path())?;

    let first  = pub_.publish("demo", &bundle);
    let second = pub_.publish("demo", &bundle);
    assert_eq!(first, second);

    let creates = server.paths().into_iter().filter(|p| p.ends_with("project/create")).count();
    assert_eq!(creates, 1);
    assert_eq!(created.lock().unwrap().len(), 1);

    Ok(())
}

#[test]
fn list_failure() -> Result<()> {
    let dir    = tempdir()?;
    let server = Server::start(|_| (500, "database is on fire".to_owned()))?;
    let pub_   = Registry::new(server.config())?;

    match pub_.publish("existing", &bundle(dir.path())?) {
        Publication::Failed(reason) => {
            assert!(reason.contains("projects"), "{}", reason);
            assert!(reason.contains("database is on fire"), "{}", reason);
        }
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(server.requests().len(), 1);

    Ok(())
}

#[test]
fn record_failure() -> Result<()> {
    let dir    = tempdir()?;
    let server = Server::start(|request| match request.path.contains("record/create") {
        true  => (403, "forbidden".to_owned()),
        false => registry(request),
    })?;
    let pub_   = Registry::new(server.config())?;

    let result = pub_.publish("existing", &bundle(dir.path())?);
    assert!(matches!(result, Publication::Failed(ref r) if r.contains("forbidden")));
    assert!(!server.paths().iter().any(|p| p.contains("file/upload")));

    Ok(())
}

#[test]
fn upload_failure_keeps_record() -> Result<()> {
    let dir    = tempdir()?;
    let server = Server::start(|request| match request.path.contains("file/upload") {
        true  => (500, "disk full".to_owned()),
        false => registry(request),
    })?;
    let pub_   = Registry::new(server.config())?;

    let result = pub_.publish("existing", &bundle(dir.path())?);
    assert_eq!(result, Publication::Published {
        project: "p1".to_owned(),
        record:  "r1".to_owned(),
    });

    Ok(())
}

#[test]
fn missing_bundle() -> Result<()> {
    let dir    = tempdir()?;
    let server = Server::start(registry)?;
    let pub_   = Registry::new(server.config())?;

    let result = pub_.publish("existing", &dir.path().join(BUNDLE));
    assert!(matches!(result, Publication::Failed(_)));
    assert!(server.requests().is_empty());

    Ok(())
}

#[test]
fn config_file() -> Result<()> {
    let config = RegistryConfig::parse(r#"{"default": {
        "api": {"host": "https://corr.example.org", "port": "5100", "key": "k", "path": "/corr"},
        "app": "token",
        "record": {"label": "nightly", "tags": ["ci"]}
    }}"#)?;

    assert_eq!(config.settings.url(), "https://corr.example.org:5100/corr/private/k/token/");
    assert_eq!(config.record.label, "nightly");
    assert_eq!(config.record.tags,  vec!["ci"]);
    assert_eq!(config.record.status, "finished");

    let empty = RegistryConfig::parse("{}")?;
    assert_eq!(empty, RegistryConfig::default());
    assert_eq!(empty.settings.url(), ":80/private///");

    assert!(RegistryConfig::parse(r#"{"default": {"api": {"port": "http"}}}"#).is_err());

    Ok(())
}

#[test]
fn deferred_config() -> Result<()> {
    let dir    = tempdir()?;
    let bundle = bundle(dir.path())?;

    let missing = Deferred::new(&dir.path().join("missing.json"));
    assert!(matches!(missing.publish("demo", &bundle), Publication::Failed(_)));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json")?;
    assert!(matches!(Deferred::new(&broken).publish("demo", &bundle), Publication::Failed(_)));

    Ok(())
}
