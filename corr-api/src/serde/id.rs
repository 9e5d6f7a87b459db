use std::fmt::Display;
use serde::Deserialize;
use serde::de::Deserializer;
use serde::ser::Serializer;

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Str(String),
    Num(u64),
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

pub fn serialize<T: Display, S: Serializer>(v: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&v.to_string())
}
