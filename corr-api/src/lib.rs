mod api;
mod client;
mod error;
mod serde;

pub use api::*;
pub use client::{Client, Settings};
pub use error::Error;
