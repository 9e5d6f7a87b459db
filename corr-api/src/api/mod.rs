pub use file::{Upload, RESOURCE_RECORD};
pub use project::Project;
pub use record::Record;

mod file;
mod project;
mod record;
