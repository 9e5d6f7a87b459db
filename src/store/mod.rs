pub use combine::combine;
pub use model::{Connection, ExecutedFile, Mode, OpenedFile, Process};
pub use model::{join_argv, split_argv};
pub use read::Store;
pub use schema::{create, open, TRACE};
pub use write::Writer;

mod combine;
mod model;
mod read;
mod schema;
mod write;
