use std::io::Write;
use anyhow::Result;
use crate::store::Store;

pub use connections::{lines, Line};
pub use escape::{cmdline, shell_escape};

mod connections;
mod escape;
mod table;


/// Dumps every table of a trace store, processes first, connections last.
pub fn print<W: Write>(store: &Store, out: &mut W) -> Result<()> {
    table::processes(&store.processes()?, out)?;
    table::executed(&store.executed_files()?, out)?;
    table::files(&store.opened_files()?, out)?;
    connections::print(&store.connections()?, out)?;
    Ok(())
}
