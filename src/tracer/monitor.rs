use std::path::Path;
use anyhow::Result;
use libc::pid_t;
use crate::store::Writer;

pub struct Monitor;

impl Monitor {
    pub fn new(_root: pid_t, _id: i64, _image: &Path, _verbosity: u64) -> Self {
        Monitor
    }

    pub fn poll(&mut self, _writer: &mut Writer) -> Result<()> {
        Ok(())
    }

    pub fn finish(&mut self, _writer: &mut Writer) -> Result<()> {
        Ok(())
    }
}
