use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use zip::{CompressionMethod, ZipWriter};
use zip::write::FileOptions;
use crate::config::{Config, Configurator, JsonConfigurator, CONFIG};
use crate::store::TRACE;


pub const EXTENSION: &str = ".rpz";
pub const FORMAT:    &str = "REPROZIP VERSION 2\n";

/// Packages a traced working directory into a distributable bundle.
pub trait Packer {
    fn pack(&self, target: &Path, dir: &Path, identify_packages: bool) -> Result<()>;
}

/// Zip bundle holding the trace metadata and every listed file.
pub struct ZipPacker {
    config: JsonConfigurator,
}

impl ZipPacker {
    pub fn new(config: JsonConfigurator) -> Self {
        Self { config }
    }
}

impl Default for ZipPacker {
    fn default() -> Self {
        Self::new(JsonConfigurator::default())
    }
}

impl Packer for ZipPacker {
    fn pack(&self, target: &Path, dir: &Path, identify_packages: bool) -> Result<()> {
        let trace = dir.join(TRACE);
        if !trace.exists() {
            return Err(anyhow!("trace store {} does not exist", trace.display()));
        }

        self.config.configure(dir, identify_packages, true, false)?;
        let config = Config::load(&dir.join(CONFIG))?;

        let file = File::create(target).with_context(|| {
            format!("unable to create {}", target.display())
        })?;

        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("METADATA/version", options)?;
        zip.write_all(FORMAT.as_bytes())?;

        zip.start_file("METADATA/trace.sqlite3", options)?;
        io::copy(&mut File::open(&trace)?, &mut zip)?;

        zip.start_file("METADATA/config.json", options)?;
        io::copy(&mut File::open(dir.join(CONFIG))?, &mut zip)?;

        let mut packed = 0;

        for path in config.files() {
            let regular = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
            if !regular {
                debug!("skipping {}", path);
                continue;
            }

            let mut source = match File::open(path) {
                Ok(source) => source,
                Err(e)     => {
                    warn!("unable to pack {}: {}", path, e);
                    continue;
                }
            };

            zip.start_file(format!("DATA/{}", path.trim_start_matches('/')), options)?;
            io::copy(&mut source, &mut zip)?;
            packed += 1;
        }

        zip.finish()?.flush()?;

        info!("packed {} files into {}", packed, target.display());

        Ok(())
    }
}

/// Bundles always carry the `.rpz` extension.
pub fn ensure_extension(target: &Path) -> PathBuf {
    let name = target.to_string_lossy();
    if name.to_lowercase().ends_with(EXTENSION) {
        return target.to_owned();
    }
    let target = PathBuf::from(format!("{}{}", name, EXTENSION));
    warn!("Changing output filename to {}", target.display());
    target
}
