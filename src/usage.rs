use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use log::{error, info};

pub const USAGE_REPORT: &str = "usage_report";

/// Where the usage report preference is kept.
pub fn path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or_else(|| anyhow!("no configuration directory"))?;
    Ok(dir.join("reprotrace").join(USAGE_REPORT))
}

pub fn enabled(path: &Path) -> Result<Option<bool>> {
    match fs::read_to_string(path) {
        Ok(s)  => Ok(Some(s.trim() == "enabled")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Records the preference; exactly one of `enable` and `disable` must
/// be set. Returns the process exit code.
pub fn toggle(enable: bool, disable: bool, path: &Path) -> Result<i32> {
    if enable == disable {
        match enabled(path)? {
            Some(true)  => info!("usage reports are enabled"),
            Some(false) => info!("usage reports are disabled"),
            None        => info!("usage reports were never configured"),
        }
        error!("What do you want to do?");
        return Ok(2);
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let state = match enable {
        true  => "enabled",
        false => "disabled",
    };

    fs::write(path, format!("{}\n", state)).with_context(|| {
        format!("unable to write {}", path.display())
    })?;

    info!("usage reports {}", state);

    Ok(0)
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use tempfile::tempdir;
    use super::*;

    #[test]
    fn toggle_preference() -> Result<()> {
        let dir  = tempdir()?;
        let path = dir.path().join("reprotrace").join(USAGE_REPORT);

        assert_eq!(enabled(&path)?, None);

        assert_eq!(toggle(true, false, &path)?, 0);
        assert_eq!(enabled(&path)?, Some(true));

        assert_eq!(toggle(false, true, &path)?, 0);
        assert_eq!(enabled(&path)?, Some(false));

        Ok(())
    }

    #[test]
    fn ambiguous_request() -> Result<()> {
        let dir  = tempdir()?;
        let path = dir.path().join(USAGE_REPORT);

        assert_eq!(toggle(true, true, &path)?, 2);
        assert_eq!(toggle(false, false, &path)?, 2);
        assert!(!path.exists());

        toggle(true, false, &path)?;
        assert_eq!(toggle(false, false, &path)?, 2);
        assert_eq!(enabled(&path)?, Some(true));

        Ok(())
    }
}
