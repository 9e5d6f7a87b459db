use std::path::{Path, PathBuf};
use anyhow::Result;
use clap::{ArgMatches, ErrorKind};
use crate::store::TRACE;
use crate::tracer::Command;

pub const DIR: &str = ".reprozip-trace";

/// Options accepted before or after the subcommand name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Globals {
    pub dir:                 PathBuf,
    pub identify_packages:   bool,
    pub find_inputs_outputs: bool,
    pub verbosity:           u64,
}

impl Globals {
    pub fn new(args: &ArgMatches, sub: &ArgMatches) -> Self {
        let dir  = sub.value_of("dir").or_else(|| args.value_of("dir")).unwrap_or(DIR);
        let flag = |name: &str| args.is_present(name) || sub.is_present(name);

        Self {
            dir:                 PathBuf::from(dir),
            identify_packages:   !flag("dont-identify-packages"),
            find_inputs_outputs: !flag("dont-find-inputs-outputs"),
            verbosity:           1 + verbose(args, sub),
        }
    }
}

/// Number of `-v` given on either side of the subcommand.
pub fn verbose(args: &ArgMatches, sub: &ArgMatches) -> u64 {
    args.occurrences_of("verbose").max(sub.occurrences_of("verbose"))
}

pub fn cmdline(args: &ArgMatches) -> Result<Command> {
    let cmdline = args.values_of("cmdline").map(|vs| {
        vs.map(String::from).collect::<Vec<_>>()
    }).unwrap_or_default();

    if cmdline.is_empty() {
        return Err(clap::Error {
            message: format!("error: missing command-line\n\n{}", args.usage()),
            kind:    ErrorKind::MissingRequiredArgument,
            info:    None,
        }.into());
    }

    Command::new(&cmdline, args.value_of("arg0"))
}

/// `-` names the store of the working directory, a directory names the
/// store inside it.
pub fn trace_path(arg: &str, dir: &Path) -> PathBuf {
    let path = match arg {
        "-" => return dir.join(TRACE),
        _   => PathBuf::from(arg),
    };
    match path.is_dir() {
        true  => path.join(TRACE),
        false => path,
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use anyhow::Result;
    use clap::{App, load_yaml};
    use tempfile::tempdir;
    use super::*;

    fn parse(argv: &[&str]) -> Result<(Globals, Result<Command>)> {
        let yaml = load_yaml!("args.yml");
        let args = App::from_yaml(yaml).get_matches_from_safe(argv)?;
        let (_, sub) = args.subcommand();
        let sub = sub.ok_or_else(|| anyhow::anyhow!("no subcommand"))?;
        Ok((Globals::new(&args, sub), cmdline(sub)))
    }

    #[test]
    fn defaults() -> Result<()> {
        let (globals, cmd) = parse(&["reprotrace", "testrun", "ls", "-l"])?;
        assert_eq!(globals, Globals {
            dir:                 PathBuf::from(DIR),
            identify_packages:   true,
            find_inputs_outputs: true,
            verbosity:           1,
        });
        assert_eq!(cmd?.argv, vec!["ls", "-l"]);
        Ok(())
    }

    #[test]
    fn global_options() -> Result<()> {
        let argv = ["reprotrace", "-v", "-v", "trace", "-d", "out", "--dont-identify-packages", "-a", "zero", "proj", "ls", "-a"];
        let (globals, cmd) = parse(&argv)?;
        assert_eq!(globals.dir, PathBuf::from("out"));
        assert!(!globals.identify_packages);
        assert!(globals.find_inputs_outputs);
        assert_eq!(globals.verbosity, 3);

        let cmd = cmd?;
        assert_eq!(cmd.binary, PathBuf::from("ls"));
        assert_eq!(cmd.argv, vec!["zero", "-a"]);

        Ok(())
    }

    #[test]
    fn empty_cmdline() -> Result<()> {
        let (_, cmd) = parse(&["reprotrace", "trace", "proj"])?;
        let err = cmd.err().ok_or_else(|| anyhow::anyhow!("accepted an empty command line"))?;
        let err = err.downcast::<clap::Error>()?;
        assert_eq!(err.kind, ErrorKind::MissingRequiredArgument);
        assert!(err.message.starts_with("error: missing command-line"));
        Ok(())
    }

    #[test]
    fn trace_paths() -> Result<()> {
        let dir  = tempdir()?;
        let work = Path::new(".reprozip-trace");
        assert_eq!(trace_path("-", work), work.join(TRACE));

        let other = dir.path().join("other");
        fs::create_dir(&other)?;
        assert_eq!(trace_path(&other.to_string_lossy(), work), other.join(TRACE));
        assert_eq!(trace_path("x.sqlite3", work), PathBuf::from("x.sqlite3"));

        Ok(())
    }
}
