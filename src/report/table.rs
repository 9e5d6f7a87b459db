use std::io::Write;
use anyhow::Result;
use crate::store::{ExecutedFile, OpenedFile, Process};
use crate::tracer::Status;
use super::escape::cmdline;

const PROCESSES: &str = "+------+--------+-------+------------------+------------------+----------+";
const EXECUTED:  &str = "+--------+------------------+---------+---------------------------------------+";
const FILES:     &str = "+--------+------------------+---------+------+--------------------------------+";

pub fn processes<W: Write>(procs: &[Process], out: &mut W) -> Result<()> {
    writeln!(out, "\nProcesses:")?;
    writeln!(out, "{}", PROCESSES)?;
    writeln!(out, "|  id  | parent |  exit |     timestamp    |  exit timestamp  | cpu time |")?;
    writeln!(out, "{}", PROCESSES)?;

    for p in procs {
        let row = [
            cell(p.id, 5),
            p.parent.map(|n| cell(n, 7)).unwrap_or_else(|| blank(8)),
            p.exitcode.map(exit).unwrap_or_else(|| blank(7)),
            cell(p.timestamp, 17),
            p.exit_timestamp.map(|n| cell(n, 17)).unwrap_or_else(|| blank(18)),
            cpu(p.cpu_time),
        ];
        writeln!(out, "{}", join(&row))?;
        writeln!(out, "{}", PROCESSES)?;
    }

    Ok(())
}

pub fn executed<W: Write>(execs: &[ExecutedFile], out: &mut W) -> Result<()> {
    writeln!(out, "\nExecuted files:")?;
    writeln!(out, "{}", EXECUTED)?;
    writeln!(out, "|   id   |     timestamp    | process | name and argv                         |")?;
    writeln!(out, "{}", EXECUTED)?;

    for e in execs {
        let row = [
            cell(e.id, 7),
            cell(e.timestamp, 17),
            cell(e.process, 8),
            format!(" {:<37} ", cmdline(&e.name, &e.argv)),
        ];
        writeln!(out, "{}", join(&row))?;
        writeln!(out, "{}", EXECUTED)?;
    }

    Ok(())
}

pub fn files<W: Write>(files: &[OpenedFile], out: &mut W) -> Result<()> {
    writeln!(out, "\nFiles:")?;
    writeln!(out, "{}", FILES)?;
    writeln!(out, "|   id   |     timestamp    | process | mode | name                           |")?;
    writeln!(out, "{}", FILES)?;

    for f in files {
        let row = [
            cell(f.id, 7),
            cell(f.timestamp, 17),
            cell(f.process, 8),
            cell(f.mode.0 as i64, 5),
            format!(" {:<30} ", f.name),
        ];
        writeln!(out, "{}", join(&row))?;
        writeln!(out, "{}", FILES)?;
    }

    Ok(())
}

/// Right-aligned integer in `width` columns, a blank standing in for
/// the sign of positive values, followed by a separating space.
pub fn cell(n: i64, width: usize) -> String {
    let n = match n {
        n if n < 0 => n.to_string(),
        n          => format!(" {}", n),
    };
    format!("{:>1$} ", n, width)
}

pub fn exit(raw: i32) -> String {
    match Status::decode(raw) {
        Status::Signaled(sig) => format!(" sig{:<2} ", sig),
        Status::Exited(code)  => format!("    {:<2} ", code),
    }
}

pub fn cpu(millis: Option<i64>) -> String {
    match millis {
        Some(ms) if ms >= 0 => format!("{:>9} ", format!(" {:.2}", ms as f64 * 0.001)),
        _                   => blank(10),
    }
}

fn blank(width: usize) -> String {
    " ".repeat(width)
}

fn join(cells: &[String]) -> String {
    format!("|{}|", cells.join("|"))
}
