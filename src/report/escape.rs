use std::path::Path;

const SPECIAL: &[char] = &[' ', '\t', '\n', '\r', '\x0b', '\x0c', '*', '$', '\\', '"', '\''];

/// Quotes `s` for a POSIX shell when it holds whitespace or a
/// character the shell would interpret.
pub fn shell_escape(s: &str) -> String {
    if !s.contains(SPECIAL) {
        return s.to_owned();
    }

    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if let '\\' | '"' | '$' = c {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Command line of an executed file, prefixed with the image path when
/// argv[0] names neither the image nor its base name.
pub fn cmdline(name: &str, argv: &[String]) -> String {
    let line = argv.iter().map(|arg| shell_escape(arg)).collect::<Vec<_>>().join(" ");
    let base = Path::new(name).file_name().map(|s| s.to_string_lossy());

    match argv.first() {
        Some(arg0) if arg0 == name                           => line,
        Some(arg0) if base.as_deref() == Some(arg0.as_str()) => line,
        _                                                    => format!("({}) {}", shell_escape(name), line),
    }
}
