use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

/// Record a step output. Appends to the `GITHUB_OUTPUT` file when the runner
/// provides one; otherwise prints the value to stdout for local runs.
#[instrument(skip(value), fields(value_len = value.len()))]
pub fn set_output(name: &str, value: &str) -> std::io::Result<()> {
    match std::env::var_os("GITHUB_OUTPUT").filter(|p| !p.is_empty()) {
        Some(path) => {
            debug!("appending step output to GITHUB_OUTPUT");
            append_output(Path::new(&path), name, value)
        }
        None => {
            debug!("GITHUB_OUTPUT not set, printing output");
            println!("{value}");
            Ok(())
        }
    }
}

/// Annotate the run as failed. The caller is responsible for the exit code.
pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}

/// Ask the runner to redact `value` from all subsequent log output.
pub fn add_mask(value: &str) {
    if !value.is_empty() {
        println!("::add-mask::{}", escape_data(value));
    }
}

fn append_output(path: &Path, name: &str, value: &str) -> std::io::Result<()> {
    let delimiter = unique_delimiter(name, value);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format_output_entry(name, value, &delimiter).as_bytes())
}

/// Multi-line `name<<DELIMITER` entry, safe for values containing newlines.
fn format_output_entry(name: &str, value: &str, delimiter: &str) -> String {
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn unique_delimiter(name: &str, value: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut delimiter = format!("ghadelimiter_{}_{nanos}", std::process::id());
    while name.contains(&delimiter) || value.contains(&delimiter) {
        delimiter.push('_');
    }
    delimiter
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
