use std::process::Command;

use tracing::debug;

use crate::value::Value;

/// Runs source text in a native language and hands back a [`Value`]. No host
/// is bound unless the caller opts in through [`Config`](crate::Config).
pub trait Host {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Run `code` natively. The error string becomes the message of the
    /// interpretation error.
    fn execute(&self, code: &str) -> Result<Value, String>;
}

/// Runs code with `sh -c`. Standard output (without its trailing newline) is the
/// result, read as a number when it is spelled with digits.
#[derive(Debug, Default)]
pub struct ShellHost;

impl Host for ShellHost {
    fn name(&self) -> &str {
        "sh"
    }

    fn execute(&self, code: &str) -> Result<Value, String> {
        debug!(code, "running shell host code");

        let output = Command::new("sh")
            .arg("-c")
            .arg(code)
            .output()
            .map_err(|err| format!("failed to start sh: {}", err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("sh exited with {}: {}", output.status, stderr.trim_end()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim_end_matches(&['\n', '\r'][..]);

        Ok(match parse_numeric(stdout.trim()) {
            Some(number) => Value::Number(number),
            None => Value::String(stdout.to_owned()),
        })
    }
}

// Words such as `nan` or `inf` parse as floats but stay strings here
fn parse_numeric(text: &str) -> Option<f64> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    match unsigned.chars().next() {
        Some(c) if c.is_ascii_digit() || c == '.' => text.parse().ok(),
        _ => None,
    }
}
