//! External command helpers shared by the command-backed camera and classifier

use std::path::Path;
use std::process::Stdio;

use serde_json::Value;
use tokio::process::Command;

/// Captured result of an external command
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Replace `placeholder` with `path` in every argument
pub(crate) fn render_argv(argv: &[String], placeholder: &str, path: &Path) -> Vec<String> {
    let path = path.to_string_lossy();
    argv.iter()
        .map(|arg| arg.replace(placeholder, &path))
        .collect()
}

/// Run argv to completion; a non-zero exit is an error carrying stderr
pub(crate) async fn run(argv: &[String]) -> Result<CommandOutput, String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| "empty command".to_string())?;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("failed to spawn '{program}': {e}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let detail = stderr.trim();
        return Err(match output.status.code() {
            Some(code) => format!("'{program}' exited with status {code}: {detail}"),
            None => format!("'{program}' terminated by signal: {detail}"),
        });
    }
    Ok(CommandOutput { stdout, stderr })
}

/// Extract the JSON object printed on stdout
///
/// Tools tend to mix progress lines with the payload, so the outermost
/// `{ ... }` span is parsed when the whole output is not valid JSON.
pub(crate) fn extract_json(stdout: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(stdout.trim()) {
        return Some(value);
    }
    let start = stdout.find('{')?;
    let end = stdout.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&stdout[start..=end]).ok()
}
