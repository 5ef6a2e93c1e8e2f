use std::io::Write;
use std::process::{Command, Stdio};

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("cmd", &["/C", "clip"])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copy `text` to the system clipboard via the first platform command that
/// accepts it on stdin.
pub fn copy_to_clipboard(text: &str) -> Result<(), String> {
    for (program, args) in CLIPBOARD_COMMANDS {
        if pipe_to_command(program, args, text).is_ok() {
            return Ok(());
        }
    }
    Err(format!(
        "no working clipboard command (tried {})",
        CLIPBOARD_COMMANDS
            .iter()
            .map(|(program, _)| *program)
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

fn pipe_to_command(program: &str, args: &[&str], input: &str) -> Result<(), String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| format!("`{program}` unavailable: {err}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(input.as_bytes());
    }

    match child.wait() {
        Ok(status) if status.success() => Ok(()),
        _ => Err(format!("`{program}` failed")),
    }
}
