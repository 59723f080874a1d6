use anyhow::{Context, Result, bail};
use colored::*;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Run `command` in `cwd` with inherited stdio and return its exit code.
///
/// The command line is announced first. Output of the child is not captured,
/// so errors reach the terminal exactly as the tool printed them.
pub fn run_command(command: &[String], cwd: &Path) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        bail!("Empty command");
    };

    println!("{} Running {}", "▶".cyan(), shell_join(command).bold());
    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .status()
        .with_context(|| format!("Failed to run '{}' - is it installed and on PATH?", program))?;

    Ok(exit_code(status))
}

pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// `git rev-parse --git-dir` succeeds inside a work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

pub fn git_init(dir: &Path) -> Result<i32> {
    run_command(&["git".to_string(), "init".to_string()], dir)
}

/// Whether `program --version` can be executed. Returns its first output line.
pub fn tool_version(program: &str) -> Option<String> {
    let output = Command::new(program).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(stdout.lines().next().unwrap_or("Detected").trim().to_string())
}

/// Render a command line for display, quoting arguments that need it.
pub fn shell_join(command: &[String]) -> String {
    command
        .iter()
        .map(|arg| {
            let plain = !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
            if plain {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
