use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub fn find_bin(command: &str) -> Option<PathBuf> {
    let path = Path::new(command);
    if path.components().count() > 1 && path.is_file() {
        return Some(path.to_path_buf());
    }

    if let Ok(found) = which::which(command) {
        return Some(found);
    }

    default_search_paths()
        .into_iter()
        .map(|dir| dir.join(command))
        .find(|candidate| candidate.is_file())
}

/// Runs `program` with `args`, optionally feeding `input` on stdin, and
/// returns stdout. A non-zero exit becomes an error carrying stderr.
pub async fn run(program: &str, args: &[String], input: Option<&[u8]>) -> Result<String> {
    let bin = find_bin(program).with_context(|| format!("resolve `{program}` path"))?;
    let label = match args.first() {
        Some(sub) => format!("{program} {sub}"),
        None => program.to_string(),
    };

    let mut child = Command::new(&bin)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn `{label}`"))?;

    if let Some(bytes) = input
        && let Some(mut stdin) = child.stdin.take()
    {
        stdin
            .write_all(bytes)
            .await
            .with_context(|| format!("write payload to `{label}` stdin"))?;
    }

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("run `{label}`"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        return Err(anyhow::anyhow!("`{label}` failed: {detail}"));
    }

    String::from_utf8(output.stdout).with_context(|| format!("decode `{label}` stdout"))
}

fn default_search_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/usr/bin"),
            PathBuf::from("/bin"),
        ]
    }
    #[cfg(target_os = "linux")]
    {
        vec![
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/usr/bin"),
            PathBuf::from("/bin"),
        ]
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Vec::new()
    }
}
