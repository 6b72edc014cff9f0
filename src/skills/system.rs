//! Local machine control: applications, files, display, network, power, projects

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::matcher::tokens;
use crate::{Error, Result};

/// Words that never name an application
const APP_FILLER: &[&str] = &[
    "open", "launch", "run", "start", "the", "app", "application", "program", "please", "up", "for",
    "me", "my", "a",
];

/// Most matches reported by file search
const MAX_FILE_MATCHES: usize = 20;

/// Launch the first application named in the utterance that exists on `PATH`
pub(super) async fn open_app(utterance: &str) -> Result<String> {
    let words: Vec<String> = tokens(utterance)
        .into_iter()
        .filter(|w| !APP_FILLER.contains(&w.as_str()))
        .collect();
    if words.is_empty() {
        return Ok(String::new());
    }

    let mut candidates = vec![words.join("-"), words.join("")];
    candidates.extend(words.iter().cloned());

    for name in candidates {
        if let Ok(path) = which::which(&name) {
            tokio::process::Command::new(&path)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn()
                .map_err(|e| Error::Skill(format!("failed to launch {name}: {e}")))?;
            tracing::info!(app = %name, path = %path.display(), "launched application");
            return Ok(format!("Opening {name}."));
        }
    }

    tracing::debug!(?words, "no matching application on PATH");
    Ok(String::new())
}

/// Search `roots` breadth-first up to `depth` for files whose name contains `keyword`
pub(super) fn find_files(roots: &[PathBuf], depth: usize, keyword: &str) -> Vec<PathBuf> {
    let needle = keyword.trim().to_lowercase();
    let squashed = needle.replace(' ', "");
    if needle.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut queue: VecDeque<(PathBuf, usize)> = roots.iter().map(|r| (r.clone(), 0)).collect();

    while let Some((dir, level)) = queue.pop_front() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.starts_with('.') {
                continue;
            }
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if level < depth {
                    queue.push_back((entry.path(), level + 1));
                }
            } else if name.contains(&needle) || name.contains(&squashed) {
                found.push(entry.path());
                if found.len() >= MAX_FILE_MATCHES {
                    return found;
                }
            }
        }
    }
    found
}

/// Spoken summary of a file search
#[must_use]
pub(super) fn describe_matches(keyword: &str, found: &[PathBuf]) -> String {
    match found {
        [] => String::new(),
        [only] => format!("I found {keyword} at {}.", only.display()),
        [first, rest @ ..] => format!(
            "I found {} files matching {keyword}. The first one is {}.",
            rest.len() + 1,
            first.display()
        ),
    }
}

async fn run(program: &Path, args: &[&str]) -> Result<()> {
    let status = tokio::process::Command::new(program)
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map_err(|e| Error::Skill(format!("failed to run {}: {e}", program.display())))?;
    if !status.success() {
        return Err(Error::Skill(format!(
            "{} exited with {status}",
            program.display()
        )));
    }
    Ok(())
}

fn first_number(utterance: &str) -> Option<u8> {
    tokens(utterance)
        .iter()
        .find_map(|t| t.trim_end_matches('%').parse::<u8>().ok())
        .map(|n| n.min(100))
}

/// Adjust screen brightness through `brightnessctl`
pub(super) async fn brightness(utterance: &str) -> Result<String> {
    let Ok(tool) = which::which("brightnessctl") else {
        tracing::debug!("brightnessctl not installed");
        return Ok(String::new());
    };

    let words = tokens(utterance);
    let has = |w: &str| words.iter().any(|t| t == w);
    let (arg, reply) = if let Some(level) = first_number(utterance) {
        (format!("{level}%"), format!("Brightness set to {level} percent."))
    } else if has("increase") || has("up") || has("raise") {
        ("+10%".to_string(), "Brightness increased.".to_string())
    } else if has("decrease") || has("down") || has("lower") || has("dim") {
        ("10%-".to_string(), "Brightness decreased.".to_string())
    } else {
        return Ok(String::new());
    };

    run(&tool, &["set", &arg]).await?;
    Ok(reply)
}

/// Toggle Wi-Fi through `nmcli`
pub(super) async fn wifi(utterance: &str) -> Result<String> {
    let Ok(tool) = which::which("nmcli") else {
        tracing::debug!("nmcli not installed");
        return Ok(String::new());
    };

    let words = tokens(utterance);
    let state = if words.iter().any(|w| w == "off" || w == "disable") {
        "off"
    } else if words.iter().any(|w| w == "on" || w == "enable") {
        "on"
    } else {
        return Ok(String::new());
    };

    run(&tool, &["radio", "wifi", state]).await?;
    Ok(format!("Wi-Fi turned {state}."))
}

/// Schedule a shutdown or restart one minute out
///
/// A reply starting with "Ok!" means the machine is going down.
pub(super) async fn power(utterance: &str, allowed: bool) -> Result<String> {
    let words = tokens(utterance);
    let restart = words.iter().any(|w| w == "restart" || w == "reboot");
    let shutdown = words.iter().any(|w| w == "shutdown");
    if !restart && !shutdown {
        return Ok(String::new());
    }
    if !allowed {
        return Ok("Power control is disabled in my settings.".to_string());
    }

    let tool = which::which("shutdown")
        .map_err(|e| Error::Skill(format!("shutdown not available: {e}")))?;
    if restart {
        run(&tool, &["-r", "+1"]).await?;
        Ok("Ok! The system will restart in one minute.".to_string())
    } else {
        run(&tool, &["-h", "+1"]).await?;
        Ok("Ok! The system will shut down in one minute.".to_string())
    }
}

/// Starter file for a language
fn starter(language: &str) -> (&'static str, String) {
    match language {
        "python" => ("main.py", "print(\"Hello, world!\")\n".to_string()),
        "javascript" | "node" => ("index.js", "console.log(\"Hello, world!\");\n".to_string()),
        "rust" => ("main.rs", "fn main() {\n    println!(\"Hello, world!\");\n}\n".to_string()),
        "go" => (
            "main.go",
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello, world!\")\n}\n"
                .to_string(),
        ),
        "c" => (
            "main.c",
            "#include <stdio.h>\n\nint main(void) {\n    printf(\"Hello, world!\\n\");\n    return 0;\n}\n"
                .to_string(),
        ),
        other => ("README.md", format!("# New {other} project\n")),
    }
}

/// Create `<projects_dir>/<name>` (suffixed if taken) with a starter file
pub(super) async fn new_project(projects_dir: &Path, language: &str, name: &str) -> Result<String> {
    let language = language.trim().to_lowercase();

    let mut dir = projects_dir.join(name);
    let mut suffix = 1;
    while tokio::fs::try_exists(&dir).await? {
        suffix += 1;
        dir = projects_dir.join(format!("{name}{suffix}"));
    }

    tokio::fs::create_dir_all(&dir).await?;
    let (file, contents) = starter(&language);
    tokio::fs::write(dir.join(file), contents).await?;

    tracing::info!(path = %dir.display(), %language, "created project");
    Ok(format!("Your {language} project is ready in {}.", dir.display()))
}
