use std::io;
use std::ops::Range;
use std::path::PathBuf;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read '{file}': {source}", file = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write '{file}': {source}", file = .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in '{file}': {source}", file = .path.display())]
    Json {
        path: PathBuf,
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config '{file}': {message}", file = .path.display(), message = .source.message())]
    Config {
        path: PathBuf,
        text: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CliError::Write {
            path: path.into(),
            source,
        }
    }

    /// Where in the offending file the error points, when it is known.
    fn location(&self) -> Option<(&PathBuf, &str, Range<usize>)> {
        match self {
            CliError::Json { path, text, source } if source.line() > 0 => {
                let offset = line_column_offset(text, source.line(), source.column());
                Some((path, text.as_str(), offset..(offset + 1).min(text.len())))
            }
            CliError::Config { path, text, source } => {
                source.span().map(|span| (path, text.as_str(), span))
            }
            _ => None,
        }
    }

    /// Print the error to stderr, as a source diagnostic when it has a location.
    pub fn emit(&self, color_choice: ColorChoice) {
        let Some((path, text, span)) = self.location() else {
            eprintln!("error: {}", self);
            return;
        };

        let mut files = SimpleFiles::new();
        let file_id = files.add(path.display().to_string(), text.to_string());
        let message = match self {
            CliError::Json { source, .. } => source.to_string(),
            CliError::Config { source, .. } => source.message().to_string(),
            other => other.to_string(),
        };
        let diagnostic = Diagnostic::error()
            .with_message(self.headline())
            .with_labels(vec![Label::primary(file_id, span).with_message(message)]);

        let writer = StandardStream::stderr(color_choice);
        let config = term::Config::default();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
    }

    fn headline(&self) -> String {
        match self {
            CliError::Json { path, .. } => format!("invalid JSON in '{}'", path.display()),
            CliError::Config { path, .. } => format!("invalid config '{}'", path.display()),
            other => other.to_string(),
        }
    }
}

/// Byte offset of a 1-based line and column, clamped to the text.
fn line_column_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len().saturating_sub(1))
}
