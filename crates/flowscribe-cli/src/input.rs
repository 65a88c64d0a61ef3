//! Prompt input. Only plain text is read here; richer document extraction
//! happens elsewhere and hands over a string.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("the description is empty")]
    Empty,

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read stdin: {0}")]
    Stdin(#[source] io::Error),
}

/// Resolve the prompt from `--text`, `--file` or stdin, in that order.
pub fn read_prompt(text: Option<&str>, file: Option<&Path>) -> Result<String, InputError> {
    let raw = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?,
        (None, None) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(InputError::Stdin)?;
            buf
        }
    };
    require_text(raw)
}

/// An empty extraction is invalid input; it never reaches the generator.
pub fn require_text(raw: String) -> Result<String, InputError> {
    if raw.trim().is_empty() {
        Err(InputError::Empty)
    } else {
        Ok(raw)
    }
}
