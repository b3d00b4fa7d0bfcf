//! Typed command-line descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One external program with its arguments, optionally piping its standard
/// output into a further invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pipe_into: Option<Box<Invocation>>,
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            pipe_into: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a path argument.
    #[must_use]
    pub fn arg_path(self, path: impl AsRef<Path>) -> Self {
        let arg = path.as_ref().to_string_lossy().into_owned();
        self.arg(arg)
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Pipes this invocation's standard output into `next`.
    ///
    /// Piping onto an invocation that already pipes appends `next` to the
    /// end of the chain.
    #[must_use]
    pub fn pipe(mut self, next: Self) -> Self {
        self.pipe_into = Some(Box::new(match self.pipe_into.take() {
            Some(existing) => existing.pipe(next),
            None => next,
        }));
        self
    }

    /// The program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments, not including the program.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Iterates over every invocation of the pipe chain, starting with this one.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |inv| inv.pipe_into.as_deref())
    }

    /// Returns true if any invocation in the chain runs `program`.
    #[must_use]
    pub fn runs(&self, program: &str) -> bool {
        self.chain().any(|inv| inv.program == program)
    }

    /// Renders this invocation alone, ignoring any pipe.
    #[must_use]
    pub fn own_command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Renders the full chain the way an operator would type it.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.chain()
            .map(Self::own_command_line)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
