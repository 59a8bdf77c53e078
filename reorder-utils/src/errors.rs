//! Errors generated by the reordering engine.

/// Convenience wrapper to represent success or a meaningful engine error.
pub type ReorderResult<T> = std::result::Result<T, Error>;

/// Errors generated by the engine.
#[derive(Clone)]
pub struct Error {
    kind: Box<ErrorKind>,
    post_msg: Option<String>,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(post) = &self.post_msg {
            write!(f, "\n{post}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn with_post_msg(mut self, msg: Option<String>) -> Self {
        self.post_msg = msg;
        self
    }

    /// Configuration error: bad flags, unknown feature name, missing path.
    /// Fatal at startup, before any sentence is processed.
    pub fn config<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::Config(msg.to_string())),
            post_msg: None,
        }
    }

    /// Could not open or write a file. Fatal for the sentence (or the whole
    /// run, for global resources like the LM).
    pub fn io<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::Io(msg.to_string())),
            post_msg: None,
        }
    }

    /// A candidate/chop/constraints line did not parse.
    pub fn malformed_input<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::MalformedInput(msg.to_string())),
            post_msg: None,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Standard error kinds for the engine. `Invariant` violations are not
/// represented here: those are bugs and abort with `panic!`/`debug_assert!`
/// rather than being returned as `Error` (spec: "bug; abort with a
/// diagnostic").
#[derive(Clone)]
enum ErrorKind {
    /// Bad CLI flags, unknown feature name, conflicting prune modes.
    Config(String),
    /// Filesystem or I/O failure.
    Io(String),
    /// A candidate/chop/constraints/word-map line was malformed.
    MalformedInput(String),
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;
        match self {
            Config(msg) => write!(f, "[config] {msg}"),
            Io(msg) => write!(f, "[io] {msg}"),
            MalformedInput(msg) => write!(f, "[malformed input] {msg}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(e.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(e: std::num::ParseIntError) -> Self {
        Error::malformed_input(e.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(e: std::num::ParseFloatError) -> Self {
        Error::malformed_input(e.to_string())
    }
}
