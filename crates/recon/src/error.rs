use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, unknown stage, open spelling table, etc.).
    ConfigValidation(String),
    /// An input collection is unreadable as a whole (invalid JSON, wrong top-level shape).
    InputParse { input: String, message: String },
    /// Output rendering failed.
    Serialize(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InputParse { input, message } => {
                write!(f, "input '{input}': {message}")
            }
            Self::Serialize(msg) => write!(f, "serialize error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
