use serde::{Deserialize, Serialize};
use std::fmt;

/// First problem the static validator found in a script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationFinding {
    SyntaxError {
        message: String,
    },
    UnknownStandaloneFunction {
        name: String,
        suggestion: Option<String>,
    },
    UnknownKeyword {
        found: String,
        suggestion: String,
    },
    NoRecognizedCommands,
    UnknownMethod {
        name: String,
        suggestion: Option<String>,
    },
    /// The validator's pattern tables could not be built; nothing was checked.
    ValidatorUnavailable,
}

impl ValidationFinding {
    /// Short machine-friendly name of the finding.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SyntaxError { .. } => "syntax_error",
            Self::UnknownStandaloneFunction { .. } => "unknown_standalone_function",
            Self::UnknownKeyword { .. } => "unknown_keyword",
            Self::NoRecognizedCommands => "no_recognized_commands",
            Self::UnknownMethod { .. } => "unknown_method",
            Self::ValidatorUnavailable => "validator_unavailable",
        }
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyntaxError { message } => write!(f, "SyntaxError: {message}"),
            Self::UnknownStandaloneFunction { name, suggestion } => {
                write!(f, "Unknown function \"{name}()\".")?;
                match suggestion {
                    Some(keyword) => write!(f, " Did you mean \"{keyword}\"?"),
                    None => write!(
                        f,
                        " Only test(), expect(), describe() and standard JavaScript functions are available."
                    ),
                }
            }
            Self::UnknownKeyword { found, suggestion } => {
                write!(f, "Unknown keyword \"{found}\". Did you mean \"{suggestion}\"?")
            }
            Self::NoRecognizedCommands => write!(
                f,
                "No Playwright commands found. A test needs test(...), expect(...) or page.* calls."
            ),
            Self::UnknownMethod { name, suggestion } => {
                write!(f, "Unknown method \"{name}\".")?;
                match suggestion {
                    Some(method) => write!(f, " Did you mean \"{method}\"?"),
                    None => write!(f, " It is not part of the Playwright page, locator or assertion API."),
                }
            }
            Self::ValidatorUnavailable => {
                write!(f, "Static validation is unavailable; the script was not checked.")
            }
        }
    }
}
