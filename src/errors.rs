//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn builtin_command<T: AsRef<str>>(message: T, code: i32) -> Error {
        Error::from(ErrorKind::BuiltinCommand {
            message: message.as_ref().to_string(),
            code,
        })
    }

    pub(crate) fn command_not_found<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::CommandNotFound(command.as_ref().to_string()))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.ctx.fmt(f)
    }
}

/// The kinds of failure the shell core can report.
///
/// The first group is the parse-time grammar taxonomy; parse errors are
/// returned to the caller and never terminate the shell. The remaining kinds
/// cover builtin and process-management failures, which callers are expected
/// to treat as fatal (see `Shell::execute`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    MisusedBackground,
    PipeMissingCommand,
    TooManyCommands,
    TooManyArgs,
    MultipleRedirections,
    NoRedirectFilename,
    RedirectMissingCommand,
    RedirectedToTooManyFiles,
    RedundantPipeRedirection,
    BuiltinCommand { message: String, code: i32 },
    CommandNotFound(String),
    Redirect(String),
    Docopt,
    Io,
    Nix,
}

impl ErrorKind {
    /// `true` for grammar violations returned by the sequence parser.
    pub fn is_parse_error(&self) -> bool {
        match *self {
            ErrorKind::MisusedBackground
            | ErrorKind::PipeMissingCommand
            | ErrorKind::TooManyCommands
            | ErrorKind::TooManyArgs
            | ErrorKind::MultipleRedirections
            | ErrorKind::NoRedirectFilename
            | ErrorKind::RedirectMissingCommand
            | ErrorKind::RedirectedToTooManyFiles
            | ErrorKind::RedundantPipeRedirection => true,
            _ => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::MisusedBackground => {
                write!(f, "syntax error: misused background marker")
            }
            ErrorKind::PipeMissingCommand => write!(f, "syntax error: pipe missing a command"),
            ErrorKind::TooManyCommands => write!(f, "syntax error: too many pipeline commands"),
            ErrorKind::TooManyArgs => write!(f, "syntax error: too many arguments"),
            ErrorKind::MultipleRedirections => {
                write!(f, "syntax error: stream redirected more than once")
            }
            ErrorKind::NoRedirectFilename => {
                write!(f, "syntax error: redirection without a file name")
            }
            ErrorKind::RedirectMissingCommand => {
                write!(f, "syntax error: redirection without a command")
            }
            ErrorKind::RedirectedToTooManyFiles => {
                write!(f, "syntax error: redirected to too many files")
            }
            ErrorKind::RedundantPipeRedirection => {
                write!(f, "syntax error: output both piped and redirected")
            }
            ErrorKind::BuiltinCommand { ref message, .. } => write!(f, "{}", message),
            ErrorKind::CommandNotFound(ref program) => {
                write!(f, "{}: command not found", program)
            }
            ErrorKind::Redirect(ref filename) => {
                write!(f, "{}: unable to open for appending", filename)
            }
            ErrorKind::Docopt => write!(f, "Docopt error occurred"),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
