use std::env;
use std::io::Write;

use failure::ResultExt;
use log::debug;
use serde_derive::Deserialize;

use super::{parse_args, BuiltinCommand};
use crate::errors::{Error, ErrorKind, Result};
use crate::shell::Shell;

pub struct Cd;

#[derive(Debug, Deserialize)]
struct CdArgs {
    arg_dir: Option<String>,
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = super::CD_NAME;

    const HELP: &'static str = "\
Usage: cd [<dir>]

Change the working directory to DIR. With no argument, change to the home
directory. A DIR starting with `~` is taken relative to the home directory;
one starting with `.` or anything else relative to the working directory.

A failure to change directory is fatal to the shell.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let parsed: Result<CdArgs> = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref));
        let dir = match parsed {
            Ok(parsed) => parsed.arg_dir,
            // Extra arguments are ignored; the first one wins.
            Err(_) => args.first().map(|arg| arg.as_ref().to_string()),
        };

        let home = dirs::home_dir()
            .ok_or_else(|| Error::builtin_command("cd: unable to determine home directory", 1))?;
        let cwd = env::current_dir().context(ErrorKind::Io)?;
        let target = resolve_target(
            dir.as_ref().map(String::as_str),
            &cwd.to_string_lossy(),
            &home.to_string_lossy(),
        );
        debug!("cd: changing directory to {}", target);

        env::set_current_dir(&target).with_context(|_| ErrorKind::BuiltinCommand {
            message: format!("cd: {}: unable to change directory", target),
            code: 1,
        })?;
        Ok(())
    }
}

/// Builds the directory to change to, by literal string construction:
///
/// - no argument: the home directory;
/// - a leading `/`: the argument itself;
/// - a leading `~`: the rest of the argument appended to the home directory
///   (no separator is inserted, so `~x` with home `/home/u` is `/home/ux`);
/// - `..`: the working directory with its last component dropped, then the
///   rest of the argument appended;
/// - any other leading `.`: the rest of the argument appended to the working
///   directory;
/// - anything else: the argument appended to the working directory.
fn resolve_target(arg: Option<&str>, cwd: &str, home: &str) -> String {
    let arg = match arg {
        Some(arg) => arg,
        None => return home.to_string(),
    };

    match arg.as_bytes().first() {
        Some(b'/') => arg.to_string(),
        Some(b'~') => format!("{}{}", home, &arg[1..]),
        Some(b'.') => {
            if arg.as_bytes().get(1) == Some(&b'.') {
                let parent = &cwd[..cwd.rfind('/').unwrap_or(0)];
                format!("{}/{}", parent, &arg[2..])
            } else {
                format!("{}{}", cwd, &arg[1..])
            }
        }
        _ => format!("{}/{}", cwd, arg),
    }
}
