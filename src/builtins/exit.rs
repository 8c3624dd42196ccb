use std::io::Write;
use std::process;

use log::info;

use super::BuiltinCommand;
use crate::errors::Result;
use crate::shell::Shell;

pub struct Exit;

impl BuiltinCommand for Exit {
    const NAME: &'static str = super::EXIT_NAME;

    const HELP: &'static str = "\
Usage: exit

Terminate the shell process immediately with success status.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, _args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        info!("tsh exiting");
        process::exit(0);
    }
}
