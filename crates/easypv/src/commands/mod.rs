//! Command dispatch: bridges CLI args -> coordinator -> output formatting.

pub mod devices;
pub mod login;
pub mod logout;
pub mod panels;
pub mod stations;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => login::handle(args, global).await,
        Command::Logout => logout::handle(global),
        Command::Stations => stations::handle(global).await,
        Command::Devices(args) => devices::handle(args, global).await,
        Command::Panels(args) => panels::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}
