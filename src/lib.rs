pub mod app;
pub mod cli;
pub mod command_list;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod ssh;
pub mod ui;
pub mod utils;

pub use cli::Cli;
pub use command_list::{Command, CommandList};
pub use config::Config;
pub use endpoint::{Auth, Credentials, Endpoint};
pub use error::{CommandExecutionError, ConfigError, ConnectionError};
pub use executor::{CommandResult, ExecutionReport, ParallelRunner, SequentialRunner};
pub use ssh::{Session, SessionState};
