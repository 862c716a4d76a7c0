mod command;
pub use command::{Command, ParseError};

mod report;
pub use report::{Report, ReportKind};

mod config;
pub use config::{Config, ConfigError, LISTEN_PORT};

pub mod avwx;
pub use avwx::{AvwxClient, FetchError, TransportError};

pub mod twilio;
pub use twilio::{SendError, TwilioClient};

pub mod handler;
pub use handler::{Messenger, Weather};

mod inbound;
pub use inbound::{only_valid_chars, Inbound, Rejection};

pub mod server;

#[cfg(test)]
mod testing;
