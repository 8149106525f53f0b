//! CLI module for aerocrud
//!
//! Provides command-line interface for:
//! - serve: host the demo resources over HTTP
//! - routes: print the routes the demo resources mount

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    demo_registry, load_config, route_table, routes, run, run_command, serve, user_context,
    Member, MemberSummary, RouteInfo, USER_CONTEXT_KEY, USER_HEADER,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json;
