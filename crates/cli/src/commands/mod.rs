//! CLI commands.

pub mod health;
pub mod logout;
pub mod render;
pub mod shell;

use std::io;

use little_sun_dashboard::DashboardError;
use little_sun_dashboard::api::ApiError;
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("backend unhealthy: {0}")]
    Unhealthy(String),
}
