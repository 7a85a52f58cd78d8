//! One-shot logout.

use std::io::Write;

use little_sun_dashboard::{Dashboard, DashboardConfig};

use super::CommandError;

/// Log out and remove the session from the state file.
///
/// # Errors
///
/// Returns an error if the state file cannot be read or written.
pub async fn run(config: DashboardConfig) -> Result<(), CommandError> {
    let (dashboard, store) = Dashboard::open(config)?;
    dashboard.logout().await?;

    writeln!(
        std::io::stdout(),
        "Logged out ({} cleared)",
        store.path().display()
    )?;
    Ok(())
}
