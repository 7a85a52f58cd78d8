//! Backend health check.

use std::io::Write;

use little_sun_dashboard::DashboardConfig;
use little_sun_dashboard::api::ApiClient;

use super::CommandError;

/// Query the backend health endpoint and print its status.
///
/// # Errors
///
/// Returns an error if the request fails or the backend is not healthy.
pub async fn run(config: &DashboardConfig) -> Result<(), CommandError> {
    let client = ApiClient::new(config)?;
    let health = client.health().await?;

    writeln!(
        std::io::stdout(),
        "{}: {}",
        client.base_url(),
        health.status
    )?;

    if health.is_ok() {
        Ok(())
    } else {
        Err(CommandError::Unhealthy(health.status))
    }
}
