mod bulk_update;
pub mod config;
pub mod cors;
pub mod errors;
pub mod metrics_defs;
pub mod rate_limit;
pub mod service;
#[cfg(test)]
mod testutils;
pub mod upstream;

pub use errors::RelayError;
pub use service::RelayService;

use shared::admin_service::AdminService;
use shared::http::run_http_service;

/// Run the relay, and the admin listener when one is configured, until a
/// listener fails.
pub async fn run(config: config::Config) -> Result<(), RelayError> {
    config.validate()?;

    let relay = RelayService::new(&config)?;
    tracing::info!(
        upstream = %config.github_api_url,
        allowed_origins = ?config.allowed_origins,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "starting relay"
    );

    let relay_task = run_http_service(&config.listener.host, config.listener.port, relay);

    match &config.admin_listener {
        Some(admin) => {
            let admin_task =
                run_http_service(&admin.host, admin.port, AdminService::new(|| true));
            tokio::try_join!(relay_task, admin_task)?;
        }
        None => relay_task.await?,
    }

    Ok(())
}
