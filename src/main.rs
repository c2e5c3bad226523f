//! Gmail relay server binary.

// crates.io
use color_eyre::{Result, eyre::WrapErr};
use tokio::net::TcpListener;
// self
use gmail_relay::{
	api::{self, AppState},
	config::Config,
	obs,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	obs::init_subscriber();

	let config = Config::from_env().wrap_err("Failed to load relay configuration.")?;
	let state = AppState::from_config(&config).wrap_err("Failed to build relay state.")?;
	let listener = TcpListener::bind(config.listen)
		.await
		.wrap_err_with(|| format!("Failed to bind {}.", config.listen))?;

	tracing::info!(
		version = env!("CARGO_PKG_VERSION"),
		addr = %listener.local_addr()?,
		"Gmail relay listening; open /auth in a browser to connect a mailbox."
	);

	api::serve(listener, state, shutdown_signal()).await?;

	tracing::info!("Gmail relay stopped.");

	Ok(())
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "Failed to listen for the shutdown signal.");

		std::future::pending::<()>().await;
	}
}
