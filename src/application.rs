use crate::config::Settings;
use crate::gateway::{BackendHosts, GatewayService};
use crate::Result;
use tracing::{info, instrument};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    router: axum::Router,
}

impl Application {
    #[instrument]
    pub async fn new() -> Result<Self> {
        let settings = Settings::new()?;

        info!(
            record_host = %settings.backends.record_host,
            replay_host = %settings.backends.replay_host,
            "Configuring gateway backends"
        );

        let hosts = BackendHosts {
            record: settings.backends.record_host.clone(),
            replay: settings.backends.replay_host.clone(),
        };
        let service = GatewayService::new(hosts, settings.request_timeout());
        let router = service.into_router();

        Ok(Self { settings, router })
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        let addr = format!(
            "{}:{}",
            self.settings.application.host, self.settings.application.port
        );
        info!("Starting warcgate server on {addr}");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router).await?;

        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
