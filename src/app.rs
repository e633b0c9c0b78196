use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    app_info::AppInfo,
    config::{Config, ConfigurationError},
    directory::{IdentityDirectory, SupabaseDirectory},
    environment::Environment,
    mailer::Mailer,
    reset::ResetClients,
};

#[derive(Clone, Debug)]
pub struct App {
    pub config: Config,
    pub environment: Environment,
    pub clients: ResetClients,
}

impl App {
    /// Wire the directory client and mailer described by `config`.
    ///
    /// A missing directory endpoint or key does not fail startup; it is kept
    /// in [`ResetClients`] and reported on every reset request instead.
    pub fn new(environment: Environment, config: Config) -> Result<Self, reqwest::Error> {
        let client = http_client(&config)?;

        let directory = SupabaseDirectory::from_config(client.clone(), &config.directory)
            .map(|directory| Arc::new(directory) as Arc<dyn IdentityDirectory>);
        if let Err(error) = &directory {
            warn!(%error, "identity directory is not usable, reset requests will fail");
        }

        let mailer = Mailer::from_config(&config.email, client).unwrap_or_else(|error| {
            error!(%error, "invalid email configuration, notifications disabled");
            Mailer::Disabled
        });
        info!(transport = mailer.kind(), "email notifications configured");

        let clients = ResetClients {
            directory,
            notifier: Arc::new(mailer),
        };

        Ok(Self {
            config,
            environment,
            clients,
        })
    }

    pub fn with_clients(environment: Environment, config: Config, clients: ResetClients) -> Self {
        Self {
            config,
            environment,
            clients,
        }
    }

    pub fn readiness(&self) -> Result<(), ReadinessError> {
        match &self.clients.directory {
            Ok(_) => Ok(()),
            Err(error) => Err(ReadinessError::DirectoryUnavailable(error.clone())),
        }
    }
}

/// Shared HTTP client for the directory and the email API.
///
/// The per-request timeout matches the pipeline step timeout.
fn http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(AppInfo::current().user_agent())
        .timeout(config.reset.step_timeout())
        .build()
}

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Identity directory unavailable: {0}")]
    DirectoryUnavailable(ConfigurationError),
}

impl IntoResponse for ReadinessError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}
