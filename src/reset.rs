//! The credential reset pipeline.
//!
//! `Received → Validated → {Found | NotFound} → [Generated → Updated] →
//! Notified (best-effort) → Responded`. Every path ends in exactly one
//! [`ResetOutcome`].
//!
//! Found and not-found both resolve to a success outcome. That is the
//! anti-enumeration policy of this endpoint and must stay that way.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    config::{ConfigurationError, ResetConfig},
    credential::TemporaryCredential,
    directory::{DirectoryError, IdentityDirectory},
    emails::{password_reset_email, EmailError, Notifier},
};

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const CONFIGURATION_ERROR: &str = "Server configuration error";
pub const LOOKUP_FAILED: &str = "Failed to fetch users";
pub const UPDATE_FAILED: &str = "Failed to reset password";
pub const ACCOUNT_NOT_FOUND_MESSAGE: &str =
    "If an account exists with this email, a password reset link has been sent.";
pub const RESET_SENT_MESSAGE: &str = "Password reset email has been sent";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ResetRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub email: String,
}

impl ResetRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    fn email(&self) -> &str {
        self.email.trim()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(EMAIL_REQUIRED.into());
        return Err(error);
    }
    Ok(())
}

/// Whether the directory held an account for the requested email.
///
/// Only selects the success message; both map to the same status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Found,
    NotFound,
}

/// The only thing that crosses back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    GenericSuccess(AccountStatus),
    ValidationFailed(&'static str),
    ServerError(&'static str),
}

impl ResetOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::GenericSuccess(AccountStatus::Found) => RESET_SENT_MESSAGE,
            Self::GenericSuccess(AccountStatus::NotFound) => ACCOUNT_NOT_FOUND_MESSAGE,
            Self::ValidationFailed(reason) | Self::ServerError(reason) => *reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("invalid reset request: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("directory lookup failed: {0}")]
    Lookup(#[source] DirectoryError),
    #[error("credential update failed: {0}")]
    Update(#[source] DirectoryError),
}

impl From<ResetError> for ResetOutcome {
    fn from(error: ResetError) -> Self {
        match error {
            ResetError::Validation(_) => Self::ValidationFailed(EMAIL_REQUIRED),
            ResetError::Configuration(error) => {
                error!(%error, "credential reset is misconfigured");
                Self::ServerError(CONFIGURATION_ERROR)
            }
            ResetError::Lookup(error) => {
                error!(%error, "directory lookup failed");
                Self::ServerError(LOOKUP_FAILED)
            }
            ResetError::Update(error) => {
                error!(%error, "credential update failed");
                Self::ServerError(UPDATE_FAILED)
            }
        }
    }
}

/// Upstream collaborators of the pipeline.
///
/// `directory` holds the configuration error when the deployment lacks the
/// directory endpoint or service key, so requests can fail without any
/// upstream call.
#[derive(Clone)]
pub struct ResetClients {
    pub directory: Result<Arc<dyn IdentityDirectory>, ConfigurationError>,
    pub notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for ResetClients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetClients")
            .field("directory_configured", &self.directory.is_ok())
            .finish_non_exhaustive()
    }
}

impl ResetClients {
    pub fn new(directory: Arc<dyn IdentityDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            directory: Ok(directory),
            notifier,
        }
    }

    pub fn unconfigured(error: ConfigurationError, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            directory: Err(error),
            notifier,
        }
    }
}

/// Runs one reset request to completion.
#[instrument(skip_all)]
pub async fn reset_credential(
    request: ResetRequest,
    config: &ResetConfig,
    clients: &ResetClients,
) -> ResetOutcome {
    match run(&request, config, clients).await {
        Ok(status) => ResetOutcome::GenericSuccess(status),
        Err(error) => error.into(),
    }
}

async fn run(
    request: &ResetRequest,
    config: &ResetConfig,
    clients: &ResetClients,
) -> Result<AccountStatus, ResetError> {
    request.validate()?;
    let directory = clients.directory.as_ref().map_err(ConfigurationError::clone)?;
    let step_timeout = config.step_timeout();

    let lookup = bounded(step_timeout, directory.find_by_email(request.email())).await;
    let Some(record) = lookup.map_err(ResetError::Lookup)? else {
        info!("no account matched reset request");
        return Ok(AccountStatus::NotFound);
    };

    let credential = TemporaryCredential::generate();
    bounded(
        step_timeout,
        directory.update_credential(&record.id, &credential),
    )
    .await
    .map_err(ResetError::Update)?;
    info!(user_id = %record.id, "issued temporary credential");

    let payload = password_reset_email(&config.product_name, &record.email, &credential);
    drop(credential);

    let delivery = match payload {
        Ok(payload) => tokio::time::timeout(step_timeout, clients.notifier.send(payload))
            .await
            .unwrap_or(Err(EmailError::Timeout(step_timeout))),
        Err(error) => Err(error),
    };
    if let Err(error) = delivery {
        warn!(user_id = %record.id, %error, "failed to deliver temporary credential");
    }

    Ok(AccountStatus::Found)
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, DirectoryError>>,
) -> Result<T, DirectoryError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(DirectoryError::Timeout(limit)))
}
