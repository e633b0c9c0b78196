use std::{env, process::ExitCode, str::FromStr as _};

use clap::Parser as _;
use config_rs::{Config as ConfigRs, ConfigError};
use tracing::{debug, trace};

use crate::{
    cli::{Cli, Commands},
    commands::{check_config, serve, version},
    config::{Config, EmailConfig},
    environment::Environment,
    setup_tracing::setup_tracing_for_command,
};

const ENVIRONMENT_VARIABLE: &str = "APP_ENVIRONMENT";

/// Deployment variables recognized alongside `APP_*`, mapped onto config keys.
const DIRECTORY_ALIASES: [(&str, &str); 2] = [
    ("SUPABASE_URL", "directory.base_url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "directory.service_key"),
];

/// Deployment variable holding the Resend API key. Only meaningful when the
/// email section selects the `resend` transport.
const RESEND_API_KEY_ALIAS: &str = "RESEND_API_KEY";

pub async fn boot() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Version)) {
        version::print_version_info();
        return ExitCode::SUCCESS;
    }

    let environment = set_environment();

    let app_config = match read_config(&environment) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ Failed to load configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    setup_tracing_for_command(cli.command.as_ref(), &app_config.tracing.log_level);

    debug!("Environment set to: {:?}", environment);
    trace!("Configuration loaded: {:?}", app_config);

    handle_command(environment, app_config, cli).await
}

#[must_use]
pub fn set_environment() -> Environment {
    env::var(ENVIRONMENT_VARIABLE)
        .ok()
        .and_then(|s| Environment::from_str(&s).ok())
        .unwrap_or_default()
}

/// Layers `config/{environment}.yaml` (optional), `APP_*` variables and the
/// deployment aliases, in increasing precedence.
pub fn read_config(environment: &Environment) -> Result<Config, ConfigError> {
    let config_file_name = environment.config_file_name();

    trace!("Reading configuration from: {}", config_file_name);

    let mut builder = ConfigRs::builder()
        .add_source(config_rs::File::with_name(&config_file_name).required(false))
        .add_source(
            config_rs::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    for (variable, key) in DIRECTORY_ALIASES {
        builder = builder.set_override_option(key, env::var(variable).ok())?;
    }

    let mut config: Config = builder.build()?.try_deserialize()?;
    apply_resend_api_key(&mut config.email, env::var(RESEND_API_KEY_ALIAS).ok());

    Ok(config)
}

fn apply_resend_api_key(email: &mut EmailConfig, key: Option<String>) {
    if let (EmailConfig::Resend { api_key, .. }, Some(key)) = (email, key) {
        *api_key = Some(key);
    }
}

pub async fn handle_command(environment: Environment, config: Config, cli: Cli) -> ExitCode {
    match cli.command {
        Some(Commands::CheckConfig) => check_config::handle_check_config_command(&config),
        Some(Commands::Version) => {
            version::print_version_info();
            ExitCode::SUCCESS
        }
        Some(Commands::Serve) | None => serve::handle_serve_command(environment, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resend_config() -> EmailConfig {
        EmailConfig::Resend {
            api_key: None,
            sender: "noreply@example.com".parse().unwrap(),
            endpoint: "https://api.resend.com/emails".to_string(),
        }
    }

    #[test]
    fn test_resend_key_fills_resend_transport() {
        let mut email = resend_config();
        apply_resend_api_key(&mut email, Some("re_live_key".to_string()));

        assert!(matches!(
            email,
            EmailConfig::Resend { api_key: Some(ref key), .. } if key == "re_live_key"
        ));
    }

    #[test]
    fn test_resend_key_leaves_other_transports_alone() {
        let mut email = EmailConfig::Mock;
        apply_resend_api_key(&mut email, Some("re_live_key".to_string()));
        assert!(matches!(email, EmailConfig::Mock));

        let mut email = resend_config();
        apply_resend_api_key(&mut email, None);
        assert!(matches!(email, EmailConfig::Resend { api_key: None, .. }));
    }

    #[test]
    fn test_read_config_picks_up_resend_key_from_environment() {
        env::set_var(RESEND_API_KEY_ALIAS, "re_live_key");
        let config = read_config(&Environment::Production);
        env::remove_var(RESEND_API_KEY_ALIAS);

        match config.unwrap().email {
            EmailConfig::Resend { api_key, .. } => {
                assert_eq!(api_key.as_deref(), Some("re_live_key"));
            }
            other => panic!("expected resend transport, got {other:?}"),
        }
    }
}
