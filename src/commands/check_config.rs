use std::process::ExitCode;

use crate::config::{Config, EmailConfig};

/// Handle the `check-config` command.
///
/// Prints which directory and email settings the current environment
/// resolves to, without revealing any secret. Exits with failure when reset
/// requests would be answered with a configuration error.
pub fn handle_check_config_command(config: &Config) -> ExitCode {
    let report = ConfigReport::from_config(config);

    println!("🔎 Configuration check\n");
    for line in &report.lines {
        println!("  {line}");
    }
    println!();

    if report.directory_ready {
        println!("✅ Reset requests can be served");
        ExitCode::SUCCESS
    } else {
        println!("❌ Reset requests will fail with a configuration error");
        ExitCode::FAILURE
    }
}

struct ConfigReport {
    lines: Vec<String>,
    directory_ready: bool,
}

impl ConfigReport {
    fn from_config(config: &Config) -> Self {
        let mut lines = Vec::new();

        let directory_ready = match config.directory.credentials() {
            Ok((url, _)) => {
                lines.push(format!("directory: {url}"));
                lines.push("service key: present".to_string());
                true
            }
            Err(error) => {
                lines.push(format!("directory: {error}"));
                false
            }
        };

        lines.push(format!("email: {}", email_summary(&config.email)));
        lines.push(format!("step timeout: {}s", config.reset.step_timeout_seconds));

        Self {
            lines,
            directory_ready,
        }
    }
}

fn email_summary(email: &EmailConfig) -> String {
    match email {
        EmailConfig::Disabled => "disabled".to_string(),
        EmailConfig::Mock => "mock (messages are captured, not sent)".to_string(),
        EmailConfig::Resend {
            api_key, sender, ..
        } => match api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => format!("resend as {sender}"),
            _ => "resend without API key (delivery disabled)".to_string(),
        },
        EmailConfig::Smtp {
            host, port, sender, ..
        } => format!("smtp {host}:{port} as {sender}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectoryConfig;

    fn config(directory: DirectoryConfig, email: EmailConfig) -> Config {
        Config {
            tracing: Default::default(),
            server: Default::default(),
            directory,
            email,
            reset: Default::default(),
        }
    }

    #[test]
    fn test_report_without_directory() {
        let report =
            ConfigReport::from_config(&config(DirectoryConfig::default(), EmailConfig::Disabled));

        assert!(!report.directory_ready);
        assert!(report
            .lines
            .contains(&"directory: directory base url is not configured".to_string()));
        assert!(report.lines.contains(&"email: disabled".to_string()));
    }

    #[test]
    fn test_report_never_prints_secrets() {
        let directory = DirectoryConfig {
            base_url: Some("https://example.supabase.co".to_string()),
            service_key: Some("service-secret".to_string()),
            ..DirectoryConfig::default()
        };
        let email = EmailConfig::Resend {
            api_key: Some("re_secret".to_string()),
            sender: "noreply@example.com".parse().unwrap(),
            endpoint: "https://api.resend.com/emails".to_string(),
        };

        let report = ConfigReport::from_config(&config(directory, email));

        assert!(report.directory_ready);
        let output = report.lines.join("\n");
        assert!(!output.contains("service-secret"));
        assert!(!output.contains("re_secret"));
        assert!(output.contains("resend as noreply@example.com"));
    }
}
