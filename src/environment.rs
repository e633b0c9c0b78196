use strum::{Display, EnumString};

/// Deployment environment, selected with `APP_ENVIRONMENT`.
///
/// Also names the configuration file read at boot (`config/{environment}.yaml`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn config_file_name(self) -> String {
        format!("config/{self}")
    }
}
