pub mod cors;
pub mod health_checks;
pub mod reset_password;
