//! Credential reset service
//!
//! Issues a temporary password for an account identified by email, stores it
//! through the administrative identity directory and mails it to the owner,
//! without revealing whether the email is registered.

pub mod api;
pub mod app;
pub mod app_info;
pub mod boot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credential;
pub mod directory;
pub mod emails;
pub mod environment;
pub mod mailer;
pub mod reset;
pub mod router;
pub mod setup_tracing;
