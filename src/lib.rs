pub mod analytics;
pub mod config;
pub mod db;
pub mod kafka;
pub mod mailer;
pub mod models;
pub mod notifier;
pub mod processor;
pub mod rules;
