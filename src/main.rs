use fleet_telemetry::config::AppConfig;
use fleet_telemetry::notifier::Notifier;
use fleet_telemetry::{db, kafka, mailer};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting Fleet Telemetry Service...");

    // Init DB
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    info!("Connected to database");

    let notifier = Arc::new(Notifier::default());

    // Optional alert email forwarding, enabled when SMTP is configured
    if let Some(email_config) = mailer::EmailConfig::from_env() {
        let m = mailer::Mailer::new(&email_config)?;
        info!(
            "Alert email forwarding enabled for {}",
            email_config.alert_recipient
        );
        tokio::spawn(mailer::run_alert_forwarder(notifier.clone(), m));
    }

    // Start Kafka
    kafka::start_kafka_consumer(&config, pool, notifier).await?;

    Ok(())
}
