use crate::config::AppConfig;
use crate::db::DbPool;
use crate::models::message::TelemetryMessage;
use crate::notifier::Notifier;
use crate::processor::{self, IngestError};
use crate::rules::Thresholds;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Starts the Kafka consumer with SASL/SCRAM authentication and a circuit
/// breaker mechanism. Each message runs through the ingestion pipeline in
/// its own task so a slow database write never stalls consumption.
pub async fn start_kafka_consumer(
    config: &AppConfig,
    pool: DbPool,
    notifier: Arc<Notifier>,
) -> anyhow::Result<()> {
    info!("Initializing Kafka consumer for topic: {}", config.kafka_topic);

    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &config.kafka_bootstrap_servers)
        .set("group.id", &config.kafka_group_id)
        .set("auto.offset.reset", &config.kafka_auto_offset_reset)
        // SASL Configuration
        .set("security.protocol", &config.kafka_security_protocol)
        .set("sasl.mechanism", &config.kafka_sasl_mechanism)
        .set("sasl.username", &config.kafka_username)
        .set("sasl.password", &config.kafka_password);

    let consumer: StreamConsumer = client_config.create()?;

    consumer.subscribe(&[&config.kafka_topic])?;
    info!("Subscribed to topic: {}", config.kafka_topic);

    let pool = Arc::new(pool);
    let thresholds = Arc::new(config.thresholds.clone());
    let mut consecutive_failures = 0;
    let max_retries = config.kafka_max_retries;
    let cooldown_duration = Duration::from_secs(config.kafka_circuit_breaker_cooldown);

    loop {
        // Circuit Breaker Check
        if consecutive_failures >= max_retries {
            warn!(
                "Circuit breaker tripped ({} consecutive failures)! Sleeping for {} seconds...",
                consecutive_failures, config.kafka_circuit_breaker_cooldown
            );
            tokio::time::sleep(cooldown_duration).await;
            consecutive_failures = 0;
            info!("Circuit breaker reset. Resuming consumption.");
        }

        match consumer.recv().await {
            Ok(m) => {
                // Success: Reset failure counter
                consecutive_failures = 0;

                let payload = match m.payload() {
                    None => {
                        warn!("Received empty payload from Kafka");
                        continue;
                    }
                    Some(p) => p,
                };

                let pool_clone = pool.clone();
                let notifier_clone = notifier.clone();
                let thresholds_clone = thresholds.clone();
                let payload_vec = payload.to_vec();

                // Process the message in a background task to not block the consumer loop
                tokio::spawn(async move {
                    if let Err(e) = handle_payload(
                        &pool_clone,
                        &notifier_clone,
                        &thresholds_clone,
                        &payload_vec,
                    )
                    .await
                    {
                        error!("Error processing message: {}", e);
                    }
                });
            }
            Err(e) => {
                error!(
                    "Kafka error: {}. Incrementing failure count ({} / {})",
                    e,
                    consecutive_failures + 1,
                    max_retries
                );
                consecutive_failures += 1;

                // Small delay to prevent tight loop in case of minor network glitches
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }
}

/// Parse one payload and feed it to the pipeline. Malformed messages and
/// rejected readings are logged and skipped; only storage failures bubble
/// up to the consumer loop.
async fn handle_payload(
    pool: &DbPool,
    notifier: &Notifier,
    thresholds: &Thresholds,
    payload: &[u8],
) -> anyhow::Result<()> {
    let message: TelemetryMessage = match serde_json::from_slice(payload) {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to parse message: {}", e);
            return Ok(());
        }
    };

    let correlation_id = Uuid::parse_str(&message.uuid).unwrap_or_default();
    let device_id = message
        .get_device_id()
        .map(String::as_str)
        .unwrap_or("unknown");

    let reading = match message.to_new_reading() {
        Ok(r) => r,
        Err(reason) => {
            warn!(%correlation_id, device_id, "Skipping message: {}", reason);
            return Ok(());
        }
    };

    match processor::ingest(pool, notifier, thresholds, reading).await {
        Ok(reading) => {
            debug!(%correlation_id, device_id, reading_id = reading.id, "Reading ingested");
            Ok(())
        }
        Err(e @ IngestError::Validation(_)) => {
            warn!(%correlation_id, device_id, "Rejected reading: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
