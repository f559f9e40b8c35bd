//! `MessageListener` (§11): grounded on the teacher's `automations::server`
//! worker-pool shape — `tokio::select!` between polling for work and an
//! external shutdown future, bounded in-flight concurrency via
//! `tokio::sync::Semaphore`, per-message `tokio::spawn`, graceful drain on
//! shutdown by re-acquiring every permit before returning.

use crate::config::ListenerConfig;
use crate::error::BusError;
use crate::handler::MessageHandler;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::StreamExt;
use ingest::Disposition;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, ExchangeKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const ATTEMPT_HEADER: &str = "x-reconciler-attempt";

#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn run(&self, handler: Arc<dyn MessageHandler>, shutdown: BoxFuture<'static, ()>) -> Result<(), BusError>;
}

pub struct AmqpListener {
    channel: Channel,
    config: ListenerConfig,
}

impl AmqpListener {
    pub fn new(channel: Channel, config: ListenerConfig) -> Self {
        Self { channel, config }
    }

    async fn declare_topology(&self) -> Result<(), BusError> {
        let kind = match self.config.input_exchange_type.as_str() {
            "fanout" => ExchangeKind::Fanout,
            "headers" => ExchangeKind::Headers,
            "direct" => ExchangeKind::Direct,
            _ => ExchangeKind::Topic,
        };

        self.channel
            .exchange_declare(
                &self.config.input_exchange,
                kind,
                ExchangeDeclareOptions { durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(BusError::Channel)?;

        self.channel
            .queue_declare(
                &self.config.input_queue,
                QueueDeclareOptions { durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(BusError::Channel)?;

        let routing_keys = if self.config.binding_arguments.is_empty() {
            vec![String::new()]
        } else {
            self.config.binding_arguments.clone()
        };
        for routing_key in routing_keys {
            self.channel
                .queue_bind(
                    &self.config.input_queue,
                    &self.config.input_exchange,
                    &routing_key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .map_err(BusError::Channel)?;
        }

        self.channel
            .basic_qos(self.config.prefetch, BasicQosOptions::default())
            .await
            .map_err(BusError::Channel)?;

        Ok(())
    }
}

#[async_trait]
impl MessageListener for AmqpListener {
    #[tracing::instrument(skip(self, handler, shutdown))]
    async fn run(&self, handler: Arc<dyn MessageHandler>, shutdown: BoxFuture<'static, ()>) -> Result<(), BusError> {
        self.declare_topology().await?;

        let mut consumer = self
            .channel
            .basic_consume(
                &self.config.input_queue,
                "reconciler",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(BusError::Channel)?;

        let permits = self.config.prefetch.max(1) as u32;
        let semaphore = Arc::new(Semaphore::new(permits as usize));
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                next = consumer.next() => next,
                () = &mut shutdown => None,
            };
            let Some(next) = next else { break };
            let delivery = next.map_err(BusError::Channel)?;

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let handler = handler.clone();
            let channel = self.channel.clone();
            let config = self.config.clone();

            tokio::spawn(async move {
                let _permit = permit;
                handle_delivery(&channel, &config, handler.as_ref(), delivery).await;
            });
        }

        tracing::info!("listener loop stopped, draining in-flight messages");
        let _ = semaphore.acquire_many_owned(permits).await;
        Ok(())
    }
}

fn read_attempt(delivery: &Delivery) -> u32 {
    delivery
        .properties
        .headers()
        .as_ref()
        .and_then(|headers| headers.inner().get(ATTEMPT_HEADER))
        .and_then(|value| match value {
            AMQPValue::LongUInt(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(0)
}

fn backoff_for(config: &ListenerConfig, attempt: u32) -> Duration {
    let scaled = config.initial_retry_interval.saturating_mul(1 << attempt.min(16));
    scaled.min(config.max_retry_interval)
}

async fn handle_delivery(channel: &Channel, config: &ListenerConfig, handler: &dyn MessageHandler, delivery: Delivery) {
    let content_type = delivery
        .properties
        .content_type()
        .as_ref()
        .map(ShortString::as_str);
    let attempt = read_attempt(&delivery);

    match tokio::time::timeout(config.actor_timeout, handler.handle(content_type, &delivery.data)).await {
        Ok(Ok(())) => {
            ack(&delivery).await;
            notify_distributor(channel, config, &delivery.data).await;
        }
        Ok(Err(err)) => {
            tracing::warn!(attempt, error = %err, "ingest failed");
            route_failure(channel, config, &delivery, attempt, &err.to_string(), err.disposition()).await;
        }
        Err(_elapsed) => {
            tracing::warn!(attempt, timeout = ?config.actor_timeout, "ingest actor timed out");
            route_failure(channel, config, &delivery, attempt, "actor timed out", Disposition::Temporary).await;
        }
    }
}

async fn route_failure(
    channel: &Channel,
    config: &ListenerConfig,
    delivery: &Delivery,
    attempt: u32,
    message: &str,
    disposition: Disposition,
) {
    match disposition {
        Disposition::Permanent => dead_letter(channel, config, delivery, message).await,
        Disposition::Temporary => {
            let next_attempt = attempt + 1;
            let backoff = backoff_for(config, attempt);
            if backoff >= config.max_retry_interval && attempt > 0 {
                tracing::warn!(next_attempt, "temporary failure exceeded max retry interval, dead-lettering");
                dead_letter(channel, config, delivery, message).await;
                return;
            }

            tokio::time::sleep(backoff.max(config.retry_interval)).await;
            if let Err(err) = republish_with_attempt(channel, config, delivery, next_attempt).await {
                tracing::error!(error = %err, "failed to republish message for retry");
            }
            ack(delivery).await;
        }
    }
}

async fn republish_with_attempt(
    channel: &Channel,
    config: &ListenerConfig,
    delivery: &Delivery,
    attempt: u32,
) -> Result<(), lapin::Error> {
    let mut headers = delivery.properties.headers().clone().unwrap_or_default();
    headers.insert(ATTEMPT_HEADER.into(), AMQPValue::LongUInt(attempt));
    let properties = delivery.properties.clone().with_headers(headers);

    channel
        .basic_publish(
            &config.input_exchange,
            delivery.routing_key.as_str(),
            BasicPublishOptions::default(),
            &delivery.data,
            properties,
        )
        .await?
        .await?;
    Ok(())
}

async fn dead_letter(channel: &Channel, config: &ListenerConfig, delivery: &Delivery, reason: &str) {
    let mut headers = FieldTable::default();
    headers.insert("x-reconciler-error".into(), AMQPValue::LongString(reason.into()));

    let properties = BasicProperties::default()
        .with_headers(headers)
        .with_expiration(config.error_message_timeout.as_millis().to_string().into());

    let publish = channel
        .basic_publish(
            &config.error_exchange,
            delivery.routing_key.as_str(),
            BasicPublishOptions::default(),
            &delivery.data,
            properties,
        )
        .await;

    match publish {
        Ok(confirm) => {
            if let Err(err) = confirm.await {
                tracing::error!(error = %err, "dead-letter publish was not confirmed");
            }
        }
        Err(err) => tracing::error!(error = %err, "failed to publish to dead-letter exchange"),
    }

    ack(delivery).await;
}

async fn notify_distributor(channel: &Channel, config: &ListenerConfig, payload: &[u8]) {
    if config.distributor_output_exchange.is_empty() {
        return;
    }
    let publish = channel
        .basic_publish(
            &config.distributor_output_exchange,
            "",
            BasicPublishOptions::default(),
            payload,
            BasicProperties::default(),
        )
        .await;

    if let Err(err) = publish {
        tracing::warn!(error = %err, "best-effort distributor notification failed");
    }
}

async fn ack(delivery: &Delivery) {
    if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
        tracing::error!(error = %err, "failed to ack delivery");
    }
}
