use std::time::Duration;

/// Wire-level configuration for one `AmqpListener` (§6 `listener.*`/`bus.*`
/// keys). Deliberately independent of `config-loader`'s `Settings` so this
/// crate has no dependency on the app's configuration layer; `server` maps
/// `config_loader::Settings` fields into this struct at startup.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub input_queue: String,
    pub input_exchange: String,
    pub input_exchange_type: String,
    pub binding_arguments: Vec<String>,
    pub prefetch: u16,
    pub error_exchange: String,
    pub error_message_timeout: Duration,
    pub distributor_output_exchange: String,
    pub retry_interval: Duration,
    pub actor_timeout: Duration,
    pub initial_retry_interval: Duration,
    pub max_retry_interval: Duration,
}
