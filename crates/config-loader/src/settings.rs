use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub schema: SchemaSettings,
    pub api: ApiSettings,
    pub bus: BusSettings,
    pub index: IndexSettings,
    pub listener: ListenerSettings,
    pub database: DatabaseSettings,
    pub history: HistorySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchemaSettings {
    pub book: String,
    pub contributor: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusSettings {
    pub amqp_url: String,
    pub initial_retry_interval_ms: u64,
    pub max_retry_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexSettings {
    pub base_url: String,
    pub name: String,
    pub reindex_chunk: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenerSettings {
    pub retry_interval_ms: u64,
    pub actor_timeout_ms: u64,
    pub input: ListenerInputSettings,
    pub error: ListenerErrorSettings,
    pub distributor: ListenerDistributorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenerInputSettings {
    pub queue: String,
    pub exchange: String,
    pub exchange_type: String,
    pub binding_arguments: Vec<String>,
    pub prefetch: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenerErrorSettings {
    pub exchange: String,
    pub message_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenerDistributorSettings {
    pub output: ListenerOutputSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenerOutputSettings {
    pub exchange: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn url(&self) -> String {
        let sslmode = if self.require_ssl { "require" } else { "prefer" };
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username, self.password, self.host, self.port, self.database_name, sslmode
        )
    }
}

/// §9 Open Question: "remaining source fields" for the history key is left
/// to configuration rather than hardcoded, defaulting to the two fields the
/// worked examples always exclude.
#[derive(Debug, Deserialize, Clone)]
pub struct HistorySettings {
    #[serde(default = "default_history_key_excluded_fields")]
    pub key_excluded_fields: Vec<String>,
}

fn default_history_key_excluded_fields() -> Vec<String> {
    vec!["processedAt".to_string(), "system".to_string()]
}
