//! The AMQP listener (§11): consumes inbound documents, feeds each to a
//! `MessageHandler`, and routes failures to retry or a dead-letter exchange.

mod config;
mod error;
mod handler;
mod listener;

pub use config::ListenerConfig;
pub use error::BusError;
pub use handler::MessageHandler;
pub use listener::{AmqpListener, MessageListener};
