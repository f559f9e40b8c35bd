#[derive(thiserror::Error, Debug)]
pub enum BusError {
    #[error("amqp connection failed")]
    Connection(#[source] lapin::Error),
    #[error("amqp channel operation failed")]
    Channel(#[source] lapin::Error),
    #[error("amqp consumer stream ended unexpectedly")]
    ConsumerEnded,
}
