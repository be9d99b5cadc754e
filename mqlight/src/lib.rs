use mqtt_endpoint_tokio::mqtt_ep;

pub mod config;
pub mod connection;
pub mod device;
pub mod log;
pub mod session;

pub use mqlight_common as common;

pub use self::{
    config::{BrokerConfig, Config, DeviceConfig},
    connection::MqttConnection,
    device::DeviceState,
    session::{ConnectionState, Dispatch, DispatchError, Incoming, Session, Transport},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("mqtt transport error: {0}")]
    MqttTransport(#[from] mqtt_ep::TransportError),
    #[error("mqtt connection error: {0}")]
    MqttConnection(#[from] mqtt_ep::ConnectionError),
    #[error("mqtt packet field error: {0}")]
    MqttPacketField(&'static str),
    #[error("mqtt packet error: {0}")]
    MqttPacket(mqtt_ep::result_code::MqttError),
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<mqtt_ep::result_code::MqttError> for Error {
    fn from(e: mqtt_ep::result_code::MqttError) -> Self {
        Error::MqttPacket(e)
    }
}
