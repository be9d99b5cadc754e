//! Message routing for the light
//!
//! ```plain
//! homeassistant/light/example/light/config -> announcement (once)
//! example/state                            -> status (at startup, then after every command)
//! example/set                              <- command patch
//! ```
//!
//! A [`Session`] owns the transport and the device state. Inbound messages are
//! dispatched one at a time from [`Session::run`], so the state needs no
//! locking.

use core::{convert::Infallible, future::Future, time::Duration};
use std::collections::VecDeque;

use mqlight_common::light::{CommandPatch, PatchError, StatusRecord};
use serde::Serialize;
use tokio::time::Instant;

use crate::{Config, DeviceConfig, DeviceState, MqttConnection, Result};

/// Whatever the broker connection handed us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Message { topic: String, payload: Vec<u8> },
    SubscribeAck,
    Other,
}

/// Publish/subscribe plumbing underneath a [`Session`]. Publishes and
/// subscriptions are at-most-once.
pub trait Transport {
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<()>> + Send;

    /// Fire-and-forget; returns once the packet is handed off.
    fn publish(&self, topic: &str, payload: String) -> impl Future<Output = Result<()>> + Send;

    fn recv(&self) -> impl Future<Output = Result<Incoming>> + Send;

    fn disconnect(&self) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Only while [`Session::connect`] opens the transport; a `Session` is
    /// never observed in this state.
    Connecting,
    Connected,
}

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("payload is not valid utf-8: {0}")]
    InvalidUtf8(#[from] core::str::Utf8Error),
    #[error("payload is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0}")]
    Command(#[from] PatchError),
}

/// What [`Session::on_message`] did with a message.
#[derive(Debug)]
pub enum Dispatch {
    /// Command applied, resulting status handed to [`Session::publish`]
    Applied(StatusRecord),
    /// Not on the command topic
    Ignored,
    /// Undecodable; logged and dropped
    Discarded(DispatchError),
}

pub struct Session<T> {
    transport: T,
    state: ConnectionState,
    device: DeviceConfig,
    light: DeviceState,
    /// Messages that arrived while startup was waiting for the SUBACK
    pending: VecDeque<(String, Vec<u8>)>,
}

impl Session<MqttConnection> {
    /// Connects to the configured broker and runs the startup sequence.
    /// Failing to reach the broker is fatal; there is no retry.
    pub async fn connect(config: &Config) -> Result<Self> {
        tracing::debug!(state = ?ConnectionState::Connecting, "Opening broker connection");

        let transport = MqttConnection::connect(&config.broker).await?;

        Session::start(transport, config.device.clone(), config.broker.subscribe_timeout).await
    }
}

impl<T: Transport> Session<T> {
    /// Startup sequence on an already connected transport: subscribe to the
    /// command topic, announce the device, wait for the subscription to be
    /// acknowledged (at most `ack_timeout`), then publish the initial state.
    pub async fn start(transport: T, device: DeviceConfig, ack_timeout: Duration) -> Result<Self> {
        let mut session = Session {
            transport,
            state: ConnectionState::Connected,
            light: DeviceState::new(device.brightness_scale),
            device,
            pending: VecDeque::new(),
        };

        session
            .transport
            .subscribe(&session.device.command_topic)
            .await?;

        let announcement = session.device.announcement();
        session
            .publish_json(&session.device.discovery_topic, &announcement)
            .await;

        session.await_subscription(ack_timeout).await?;

        let status = session.publish_status().await;
        tracing::info!(?status, "Light is up");

        Ok(session)
    }

    async fn await_subscription(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, self.transport.recv()).await {
                Ok(Ok(Incoming::SubscribeAck)) => {
                    tracing::debug!(topic = %self.device.command_topic, "Subscription acknowledged");
                    return Ok(());
                }
                Ok(Ok(Incoming::Message { topic, payload })) => {
                    self.pending.push_back((topic, payload));
                }
                Ok(Ok(Incoming::Other)) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    tracing::warn!(?timeout, "No subscription acknowledgement, carrying on");
                    return Ok(());
                }
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn light(&self) -> &DeviceState {
        &self.light
    }

    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Best effort: dropped when not connected, failures are only logged.
    pub async fn publish(&self, topic: &str, payload: String) {
        if self.state != ConnectionState::Connected {
            tracing::debug!(topic, state = ?self.state, "Not connected, dropping publish");
            return;
        }

        if let Err(e) = self.transport.publish(topic, payload).await {
            tracing::warn!(topic, "Publish failed: {e}");
        }
    }

    async fn publish_json(&self, topic: &str, payload: &impl Serialize) {
        match serde_json::to_string(payload) {
            Ok(payload) => self.publish(topic, payload).await,
            Err(e) => tracing::error!(topic, "Failed to serialize payload: {e}"),
        }
    }

    async fn publish_status(&self) -> StatusRecord {
        let status = self.light.snapshot();
        self.publish_json(&self.device.state_topic, &status).await;
        status
    }

    /// Handles one inbound message. Never fails: anything undecodable is
    /// logged and reported as [`Dispatch::Discarded`].
    pub async fn on_message(&mut self, topic: &str, payload: &[u8]) -> Dispatch {
        match self.decode(topic, payload) {
            Ok(Some(patch)) => {
                self.light.apply_command(patch);
                Dispatch::Applied(self.publish_status().await)
            }
            Ok(None) => {
                tracing::trace!(topic, "Ignoring message on foreign topic");
                Dispatch::Ignored
            }
            Err(e) => {
                tracing::warn!(topic, "Discarding message: {e}");
                Dispatch::Discarded(e)
            }
        }
    }

    fn decode(&self, topic: &str, payload: &[u8]) -> Result<Option<CommandPatch>, DispatchError> {
        let text = core::str::from_utf8(payload)?;
        let value: serde_json::Value = serde_json::from_str(text)?;

        if topic != self.device.command_topic {
            return Ok(None);
        }

        tracing::debug!(%value, "Received command");

        Ok(Some(CommandPatch::from_value(&value)?))
    }

    /// Dispatches inbound messages until the transport fails, after which the
    /// session is disconnected for good.
    pub async fn run(&mut self) -> Result<Infallible> {
        while let Some((topic, payload)) = self.pending.pop_front() {
            self.on_message(&topic, &payload).await;
        }

        loop {
            match self.transport.recv().await {
                Ok(Incoming::Message { topic, payload }) => {
                    self.on_message(&topic, &payload).await;
                }
                Ok(_) => {}
                Err(e) => {
                    self.state = ConnectionState::Disconnected;
                    tracing::error!("Connection lost: {e}");
                    return Err(e);
                }
            }
        }
    }

    pub async fn disconnect(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }

        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!("Failed to disconnect cleanly: {e}");
        }

        self.state = ConnectionState::Disconnected;
        tracing::info!("Disconnected");
    }
}
