use core::sync::atomic::{AtomicU16, Ordering};

use mqtt_endpoint_tokio::mqtt_ep::{
    self, Endpoint,
    packet::v5_0,
    role,
    transport::{TcpTransport, connect_helper},
};
use mqtt_protocol_core::mqtt::packet::{
    Qos, SubEntry, SubOpts,
    v5_0::{Connack, Publish, Suback},
};

use crate::{BrokerConfig, Error, Incoming, Result, Transport};

/// Single MQTT v5 client connection over plain TCP. Everything is QoS 0.
pub struct MqttConnection {
    endpoint: Endpoint<role::Client>,
    next_packet_id: AtomicU16,
}

impl MqttConnection {
    pub async fn connect(broker: &BrokerConfig) -> Result<Self> {
        let endpoint = mqtt_ep::endpoint::Endpoint::<role::Client>::new(mqtt_ep::Version::V5_0);

        let addr = broker.addr();
        tracing::info!(%addr, client_id = %broker.client_id, "Connecting to broker");

        let tcp_stream = connect_helper::connect_tcp(&addr, None).await?;
        let transport = TcpTransport::from_stream(tcp_stream);
        endpoint
            .attach(transport, mqtt_ep::endpoint::Mode::Client)
            .await?;

        let keep_alive = u16::try_from(broker.keep_alive.as_secs()).unwrap_or(u16::MAX);

        let connect = v5_0::Connect::builder()
            .client_id(broker.client_id.as_str())?
            .keep_alive(keep_alive)
            .clean_start(true)
            .build()?;

        endpoint.send(connect).await?;

        let packet = endpoint.recv().await?;
        let connack: Connack = packet.try_into().map_err(Error::MqttPacketField)?;
        tracing::debug!("Received CONNACK: {connack:?}");

        Ok(MqttConnection { endpoint, next_packet_id: AtomicU16::new(1) })
    }

    fn next_packet_id(&self) -> u16 {
        loop {
            let id = self.next_packet_id.fetch_add(1, Ordering::Relaxed);

            if id != 0 {
                break id;
            }
        }
    }
}

impl Transport for MqttConnection {
    async fn subscribe(&self, topic: &str) -> Result<()> {
        let subscribe = v5_0::Subscribe::builder()
            .packet_id(self.next_packet_id())
            .entries(vec![SubEntry::new(
                topic.to_string(),
                SubOpts::new().set_qos(Qos::AtMostOnce),
            )?])
            .build()?;

        tracing::info!("Subscribing to topic '{topic}'");

        self.endpoint
            .register_packet_id(subscribe.packet_id())
            .await?;

        self.endpoint.send(subscribe).await?;

        Ok(())
    }

    async fn publish(&self, topic: &str, payload: String) -> Result<()> {
        tracing::debug!("Publishing to topic {topic}: {payload}");

        let publish = v5_0::Publish::builder()
            .topic_name(topic.to_string())?
            .payload(payload)
            .qos(Qos::AtMostOnce)
            .retain(false)
            .build()?;

        self.endpoint.send(publish).await?;

        Ok(())
    }

    async fn recv(&self) -> Result<Incoming> {
        let packet = self.endpoint.recv().await?;

        let publish: Result<Publish, _> = packet.clone().try_into();
        if let Ok(publish) = publish {
            return Ok(Incoming::Message {
                topic: publish.topic_name().to_owned(),
                payload: publish.payload().as_slice().to_vec(),
            });
        }

        let suback: Result<Suback, _> = packet.try_into();
        if let Ok(suback) = suback {
            tracing::debug!("Received SUBACK: {suback:?}");
            return Ok(Incoming::SubscribeAck);
        }

        Ok(Incoming::Other)
    }

    async fn disconnect(&self) -> Result<()> {
        let disconnect = v5_0::Disconnect::builder().build()?;

        self.endpoint.send(disconnect).await?;

        Ok(())
    }
}
