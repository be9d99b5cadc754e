use core::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use mqlight::{BrokerConfig, Config, DeviceConfig, Session};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// MQTT broker host
    #[arg(long, env = "MQLIGHT_HOST", default_value = "10.1.1.2")]
    host: String,

    /// MQTT broker port
    #[arg(long, env = "MQLIGHT_PORT", default_value_t = 1883)]
    port: u16,

    /// Keep-alive interval in seconds
    #[arg(long, env = "MQLIGHT_KEEP_ALIVE", default_value_t = 60)]
    keep_alive: u64,

    /// MQTT client identifier
    #[arg(long, env = "MQLIGHT_CLIENT_ID", default_value = "mqlight-example")]
    client_id: String,

    /// Milliseconds to wait for the command subscription to be acknowledged
    #[arg(long, env = "MQLIGHT_SUBSCRIBE_TIMEOUT_MS", default_value_t = 1000)]
    subscribe_timeout_ms: u64,

    /// Home Assistant discovery topic
    #[arg(
        long,
        env = "MQLIGHT_DISCOVERY_TOPIC",
        default_value = "homeassistant/light/example/light/config"
    )]
    discovery_topic: String,

    #[arg(long, env = "MQLIGHT_COMMAND_TOPIC", default_value = "example/set")]
    command_topic: String,

    #[arg(long, env = "MQLIGHT_STATE_TOPIC", default_value = "example/state")]
    state_topic: String,

    /// Display name of the light and its device
    #[arg(long, env = "MQLIGHT_NAME", default_value = "example LED light")]
    name: String,

    #[arg(
        long,
        env = "MQLIGHT_UNIQUE_ID",
        default_value = "f3dfb856-1479-4094-8ded-6e252d73d24e"
    )]
    unique_id: String,

    /// Device identifier, may be repeated
    #[arg(
        long = "identifier",
        env = "MQLIGHT_IDENTIFIERS",
        value_delimiter = ',',
        default_value = "example"
    )]
    identifiers: Vec<String>,

    #[arg(long, env = "MQLIGHT_SW_VERSION", default_value = "0.69 beta alpha")]
    sw_version: String,

    #[arg(
        long,
        env = "MQLIGHT_MODEL",
        default_value = "Mayhems personal silly lighting projects"
    )]
    model: String,

    #[arg(long, env = "MQLIGHT_MANUFACTURER", default_value = "Mayhem & Chaos Labs")]
    manufacturer: String,

    /// Largest brightness value the hub will send
    #[arg(long, env = "MQLIGHT_BRIGHTNESS_SCALE", default_value_t = 254)]
    brightness_scale: u16,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            broker: BrokerConfig {
                host: args.host,
                port: args.port,
                keep_alive: Duration::from_secs(args.keep_alive),
                client_id: args.client_id,
                subscribe_timeout: Duration::from_millis(args.subscribe_timeout_ms),
            },
            device: DeviceConfig {
                discovery_topic: args.discovery_topic,
                command_topic: args.command_topic,
                state_topic: args.state_topic,
                name: args.name,
                unique_id: args.unique_id,
                identifiers: args.identifiers,
                sw_version: args.sw_version,
                model: args.model,
                manufacturer: args.manufacturer,
                brightness_scale: args.brightness_scale,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mqlight::log::init();

    let config = Config::from(Args::parse());

    let mut session = Session::connect(&config)
        .await
        .with_context(|| format!("failed to connect to mqtt broker at {}", config.broker.addr()))?;

    let outcome = tokio::select! {
        res = session.run() => res.map(|_| ()).context("light session ended"),
        res = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            res.context("failed to listen for ctrl-c")
        }
    };

    session.disconnect().await;

    outcome
}
