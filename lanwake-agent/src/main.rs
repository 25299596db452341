use anyhow::{Context, Result};
use lanwake_agent::identity::{wait_for_network, InterfaceIdentity, NETWORK_RETRY};
use lanwake_agent::link::mqtt_options;
use lanwake_agent::probe::PingProber;
use lanwake_agent::uptime::SessionClock;
use lanwake_agent::wol::UdpWakeSender;
use lanwake_agent::{Agent, AgentConfig, ConnectionSupervisor, DispatchSettings, Dispatcher, MqttLink};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let clock = SessionClock::start();

    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lanwake_agent=info")),
        )
        .init();

    info!("LanWake Agent v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = AgentConfig::load().context("Failed to load configuration")?;
    let target = config.target_host().context("Invalid target host")?;

    let identity = InterfaceIdentity::new(config.network.interface.clone(), config.network.ssid.clone());
    // The host may still be joining the network (DHCP, wireless association)
    let local = wait_for_network(&identity, NETWORK_RETRY).await;
    let broadcast = local.broadcast();
    info!(
        "Local address {}/{}, wake packets for {} go to {}",
        local.local_ip, local.netmask, target.mac, broadcast
    );

    let dispatcher = Dispatcher::new(
        PingProber::default(),
        UdpWakeSender::default(),
        identity,
        DispatchSettings {
            target,
            broadcast,
            commands_topic: config.topics.commands.clone(),
            token_prefix: config.topics.token_prefix.clone(),
            clock,
        },
    );
    let link = MqttLink::new(mqtt_options(&config.broker, "lanwake-agent"));
    info!("Broker {}:{} (tls: {})", config.broker.host, config.broker.port, config.broker.tls);

    Agent::new(
        link,
        ConnectionSupervisor::new(config.topics.commands.clone()),
        dispatcher,
        config.topics.responses.clone(),
        config.topics.token_prefix.clone(),
    )
    .run()
    .await;

    Ok(())
}
