//! LanWake Agent - remote Wake-on-LAN over MQTT
//!
//! The agent keeps a session with an MQTT broker and, on command:
//! - `ping`: probes the target host and reports `ping_ok` / `ping_fail`
//! - `wol`: wakes the target unless it is already up, then confirms the boot
//! - `status`: reports local address, network name and uptime
//!
//! Broker, prober, packet sender and network identity sit behind traits
//! (`BrokerLink`, `Prober`, `WakeSender`, `IdentitySource`) so the control
//! flow can be driven by the devkit doubles in tests.

pub mod agent;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod link;
pub mod probe;
pub mod status;
pub mod supervisor;
pub mod uptime;
pub mod wake;
pub mod wol;

pub use agent::Agent;
pub use config::{AgentConfig, TargetHost};
pub use dispatcher::{DispatchSettings, Dispatcher};
pub use link::{BrokerLink, InboundMessage, MqttLink};
pub use status::StatusMessage;
pub use supervisor::ConnectionSupervisor;
