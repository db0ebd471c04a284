#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod findings;
pub mod forwarder;
pub mod materialize;
pub mod metrics;
pub mod secret;
pub mod sink;
pub mod trigger;

pub use config::{ForwardConfig, GeneralConfig, ScanRelayConfig};
pub use error::ForwardError;
pub use findings::{EcrFindingsFetcher, Finding, FindingsFetcher, FindingsPage};
pub use forwarder::{ForwardReport, ScanForwarder};
pub use materialize::{MaterializedEvent, expand};
pub use secret::{AuthToken, SecretProvider, SecretsManagerProvider};
pub use sink::{DeliveryOutcome, HttpPipelineSink, PipelineSink};
pub use trigger::{TriggerDetail, TriggerNotification};
