pub mod config_loader;
pub mod entrypoint;
pub mod envelope;
pub mod error;
pub mod tracing_init;

pub use config_loader::{load_config, resolve_config_path};
pub use entrypoint::RequestEntryPoint;
pub use envelope::{HandoffChainEntry, InboundRequest, OutboundEnvelope, ResponseMetadata};
pub use error::Error;
pub use tracing_init::init_tracing;
