pub mod kernel;
pub mod registry;
pub mod specialist;
pub mod targets;

pub use kernel::{OrchestrationKernel, OrchestrationResult};
pub use registry::SpecialistRegistry;
pub use specialist::{BridgeFallback, Specialist};
pub use targets::resolve_targets;
