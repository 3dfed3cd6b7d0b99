//! Application layer - Use cases and port interfaces
//!
//! Contains the rip pipeline and the trait definitions
//! for external system interactions.

pub mod cancel;
pub mod encode_pool;
pub mod ports;
pub mod progress;
pub mod rip;
pub mod workspace;

pub use cancel::CancelFlag;
pub use encode_pool::{EncodePool, EncodeResult, EncodeWork};
pub use progress::{remap, CombinedPlan, ProgressReporter, SplitPlan, StageRange};
pub use rip::{PipelineSettings, RipDiscUseCase, RipError, RipHandle, RipOutcome, RipReport};
pub use workspace::Workspace;
