mod context;
mod evaluator;
pub mod native;
mod process;
mod system;

pub use context::{Context, ContextKind, ControlFlow};
pub use evaluator::Evaluator;
pub use process::{Process, ProcessConfig, ProcessState, SELF_NAME};
pub use system::{BufferedContext, StdioContext, SystemContext};
