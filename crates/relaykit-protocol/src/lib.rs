pub mod builder;
pub mod command;
pub mod frame;

pub use builder::InitTargetBuilder;
pub use command::{ControllerCommand, Opcode, opcode_name};
pub use frame::{PassThroughFrame, strip_target_data_header};
