//! External process supervision: launch, terminate, observe exit.

pub mod supervisor;
pub mod system;

pub use supervisor::{
    ExitWatch, ProcessExit, ProcessHandle, ProcessSpec, ProcessSupervisor, ScriptedExit,
    ScriptedSupervisor,
};
pub use system::SystemProcessSupervisor;
