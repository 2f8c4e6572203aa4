pub mod client;
pub mod controller;
pub mod error;

pub use client::{AudioOptions, HttpStageClient, ScriptOptions, StageClient};
pub use controller::{Phase, PipelineController, PipelineState};
pub use error::ControllerError;

pub mod prelude {
    pub use crate::client::{AudioOptions, HttpStageClient, ScriptOptions, StageClient};
    pub use crate::controller::{Phase, PipelineController};
    pub use crate::error::ControllerError;
}
