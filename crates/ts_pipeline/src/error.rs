use thiserror::Error;
use ts_core::Stage;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Another stage is still running")]
    Busy,

    /// The stage's prerequisite has no result yet.
    #[error("The {0} stage has no result yet")]
    NotReady(Stage),

    #[error("No trend at position {0}")]
    InvalidSelection(usize),

    #[error("The {stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ts_core::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
