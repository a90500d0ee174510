pub mod artifact;
pub mod config;
pub mod engine;
pub mod error;
pub mod frontmatter;
pub mod handler;
pub mod history;
pub mod io;
pub mod logger;
pub mod merge;
pub mod operation;
pub mod paths;
pub mod result;
pub mod types;

pub use artifact::{Artifact, ArtifactRecord};
pub use config::{CrudEngineConfig, Profile, DEV_CONFIG, PROD_CONFIG};
pub use engine::CrudEngine;
pub use error::{CrudError, ErrorCode, OperationError, Result};
pub use handler::{CreateOptions, DeleteOptions, ReadOptions, UpdateOptions};
pub use history::OperationHistory;
pub use result::OperationResult;
pub use types::{ArtifactKind, OperationKind};
