//! Errors surfaced by the `physlets` binary.
//!
//! Every failure maps to one exit code so scripts can branch on it:
//!
//! | code | meaning                                                        |
//! |------|----------------------------------------------------------------|
//! | 2    | bad command line (reported by clap before `run` starts)        |
//! | 10   | the engine refused the run: unknown name, bad size or rate     |
//! | 11   | an output file could not be written                            |
//! | 12   | the command line parsed but does not describe a run           |
//! | 13   | JSON output could not be produced                              |
//! | 14   | the `--scenario` file is missing, unreadable or invalid       |

use physlets_core::EngineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("scenario {} unusable: {source}", path.display())]
    Scenario { path: PathBuf, source: EngineError },

    #[error("nothing to run: give an engine name or --scenario")]
    MissingEngine,

    /// `--params` was not JSON, or not a JSON object.
    #[error("--params: {0}")]
    Params(String),

    #[error("snapshot {} not written: {source}", path.display())]
    Snapshot { path: PathBuf, source: EngineError },

    #[error("scenario not saved to {}: {source}", path.display())]
    SaveScenario {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json output: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) => 10,
            CliError::Snapshot { .. } | CliError::SaveScenario { .. } => 11,
            CliError::MissingEngine | CliError::Params(_) => 12,
            CliError::Serialization(_) => 13,
            CliError::Scenario { .. } => 14,
        }
    }
}
