//! # Configuration
//!
//! Tuning knobs for the workspace core, managed by [`confique`] so the host
//! process can layer TOML files and environment variables over the compiled
//! defaults. The core itself only ever reads the resolved struct.

use confique::Config;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_FANOUT: usize = 4;
pub const DEFAULT_MAX_PATH_DEPTH: usize = 64;

/// Configuration for a [`crate::api::Workspace`].
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Maximum concurrent sibling-folder fetches per tree level during
    /// subtree search. Store round-trips dominate search latency, so this is
    /// the main throughput knob; 1 fully serializes the traversal.
    #[config(default = 4)]
    pub search_fanout: usize,

    /// Hard ceiling on folder-chain length accepted by the path resolver and
    /// walked by the re-parent cycle check.
    #[config(default = 64)]
    pub max_path_depth: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            search_fanout: DEFAULT_SEARCH_FANOUT,
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
        }
    }
}

impl WorkspaceConfig {
    /// Fan-out normalized to at least one in-flight fetch.
    pub fn search_fanout(&self) -> usize {
        self.search_fanout.max(1)
    }
}
