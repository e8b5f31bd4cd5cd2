//! Adapters: concrete implementations of the domain port traits.
//!
//! Each adapter is one member of a closed set; the orchestrator is wired
//! with explicit instances at setup, never through a runtime registry.

pub mod archiver;
pub mod checkpoint;
pub mod providers;
pub mod scout;
pub mod trajectory;

pub use archiver::{FsArchiver, NoopArchiver};
pub use checkpoint::{FsCheckpointStore, MemoryCheckpointStore};
pub use providers::{HttpProvider, HttpProviderConfig, MockProvider};
pub use scout::StaticScout;
pub use trajectory::{FsTrajectoryStore, MemoryTrajectoryStore};
