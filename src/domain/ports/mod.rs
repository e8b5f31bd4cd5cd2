//! Port traits: the seams between the pipeline and its collaborators.

pub mod archiver;
pub mod checkpoint;
pub mod provider;
pub mod scout;
pub mod trajectory;

pub use archiver::Archiver;
pub use checkpoint::CheckpointStore;
pub use provider::Provider;
pub use scout::Scout;
pub use trajectory::TrajectoryStore;
