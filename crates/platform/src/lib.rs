#![allow(clippy::module_name_repetitions)]

//! Platform abstraction layer for the OTA dexopt coordinator.
//!
//! This crate provides the host-facing seams the coordinator talks through:
//! - Storage queries (usable space and low-space threshold of a volume)
//! - Artifact operations (moving staged compilation output into place)
//! - Dexopt execution backends (the installer daemon, or a process stand-in)
//!
//! Each seam is a trait so the core logic can be driven by test doubles.

pub mod artifacts;
pub mod backend;
pub mod core;
pub mod implementations;
pub mod storage;

pub use core::Platform;
pub use implementations::linux::{FsArtifactMover, LinuxPlatform, ProcessBackend, StatvfsStorage};

/// Re-export commonly used types
pub use artifacts::{ArtifactOperations, MoveOutcome};
pub use backend::DexoptBackend;
pub use storage::StorageQuery;
