#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! A/B OTA dexopt coordination
//!
//! Serves compiler commands for installed packages one package at a time
//! while an update is applied to the inactive slot. Commands are either
//! recorded and handed out one by one ([`OtaDexoptService::next_dexopt_command`])
//! or executed in place under the install lock
//! ([`OtaDexoptService::dexopt_next_package`]).

pub mod backend;
pub mod generator;
pub mod guard;
pub mod policy;
pub mod registry;
pub mod relocator;
pub mod service;
pub mod session;

pub use backend::{DirectBackend, InstallLock, RecordingBackend};
pub use generator::{CommandGenerator, GenerationOutcome};
pub use guard::{DiskSpaceGuard, SpaceCheck};
pub use policy::{DexoptOptions, DexoptPolicy, DexoptResult, InstalldPolicy};
pub use registry::{ManifestRegistry, PackageRegistry};
pub use relocator::ArtifactRelocator;
pub use service::{OtaDexoptService, OtaDexoptServiceBuilder};
pub use session::Session;

pub use otadex_platform::DexoptBackend;
