#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the otadex OTA dexopt coordinator
//!
//! This crate provides fundamental types used throughout the system,
//! including package snapshots, instruction sets, compiler invocations and
//! the reports handed back to callers.

pub mod dexopt;
pub mod isa;
pub mod package;
pub mod reports;

// Re-export commonly used types
pub use dexopt::{
    CompilerFilter, DexoptCommand, DexoptFlags, DexoptInvocation, DexoptReason, NextCommand,
    NOTHING_TO_DO,
};
pub use isa::{dex_code_instruction_sets, InstructionSet};
pub use package::{Package, ARTIFACT_DIR_NAME};
pub use reports::{DexoptMode, Lifecycle, RelocationReport, RunReport, SessionStatus};

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Tty,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Tty
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}
