//! Compiler invocation types
//!
//! A [`DexoptInvocation`] is the structured request an optimization policy
//! hands to an execution backend. Its serialized form, [`DexoptCommand`], is
//! opaque to everything except whatever ends up executing it.

use otadex_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::PathBuf;
use std::str::FromStr;

use crate::InstructionSet;

/// Wire text returned when a session has no command left to hand out
pub const NOTHING_TO_DO: &str = "Nothing to do";

/// Why a package is being compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DexoptReason {
    FirstBoot,
    Boot,
    Install,
    BgDexopt,
    AbOta,
    NsysLibrary,
    SharedApk,
    ForcedDexopt,
}

impl DexoptReason {
    /// Compiler filter used when no override is configured
    #[must_use]
    pub fn default_filter(self) -> CompilerFilter {
        match self {
            Self::FirstBoot | Self::Install | Self::ForcedDexopt => CompilerFilter::InterpretOnly,
            Self::Boot => CompilerFilter::VerifyProfile,
            Self::BgDexopt | Self::AbOta => CompilerFilter::SpeedProfile,
            Self::NsysLibrary | Self::SharedApk => CompilerFilter::Speed,
        }
    }

    /// Short reason code
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstBoot => "first-boot",
            Self::Boot => "boot",
            Self::Install => "install",
            Self::BgDexopt => "bg-dexopt",
            Self::AbOta => "ab-ota",
            Self::NsysLibrary => "nsys-library",
            Self::SharedApk => "shared-apk",
            Self::ForcedDexopt => "forced-dexopt",
        }
    }
}

impl fmt::Display for DexoptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How aggressively the compiler optimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerFilter {
    VerifyNone,
    VerifyAtRuntime,
    VerifyProfile,
    InterpretOnly,
    SpaceProfile,
    Space,
    SpeedProfile,
    Speed,
    EverythingProfile,
    Everything,
}

impl CompilerFilter {
    /// Filter name as understood by the compiler
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VerifyNone => "verify-none",
            Self::VerifyAtRuntime => "verify-at-runtime",
            Self::VerifyProfile => "verify-profile",
            Self::InterpretOnly => "interpret-only",
            Self::SpaceProfile => "space-profile",
            Self::Space => "space",
            Self::SpeedProfile => "speed-profile",
            Self::Speed => "speed",
            Self::EverythingProfile => "everything-profile",
            Self::Everything => "everything",
        }
    }

    /// Whether the filter consumes profile data
    #[must_use]
    pub fn is_profile_guided(self) -> bool {
        matches!(
            self,
            Self::VerifyProfile | Self::SpaceProfile | Self::SpeedProfile | Self::EverythingProfile
        )
    }
}

impl fmt::Display for CompilerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompilerFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s {
            "verify-none" => Self::VerifyNone,
            "verify-at-runtime" => Self::VerifyAtRuntime,
            "verify-profile" => Self::VerifyProfile,
            "interpret-only" => Self::InterpretOnly,
            "space-profile" => Self::SpaceProfile,
            "space" => Self::Space,
            "speed-profile" => Self::SpeedProfile,
            "speed" => Self::Speed,
            "everything-profile" => Self::EverythingProfile,
            "everything" => Self::Everything,
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "compiler_filter".to_string(),
                    value: s.to_string(),
                })
            }
        };
        Ok(filter)
    }
}

/// Bit flags passed through to the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DexoptFlags(u32);

impl DexoptFlags {
    pub const NONE: Self = Self(0);
    pub const PUBLIC: Self = Self(1 << 1);
    pub const SAFEMODE: Self = Self(1 << 2);
    pub const DEBUGGABLE: Self = Self(1 << 3);
    pub const BOOTCOMPLETE: Self = Self(1 << 4);
    pub const PROFILE_GUIDED: Self = Self(1 << 5);
    pub const OTA: Self = Self(1 << 6);

    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DexoptFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DexoptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One compiler invocation for one code path and instruction set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexoptInvocation {
    pub code_path: PathBuf,
    pub uid: u32,
    pub package_name: String,
    pub instruction_set: InstructionSet,
    pub output_dir: Option<PathBuf>,
    pub flags: DexoptFlags,
    pub compiler_filter: CompilerFilter,
    pub shared_libraries: Vec<PathBuf>,
}

impl DexoptInvocation {
    /// Serialize into the space separated `dexopt` wire command
    ///
    /// Absent output directories and empty library lists are written as `!`.
    #[must_use]
    pub fn to_command(&self) -> DexoptCommand {
        let output_dir = self
            .output_dir
            .as_ref()
            .map_or_else(|| "!".to_string(), |dir| dir.display().to_string());
        let libraries = if self.shared_libraries.is_empty() {
            "!".to_string()
        } else {
            self.shared_libraries
                .iter()
                .map(|lib| lib.display().to_string())
                .collect::<Vec<_>>()
                .join(":")
        };

        DexoptCommand::new(format!(
            "dexopt {} {} {} {} {} {} {} {}",
            self.code_path.display(),
            self.uid,
            self.package_name,
            self.instruction_set,
            output_dir,
            self.flags.bits(),
            self.compiler_filter,
            libraries,
        ))
    }
}

/// Opaque serialized compiler command
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DexoptCommand(String);

impl DexoptCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DexoptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DexoptCommand {
    fn from(command: String) -> Self {
        Self(command)
    }
}

/// Result of asking a session for its next command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextCommand {
    /// A command to execute
    Command(DexoptCommand),
    /// No work remains; poll `is_done` to confirm completion
    NothingToDo,
}

impl NextCommand {
    /// Text handed across the transport boundary
    #[must_use]
    pub fn as_wire_str(&self) -> &str {
        match self {
            Self::Command(command) => command.as_str(),
            Self::NothingToDo => NOTHING_TO_DO,
        }
    }

    #[must_use]
    pub fn into_command(self) -> Option<DexoptCommand> {
        match self {
            Self::Command(command) => Some(command),
            Self::NothingToDo => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> DexoptInvocation {
        DexoptInvocation {
            code_path: PathBuf::from("/data/app/com.example-1/base.apk"),
            uid: 10_042,
            package_name: "com.example".to_string(),
            instruction_set: InstructionSet::Arm64,
            output_dir: Some(PathBuf::from("/data/app/com.example-1/oat")),
            flags: DexoptFlags::PUBLIC | DexoptFlags::OTA,
            compiler_filter: CompilerFilter::SpeedProfile,
            shared_libraries: vec![
                PathBuf::from("/system/framework/a.jar"),
                PathBuf::from("/system/framework/b.jar"),
            ],
        }
    }

    #[test]
    fn invocation_serializes_to_wire_command() {
        assert_eq!(
            invocation().to_command().as_str(),
            "dexopt /data/app/com.example-1/base.apk 10042 com.example arm64 \
             /data/app/com.example-1/oat 66 speed-profile \
             /system/framework/a.jar:/system/framework/b.jar"
        );
    }

    #[test]
    fn missing_fields_serialize_as_bang() {
        let mut inv = invocation();
        inv.output_dir = None;
        inv.shared_libraries.clear();
        let command = inv.to_command();
        let fields: Vec<&str> = command.as_str().split(' ').collect();
        assert_eq!(fields[5], "!");
        assert_eq!(fields[8], "!");
    }

    #[test]
    fn flags_combine() {
        let mut flags = DexoptFlags::PUBLIC;
        flags |= DexoptFlags::OTA;
        assert!(flags.contains(DexoptFlags::OTA));
        assert!(flags.contains(DexoptFlags::PUBLIC));
        assert!(!flags.contains(DexoptFlags::SAFEMODE));
    }

    #[test]
    fn ab_ota_defaults_to_speed_profile() {
        assert_eq!(
            DexoptReason::AbOta.default_filter(),
            CompilerFilter::SpeedProfile
        );
        assert!(CompilerFilter::SpeedProfile.is_profile_guided());
        assert_eq!(
            "speed-profile".parse::<CompilerFilter>().unwrap(),
            CompilerFilter::SpeedProfile
        );
    }

    #[test]
    fn sentinel_has_stable_wire_text() {
        assert_eq!(NextCommand::NothingToDo.as_wire_str(), "Nothing to do");
        assert_eq!(NextCommand::NothingToDo.into_command(), None);
    }
}
