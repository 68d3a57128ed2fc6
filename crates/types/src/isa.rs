//! Instruction set definitions

use otadex_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Target instruction set for compiled artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionSet {
    Arm,
    Arm64,
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    Mips,
    Mips64,
}

impl InstructionSet {
    /// Name used in artifact paths and compiler invocations
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Mips => "mips",
            Self::Mips64 => "mips64",
        }
    }

    /// Instruction set of the machine this binary was built for
    #[must_use]
    pub fn host() -> Self {
        if cfg!(target_arch = "x86_64") {
            Self::X86_64
        } else if cfg!(target_arch = "x86") {
            Self::X86
        } else if cfg!(target_arch = "arm") {
            Self::Arm
        } else {
            Self::Arm64
        }
    }
}

impl fmt::Display for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstructionSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arm" => Ok(Self::Arm),
            "arm64" => Ok(Self::Arm64),
            "x86" => Ok(Self::X86),
            "x86_64" => Ok(Self::X86_64),
            "mips" => Ok(Self::Mips),
            "mips64" => Ok(Self::Mips64),
            _ => Err(ConfigError::InvalidValue {
                field: "instruction_set".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Translate native instruction sets into the instruction sets dex code is
/// compiled for.
///
/// Each native set is looked up in `translations` (falling back to itself);
/// the result keeps first-seen order and contains no duplicates.
#[must_use]
pub fn dex_code_instruction_sets(
    native: &[InstructionSet],
    translations: &BTreeMap<InstructionSet, InstructionSet>,
) -> Vec<InstructionSet> {
    let mut out = Vec::with_capacity(native.len());
    for isa in native {
        let dex_isa = translations.get(isa).copied().unwrap_or(*isa);
        if !out.contains(&dex_isa) {
            out.push(dex_isa);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_every_isa() {
        for isa in [
            InstructionSet::Arm,
            InstructionSet::Arm64,
            InstructionSet::X86,
            InstructionSet::X86_64,
            InstructionSet::Mips,
            InstructionSet::Mips64,
        ] {
            assert_eq!(isa.as_str().parse::<InstructionSet>().unwrap(), isa);
        }
        assert!("sparc".parse::<InstructionSet>().is_err());
    }

    #[test]
    fn dex_code_sets_are_translated_and_deduplicated() {
        let mut table = BTreeMap::new();
        table.insert(InstructionSet::Arm, InstructionSet::X86);

        let sets = dex_code_instruction_sets(
            &[
                InstructionSet::Arm,
                InstructionSet::Arm64,
                InstructionSet::X86,
            ],
            &table,
        );
        assert_eq!(sets, vec![InstructionSet::X86, InstructionSet::Arm64]);
    }

    #[test]
    fn serde_names_match_artifact_names() {
        let json = serde_json::to_string(&InstructionSet::X86_64).unwrap();
        assert_eq!(json, r#""x86_64""#);
        let json = serde_json::to_string(&InstructionSet::Arm64).unwrap();
        assert_eq!(json, r#""arm64""#);
    }
}
