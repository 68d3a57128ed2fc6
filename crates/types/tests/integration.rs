//! Integration tests for types

#[cfg(test)]
mod tests {
    use otadex_types::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn any_isa() -> impl Strategy<Value = InstructionSet> {
        prop_oneof![
            Just(InstructionSet::Arm),
            Just(InstructionSet::Arm64),
            Just(InstructionSet::X86),
            Just(InstructionSet::X86_64),
            Just(InstructionSet::Mips),
            Just(InstructionSet::Mips64),
        ]
    }

    proptest! {
        #[test]
        fn dex_code_sets_never_repeat(native in proptest::collection::vec(any_isa(), 0..12)) {
            let sets = dex_code_instruction_sets(&native, &BTreeMap::new());
            for (i, isa) in sets.iter().enumerate() {
                prop_assert!(!sets[i + 1..].contains(isa));
                prop_assert!(native.contains(isa));
            }
        }
    }

    #[test]
    fn test_package_manifest_roundtrip() {
        let pkg = Package::new("com.example", "/data/app/com.example-1/base.apk")
            .with_code_path("/data/app/com.example-1/split_a.apk")
            .with_instruction_set(InstructionSet::Arm64)
            .with_shared_library("/system/framework/org.apache.http.legacy.jar");

        let json = serde_json::to_string(&pkg).unwrap();
        let back: Package = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pkg);
        assert_eq!(back.code_paths.len(), 2);
    }

    #[test]
    fn test_command_is_transparent_on_the_wire() {
        let command = DexoptCommand::new("dexopt /a.apk 0 a arm64 ! 64 speed !");
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#""dexopt /a.apk 0 a arm64 ! 64 speed !""#);
        assert_eq!(command.to_string(), command.as_str());
    }

    #[test]
    fn test_invocation_command_keeps_package_name() {
        let invocation = DexoptInvocation {
            code_path: PathBuf::from("/data/app/a/base.apk"),
            uid: 0,
            package_name: "a".to_string(),
            instruction_set: InstructionSet::X86_64,
            output_dir: None,
            flags: DexoptFlags::OTA,
            compiler_filter: CompilerFilter::Speed,
            shared_libraries: Vec::new(),
        };
        let command = invocation.to_command();
        assert!(command.as_str().starts_with("dexopt /data/app/a/base.apk 0 a x86_64 "));
    }

    #[test]
    fn test_lifecycle_serialization() {
        let json = serde_json::to_string(&Lifecycle::Exhausted).unwrap();
        assert_eq!(json, r#""exhausted""#);
        assert_eq!(DexoptMode::Direct.to_string(), "direct");
    }
}
