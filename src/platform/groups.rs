//! Curated platform groups usable by name in `-p`.

/// Name, description and ordered labels of each built-in group.
pub const PLATFORM_GROUPS: &[(&str, &str, &[&str])] = &[
    (
        "default",
        "Desktop platforms plus Android/arm64",
        &[
            "windows/amd64",
            "windows/386",
            "windows/arm64",
            "linux/amd64",
            "linux/386",
            "linux/arm64",
            "linux/arm",
            "darwin/amd64",
            "darwin/arm64",
            "android/arm64",
        ],
    ),
    (
        "desktop",
        "Windows, Linux and macOS",
        &[
            "windows/amd64",
            "windows/386",
            "windows/arm64",
            "linux/amd64",
            "linux/386",
            "linux/arm64",
            "linux/arm",
            "darwin/amd64",
            "darwin/arm64",
        ],
    ),
    (
        "server",
        "Linux and FreeBSD servers",
        &["linux/amd64", "linux/arm64", "freebsd/amd64", "freebsd/arm64"],
    ),
    (
        "mobile",
        "Android and iOS (needs cgo toolchains)",
        &["android/arm64", "android/arm", "ios/amd64", "ios/arm64"],
    ),
    ("web", "WebAssembly", &["js/wasm"]),
    (
        "embedded",
        "ARM, MIPS and RISC-V boards",
        &[
            "linux/arm",
            "linux/arm64",
            "linux/mips",
            "linux/mips64",
            "linux/riscv64",
        ],
    ),
];

/// Keyword that expands to the whole catalog.
pub const ALL_KEYWORD: &str = "all";

pub fn group(name: &str) -> Option<&'static [&'static str]> {
    PLATFORM_GROUPS
        .iter()
        .find(|(group_name, _, _)| *group_name == name)
        .map(|(_, _, labels)| *labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::BuildTarget;

    #[test]
    fn test_known_groups() {
        assert_eq!(group("web"), Some(&["js/wasm"][..]));
        assert_eq!(group("server").map(|g| g.len()), Some(4));
        assert!(group("all").is_none());
        assert!(group("nope").is_none());
    }

    #[test]
    fn test_group_labels_are_well_formed() {
        for (name, _, labels) in PLATFORM_GROUPS {
            for label in *labels {
                assert!(
                    BuildTarget::parse(label).is_some(),
                    "group {name} has bad label {label}"
                );
            }
        }
    }
}
