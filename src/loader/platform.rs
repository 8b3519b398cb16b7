//! Platform-level helpers shared by every loading strategy: target platform
//! moniker normalization and the built-in framework reference prefilter.

use crate::core::UNKNOWN_PLATFORM;

/// Namespaces whose assemblies ship with the platform itself.
const PLATFORM_PREFIXES: &[&str] = &["system.", "microsoft."];

/// Core runtime libraries that carry no namespace prefix.
const CORE_RUNTIME_NAMES: &[&str] = &[
    "system",
    "mscorlib",
    "netstandard",
    "windowsbase",
    "presentationcore",
    "presentationframework",
];

/// True when an external reference names a platform/runtime library.
///
/// Applied before graph assembly so thousands of framework edges never
/// reach the configurable filter.
pub fn is_platform_reference(name: &str) -> bool {
    let lowered = name.trim().to_ascii_lowercase();
    PLATFORM_PREFIXES.iter().any(|p| lowered.starts_with(p))
        || CORE_RUNTIME_NAMES.contains(&lowered.as_str())
}

/// Convert a legacy `TargetFrameworkVersion` (`v4.7.2`) into a moniker (`net472`).
pub fn legacy_version_to_moniker(version: &str) -> Option<String> {
    let digits: String = version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("net{digits}"))
}

/// First entry of a `;`-separated `TargetFrameworks` value.
pub fn first_framework(frameworks: &str) -> Option<String> {
    frameworks
        .split(';')
        .map(str::trim)
        .find(|f| !f.is_empty())
        .map(|f| f.to_string())
}

/// Pick the target platform from the three places a manifest can declare it.
///
/// Single-value wins over multi-value, which wins over the legacy version
/// attribute. Falls back to [`UNKNOWN_PLATFORM`].
pub fn resolve_target_platform(
    single: Option<&str>,
    multi: Option<&str>,
    legacy_version: Option<&str>,
) -> String {
    single
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .or_else(|| multi.and_then(first_framework))
        .or_else(|| legacy_version.and_then(legacy_version_to_moniker))
        .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string())
}

/// Assembly identity name from a `Reference Include` value
/// (`Newtonsoft.Json, Version=13.0.0.0, Culture=neutral` -> `Newtonsoft.Json`).
pub fn assembly_identity_name(include: &str) -> &str {
    include.split(',').next().unwrap_or(include).trim()
}
