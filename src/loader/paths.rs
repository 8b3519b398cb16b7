use std::path::{Component, Path, PathBuf};

/// Resolve a path as written in a solution or manifest against `base_dir`.
///
/// Windows separators are accepted on every platform, and `.`/`..` segments
/// are folded lexically so that two spellings of the same manifest compare
/// equal without touching the file system.
pub fn resolve_path(base_dir: &Path, raw: &str) -> PathBuf {
    let cleaned = raw.trim().replace('\\', "/");
    let candidate = Path::new(&cleaned);
    if candidate.is_absolute() {
        normalize(candidate)
    } else {
        normalize(&base_dir.join(candidate))
    }
}

/// Lexically remove `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// File stem of a manifest path, used as the project name of a reference.
pub fn manifest_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
