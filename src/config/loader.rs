use std::fs;
use std::path::{Path, PathBuf};

use super::SplitmapConfig;
use crate::errors::ConfigValidationError;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".splitmap.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse configuration from TOML text. `path` is only used for error messages.
pub fn parse_config(contents: &str, path: &Path) -> Result<SplitmapConfig, ConfigValidationError> {
    toml::from_str::<SplitmapConfig>(contents).map_err(|e| ConfigValidationError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

fn read_config(path: &Path) -> Result<SplitmapConfig, ConfigValidationError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigValidationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents, path)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Directories from `start` upward, at most `max_depth` of them.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load configuration.
///
/// An explicit path must exist and parse. Without one, the nearest
/// `.splitmap.toml` in `search_from` or its ancestors is used; when none
/// exists the defaults apply. A discovered file that fails to parse is still
/// an error.
pub fn load_config(
    explicit: Option<&Path>,
    search_from: &Path,
) -> Result<SplitmapConfig, ConfigValidationError> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    match directory_ancestors(search_from.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
    {
        Some(path) => read_config(&path),
        None => {
            debug!(
                "No {} found after checking {} directories. Using default config.",
                CONFIG_FILE_NAME, MAX_TRAVERSAL_DEPTH
            );
            Ok(SplitmapConfig::default())
        }
    }
}
