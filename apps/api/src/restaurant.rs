//! Restaurant description source. Reads the operator-maintained text file
//! that every prompt is grounded on.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Used whenever the description file is missing or unreadable.
pub const FALLBACK_DESCRIPTION: &str =
    "我们的餐厅提供精致美味的菜品，优雅舒适的环境和热情周到的服务，欢迎您的光临。";

/// Returns the trimmed description at `path`, or `FALLBACK_DESCRIPTION`.
/// Never fails: every I/O problem is logged and replaced with the fallback.
pub async fn load_description(path: &str) -> String {
    let absolute = resolve(path);

    match tokio::fs::read_to_string(&absolute).await {
        Ok(text) => {
            debug!("Loaded restaurant description from {}", absolute.display());
            text.trim().to_string()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Restaurant description file not found: {}, using fallback",
                absolute.display()
            );
            FALLBACK_DESCRIPTION.to_string()
        }
        Err(e) => {
            warn!(
                "Failed to read restaurant description {}: {e}, using fallback",
                absolute.display()
            );
            FALLBACK_DESCRIPTION.to_string()
        }
    }
}

fn resolve(path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
