use std::path::Path;

use crate::error::{parse_json, CoreError};
use crate::types::CoreConfig;

/// Leser inn konfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres default-konfig.
pub fn load_config(path: impl AsRef<Path>) -> Result<CoreConfig, CoreError> {
    let path = path.as_ref();
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let cfg: CoreConfig = parse_json(&contents)?;
        log::info!(
            "📂 Konfig lastet fra {} (remote={})",
            path.display(),
            cfg.verification_url.is_some()
        );
        Ok(cfg)
    } else {
        log::warn!("⚠️ Fant ikke konfig på {}, bruker default", path.display());
        Ok(CoreConfig::default())
    }
}

/// Lagrer konfig til disk som JSON (pretty-print).
pub fn save_config(cfg: &CoreConfig, path: impl AsRef<Path>) -> Result<(), CoreError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(cfg)?;
    std::fs::write(path, json)?;
    log::info!("✅ Konfig lagret til {}", path.display());
    Ok(())
}
