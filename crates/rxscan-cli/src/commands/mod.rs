//! Subcommand implementations and the helpers they share.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod validate;

use std::path::{Path, PathBuf};

use tracing::debug;

use rxscan_core::{GeminiBackend, PrescriptionAnalyzer, RxConfig, VisionExtractor};

/// Analyzer wired to the Gemini backend.
pub type GeminiAnalyzer = PrescriptionAnalyzer<VisionExtractor<GeminiBackend>>;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rxscan")
        .join("config.json")
}

/// Resolve the config file a command should use.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load and check configuration.
///
/// An explicit path must exist; the default location is optional.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<RxConfig> {
    let config = match explicit {
        Some(path) => read_config(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                read_config(&path)?
            } else {
                debug!("No config file at {}, using defaults", path.display());
                RxConfig::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<RxConfig> {
    RxConfig::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))
}

/// Build an analyzer talking to the configured model.
pub fn build_analyzer(config: &RxConfig) -> anyhow::Result<GeminiAnalyzer> {
    if config.model.provider != "gemini" {
        anyhow::bail!(
            "Unsupported model provider '{}' (supported: gemini)",
            config.model.provider
        );
    }

    let api_key = config.model.resolve_api_key()?;
    let backend = GeminiBackend::new(api_key, &config.model.model_name, config.model.timeout())?
        .with_base_url(&config.model.base_url);
    let extractor = VisionExtractor::from_config(backend, &config.model);

    Ok(PrescriptionAnalyzer::from_config(extractor, config)?)
}

/// Image extensions picked up by the analyzer.
pub fn is_image_path(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    matches!(
        ext.as_str(),
        "png" | "jpg" | "jpeg" | "webp" | "bmp" | "gif" | "tif" | "tiff"
    )
}
