//! `init`, `list` and `generate`

use anyhow::{Context, Result};
use mock_generator::{generate_mocks, Config, ConfigManager, MockRun};
use openapi_parser::{ApiEndpoint, EndpointGroups, OpenApiParser};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::writer;

/// Flags of `init`
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub spec_path: String,
    pub output_dir: String,
    pub base_url: Option<String>,
    pub array_length: usize,
    pub dynamic: bool,
    pub force: bool,
}

/// Flags of `generate`
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub clean: bool,
    /// Only endpoints of groups whose label contains this
    pub group: Option<String>,
    /// Only endpoints whose path contains this
    pub path: Option<String>,
}

/// Write a fresh config file
pub async fn init(config_file: &Path, options: InitOptions) -> Result<ConfigManager> {
    if tokio::fs::try_exists(config_file).await? && !options.force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite it",
            config_file.display()
        );
    }

    let config = Config {
        spec_path: options.spec_path,
        output_dir: options.output_dir,
        base_url: options.base_url,
        array_length: options.array_length,
        dynamic: options.dynamic,
        ..Config::default()
    };

    let manager = ConfigManager::create(config_file, config);
    manager
        .save()
        .await
        .with_context(|| format!("Failed to write {}", config_file.display()))?;

    info!("Config initialized at {}", config_file.display());
    Ok(manager)
}

/// Group labels of the configured spec, each with its endpoints
pub async fn list(config_file: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let manager = ConfigManager::load(config_file).await?;
    let spec_path = relative_to(config_file, &manager.get().spec_path);
    let document = OpenApiParser::load(&spec_path)
        .await
        .with_context(|| format!("Failed to load spec {}", spec_path))?;

    let groups = EndpointGroups::build(&document.endpoints);
    Ok(groups
        .groups
        .iter()
        .map(|(label, endpoints)| {
            let endpoints = endpoints
                .iter()
                .map(|e| format!("{} {}", e.method, e.path))
                .collect();
            (label.clone(), endpoints)
        })
        .collect())
}

/// Endpoints picked by the `--group` and `--path` filters
pub fn select_endpoints<'a>(
    endpoints: &'a [ApiEndpoint],
    options: &GenerateOptions,
) -> Vec<&'a ApiEndpoint> {
    let mut selected: Vec<&'a ApiEndpoint> = match &options.group {
        Some(group) => EndpointGroups::build(endpoints).matching(group),
        None => endpoints.iter().collect(),
    };

    if let Some(needle) = &options.path {
        let needle = needle.to_lowercase();
        selected.retain(|e| e.path.to_lowercase().contains(&needle));
    }

    selected
}

/// Generate mock modules and the manifest for the selected endpoints
pub async fn generate(config_file: &Path, options: GenerateOptions) -> Result<MockRun> {
    let manager = ConfigManager::load(config_file).await?;
    let config = manager.get();
    let output_dir = PathBuf::from(relative_to(config_file, &config.output_dir));

    if options.clean {
        writer::clean_output(&output_dir).await?;
    }

    let spec_path = relative_to(config_file, &config.spec_path);
    let document = OpenApiParser::load(&spec_path)
        .await
        .with_context(|| format!("Failed to load spec {}", spec_path))?;
    info!(
        "Loaded {} {} ({} endpoints)",
        document.title,
        document.version,
        document.endpoints.len()
    );

    let selected = select_endpoints(&document.endpoints, &options);
    if selected.is_empty() {
        warn!("No endpoints matched, nothing to generate");
        return Ok(MockRun::default());
    }

    let organized = document.organize(&selected);
    if !organized.errors.is_empty() {
        let warnings = organized.errors.iter().filter(|e| e.is_warning()).count();
        warn!(
            "{} reference errors and {} circular references while resolving schemas",
            organized.errors.len() - warnings,
            warnings
        );
    }

    let run = generate_mocks(&organized.value, config);
    writer::write_mock_modules(&run, &output_dir).await?;
    writer::write_manifest(&run, &output_dir).await?;
    run.errors.report();

    Ok(run)
}

/// Config paths are relative to the directory holding the config file
fn relative_to(config_file: &Path, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || Path::new(path).is_absolute() {
        return path.to_string();
    }

    match config_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(path).display().to_string(),
        _ => path.to_string(),
    }
}
