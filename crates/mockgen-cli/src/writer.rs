//! Mock module and manifest writer

use anyhow::{Context, Result};
use mock_generator::{
    mock_file_name, EndpointMocks, Manifest, MockRun, API_DIR_NAME, DEFAULT_SEED, MANIFEST_FILE_NAME,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// First line of every generated file; files without it are never overwritten
pub const GENERATED_MARKER: &str = "// @generated by openapi-mockgen, changes will be overwritten";

/// Render the mock module of one endpoint
pub fn render_mock_module(mocks: &EndpointMocks) -> String {
    let entries: Vec<String> = mocks
        .responses
        .iter()
        .map(|response| format!("'{}': {}", response.code, response.source()))
        .collect();
    let data = entries.join(",\n");

    let mut module = format!("{}\n", GENERATED_MARKER);
    if mocks.uses_faker() {
        module.push_str("import { faker } from '@faker-js/faker';\n\n");
        module.push_str(&format!("faker.seed({});\n", DEFAULT_SEED));
    }
    module.push_str(&format!("\nexport default {{\n{}\n}};\n", data));
    module
}

/// True if `path` is absent or was written by this tool
pub async fn should_overwrite(path: &Path) -> Result<bool> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(true);
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents.contains(GENERATED_MARKER))
}

/// Path of the mock module of an endpoint
pub fn mock_file_path(output_dir: &Path, mocks: &EndpointMocks) -> PathBuf {
    let endpoint = &mocks.endpoint;
    output_dir
        .join(API_DIR_NAME)
        .join(mock_file_name(endpoint.method.as_lower(), &endpoint.path))
}

/// Write one module per endpoint, returning how many files were written
pub async fn write_mock_modules(run: &MockRun, output_dir: &Path) -> Result<usize> {
    let api_dir = output_dir.join(API_DIR_NAME);
    tokio::fs::create_dir_all(&api_dir)
        .await
        .with_context(|| format!("Failed to create {}", api_dir.display()))?;

    let mut written = 0;
    for mocks in &run.endpoints {
        let path = mock_file_path(output_dir, mocks);
        if !should_overwrite(&path).await? {
            warn!("Skipping {}: not generated by openapi-mockgen", path.display());
            continue;
        }

        tokio::fs::write(&path, render_mock_module(mocks))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {}", path.display());
        written += 1;
    }

    info!("Generated {} mock data files", written);
    Ok(written)
}

/// Write `manifest.json`, keeping entries of endpoints not regenerated this time
pub async fn write_manifest(run: &MockRun, output_dir: &Path) -> Result<Manifest> {
    let manifest_path = output_dir.join(MANIFEST_FILE_NAME);
    let mut manifest = Manifest::from_run(run);

    if tokio::fs::try_exists(&manifest_path).await? {
        let contents = tokio::fs::read_to_string(&manifest_path).await?;
        match serde_json::from_str::<Manifest>(&contents) {
            Ok(existing) => manifest = manifest.merge_existing(existing),
            Err(e) => warn!(
                "The existing {} is corrupted ({}), falling back to overwriting the old file content",
                MANIFEST_FILE_NAME, e
            ),
        }
    }

    tokio::fs::create_dir_all(output_dir).await?;
    let contents = serde_json::to_string_pretty(&manifest)?;

    // Write atomically using temp file
    let temp_path = manifest_path.with_extension("tmp");
    tokio::fs::write(&temp_path, &contents).await?;
    tokio::fs::rename(&temp_path, &manifest_path).await?;

    info!("Wrote {}", manifest_path.display());
    Ok(manifest)
}

/// Remove the output directory before a clean generation
pub async fn clean_output(output_dir: &Path) -> Result<()> {
    if !tokio::fs::try_exists(output_dir).await? {
        warn!("{} not found", output_dir.display());
        return Ok(());
    }

    tokio::fs::remove_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
    info!("Removed {}", output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_generator::{generate_mocks, Config};
    use openapi_parser::{ApiEndpoint, OpenApiParser};
    use tempfile::TempDir;

    const SPEC: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Users", "version": "1"},
        "paths": {
            "/users": {
                "get": {
                    "operationId": "listUsers",
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {"application/json": {"schema": {
                                "type": "object",
                                "properties": {"nickname": {"type": "string", "nullable": true}},
                                "example": {"nickname": "neo"}
                            }}}
                        }
                    }
                },
                "post": {
                    "responses": {
                        "201": {
                            "description": "created",
                            "content": {"application/json": {"schema": {"type": "string", "format": "uuid"}}}
                        }
                    }
                }
            }
        }
    }"#;

    fn run(config: &Config) -> MockRun {
        let document = OpenApiParser::parse(SPEC).unwrap();
        let selected: Vec<&ApiEndpoint> = document.endpoints.iter().collect();
        generate_mocks(&document.organize(&selected).value, config)
    }

    #[test]
    fn test_render_static_module() {
        let run = run(&Config::default());
        let module = render_mock_module(&run.endpoints[0]);

        assert!(module.starts_with(GENERATED_MARKER));
        assert!(!module.contains("import { faker }"));
        assert!(module.contains("'200': {\n  \"nickname\": \"neo\"\n}"));
    }

    #[test]
    fn test_render_dynamic_module_imports_faker() {
        let mut config = Config::default();
        config.dynamic = true;
        let run = run(&config);
        let module = render_mock_module(&run.endpoints[1]);

        assert!(module.contains("import { faker } from '@faker-js/faker';"));
        assert!(module.contains("faker.seed(123);"));
        assert!(module.contains("'201': faker.string.uuid()"));
    }

    #[tokio::test]
    async fn test_write_modules_respects_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join(".mocks");
        let run = run(&Config::default());

        let foreign = output.join("api").join("post-users.js");
        tokio::fs::create_dir_all(foreign.parent().unwrap()).await.unwrap();
        tokio::fs::write(&foreign, "export default {};\n").await.unwrap();

        let written = write_mock_modules(&run, &output).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(tokio::fs::read_to_string(&foreign).await.unwrap(), "export default {};\n");

        // generated files are overwritten on the next run
        assert_eq!(write_mock_modules(&run, &output).await.unwrap(), 1);
        assert!(should_overwrite(&output.join("api").join("get-users.js")).await.unwrap());
    }

    #[tokio::test]
    async fn test_manifest_merge_and_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().to_path_buf();
        let manifest_path = output.join(MANIFEST_FILE_NAME);

        tokio::fs::write(
            &manifest_path,
            r#"{"manifest": [{"method": "DELETE", "path": "/users/{id}", "mockFile": "delete-users-{id}.js"}]}"#,
        )
        .await
        .unwrap();

        let manifest = write_manifest(&run(&Config::default()), &output).await.unwrap();
        assert_eq!(manifest.manifest.len(), 3);
        assert_eq!(manifest.manifest[0].method, "DELETE");
        assert_eq!(manifest.get("GET", "/users").unwrap().nullable_paths, vec!["nickname"]);

        tokio::fs::write(&manifest_path, "{ not json").await.unwrap();
        let manifest = write_manifest(&run(&Config::default()), &output).await.unwrap();
        assert_eq!(manifest.manifest.len(), 2);

        let on_disk: Manifest =
            serde_json::from_str(&tokio::fs::read_to_string(&manifest_path).await.unwrap()).unwrap();
        assert_eq!(on_disk, manifest);
    }

    #[tokio::test]
    async fn test_clean_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join(".mocks");
        tokio::fs::create_dir_all(output.join("api")).await.unwrap();

        clean_output(&output).await.unwrap();
        assert!(!output.exists());
        clean_output(&output).await.unwrap();
    }
}
