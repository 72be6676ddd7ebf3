//! Configuration discovery and loading

use std::fs;
use std::path::{Path, PathBuf};

use tedlt_core::{ConfigDocument, Configuration, DocumentFormat};

use crate::error::{CliError, Result};

/// File name looked up in the user config directory and the working directory
pub const CONFIG_FILE_NAME: &str = "tedlt.toml";

/// Default document locations, lowest precedence first.
pub fn default_search_paths(cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tedlt").join(CONFIG_FILE_NAME));
    }
    paths.push(cwd.join(CONFIG_FILE_NAME));
    paths
}

/// Load the documents named on the command line, or the default locations
/// when none were given.
pub fn load_configuration(explicit: &[PathBuf], cwd: &Path) -> Result<Configuration> {
    let paths: Vec<PathBuf> = if explicit.is_empty() {
        let candidates = default_search_paths(cwd);
        let found: Vec<PathBuf> = candidates.iter().filter(|p| p.is_file()).cloned().collect();
        if found.is_empty() {
            let searched: Vec<String> =
                candidates.iter().map(|p| p.display().to_string()).collect();
            return Err(CliError::user(format!(
                "No configuration found. Searched: {}",
                searched.join(", ")
            )));
        }
        found
    } else {
        explicit.to_vec()
    };

    let mut documents = Vec::with_capacity(paths.len());
    for path in &paths {
        documents.push(load_document(path)?);
    }
    Ok(Configuration::from_documents(documents))
}

/// Read and parse one document, choosing the format by extension.
pub fn load_document(path: &Path) -> Result<ConfigDocument> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format = DocumentFormat::from_extension(extension).ok_or_else(|| {
        CliError::user(format!(
            "Unsupported configuration format '{}' for {} \
             (expected .toml, .json, .jsonc, .json5, .yaml or .yml)",
            extension,
            path.display()
        ))
    })?;

    let content = fs::read_to_string(path).map_err(|e| {
        CliError::user(format!("Failed to read {}: {}", path.display(), e))
    })?;

    tracing::debug!(
        path = %path.display(),
        format = format.name(),
        "Loading configuration document"
    );
    ConfigDocument::parse(&content, format).map_err(|source| CliError::Document {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_documents_layer_in_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("team.toml");
        let second = temp.path().join("me.json");
        fs::write(&first, "[profiles.work]\nproperties = { project_key = \"TEAM\" }\n").unwrap();
        fs::write(&second, r#"{"profiles": {"work": {"properties": {"project_key": "ME"}}}}"#)
            .unwrap();

        let config = load_configuration(&[first, second], temp.path()).unwrap();
        let work = config.profiles.get("work").unwrap();
        assert_eq!(work.properties()["project_key"].to_string(), "ME");
    }

    #[test]
    fn working_directory_document_is_found() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "default_profile = \"x\"\n").unwrap();

        let config = load_configuration(&[], temp.path()).unwrap();
        assert_eq!(config.profiles.default_profile(), Some("x"));
    }

    #[test]
    fn json5_document_with_comments_loads() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("team.json5");
        fs::write(
            &path,
            "// team defaults\n{ profiles: { work: { properties: { project_key: 'W5', }, }, }, }\n",
        )
        .unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.profiles[0].properties()["project_key"].to_string(), "W5");
    }

    #[test]
    fn unsupported_extension_is_a_user_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tedlt.ini");
        fs::write(&path, "").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
        assert!(err.to_string().contains("tedlt.ini"));
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.toml");
        fs::write(&path, "[profiles.work").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, CliError::Document { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = load_configuration(&[temp.path().join("nope.toml")], temp.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
