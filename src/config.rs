use crate::error::{RaterError, Result};
use crate::types::config::RaterConfig;
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;

pub const DEFAULT_CONFIG_FILE: &str = "rater.toml";
pub const DEFAULT_LOCAL_FILE: &str = ".rater/local.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/artifact-rater/config.toml";

/// Load the layered configuration: global, then project (`rater.toml` in
/// `root` or the explicit path), then the local override. Missing layers are
/// skipped; with no layers at all the defaults apply.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<RaterConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(RaterError::PathNotFound(path.display().to_string()));
        }
    }
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_with_global(root, explicit, global.as_deref())
}

pub(crate) fn load_config_with_global(
    root: &Path,
    explicit: Option<&Path>,
    global_path: Option<&Path>,
) -> Result<RaterConfig> {
    let project_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));

    let mut merged = Value::Table(Map::new());
    if let Some(path) = global_path {
        merge_file_if_exists(&mut merged, path)?;
    }
    merge_file_if_exists(&mut merged, &project_path)?;
    merge_file_if_exists(&mut merged, &root.join(DEFAULT_LOCAL_FILE))?;

    let cfg: RaterConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| RaterError::ConfigParse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn merge_file_if_exists(merged: &mut Value, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    tracing::debug!(path = %path.display(), "merging config layer");
    let value = read_toml_value(path)?;
    merge_toml(merged, value);
    Ok(())
}

fn read_toml_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| RaterError::ConfigParse(format!("{}: {}", path.display(), e)))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_config_defaults_when_no_layers_exist() {
        let dir = TempDir::new().expect("temp dir should be created");
        let cfg = load_config_with_global(dir.path(), None, None).expect("load should not fail");
        assert_eq!(cfg.engine.workers, 8);
        assert!(cfg.weights.is_none());
    }

    #[test]
    fn load_config_merges_global_project_and_local_in_order() {
        let root = TempDir::new().expect("root temp dir should be created");
        let global_root = TempDir::new().expect("global temp dir should be created");
        let global_path = global_root.path().join("config.toml");

        fs::write(
            &global_path,
            r#"
[engine]
workers = 2

[code_host]
token_env = "GLOBAL_TOKEN"
max_pulls = 10
"#,
        )
        .expect("global config should write");

        fs::write(
            root.path().join(DEFAULT_CONFIG_FILE),
            r#"
[engine]
workers = 6

[code_host]
max_pulls = 20
"#,
        )
        .expect("project config should write");

        fs::create_dir_all(root.path().join(".rater")).expect("local dir should create");
        fs::write(
            root.path().join(DEFAULT_LOCAL_FILE),
            r#"
[code_host]
max_pulls = 5
"#,
        )
        .expect("local override should write");

        let cfg = load_config_with_global(root.path(), None, Some(&global_path))
            .expect("load should succeed");

        assert_eq!(cfg.engine.workers, 6);
        assert_eq!(cfg.code_host.token_env, "GLOBAL_TOKEN");
        assert_eq!(cfg.code_host.max_pulls, 5);
    }

    #[test]
    fn explicit_path_replaces_project_file() {
        let root = TempDir::new().expect("root temp dir should be created");
        fs::write(root.path().join(DEFAULT_CONFIG_FILE), "[engine]\nworkers = 3\n")
            .expect("project config should write");
        let explicit = root.path().join("ci.toml");
        fs::write(&explicit, "[engine]\nworkers = 9\n").expect("explicit config should write");

        let cfg = load_config_with_global(root.path(), Some(&explicit), None)
            .expect("load should succeed");
        assert_eq!(cfg.engine.workers, 9);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let root = TempDir::new().expect("root temp dir should be created");
        let err = load_config(root.path(), Some(&root.path().join("absent.toml")))
            .expect_err("missing explicit config should fail");
        assert!(matches!(err, RaterError::PathNotFound(_)));
    }

    #[test]
    fn invalid_layer_fails_validation() {
        let root = TempDir::new().expect("root temp dir should be created");
        fs::write(root.path().join(DEFAULT_CONFIG_FILE), "[weights]\nlicense = 0.7\n")
            .expect("project config should write");
        let err = load_config_with_global(root.path(), None, None)
            .expect_err("bad weights should fail");
        assert!(err.to_string().contains("must sum to 1.0"));
    }
}
