use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Search API credentials: the static API key and the programmable
/// search engine id. Keep the secrets file local, never commit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secrets {
    pub my_key: String,
    pub my_cx: String,
}

pub fn default_secrets_path() -> PathBuf {
    PathBuf::from("secret.toml")
}

pub fn load_secrets(path: Option<&Path>) -> anyhow::Result<Secrets> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_secrets_path);
    if !path.exists() {
        anyhow::bail!(
            "secrets file not found at {} (expected keys: my_key, my_cx)",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)?;
    let secrets: Secrets = toml::from_str(&contents)?;
    Ok(secrets)
}
