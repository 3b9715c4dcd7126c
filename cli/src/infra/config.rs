//! Infrastructure implementation of the `ConfigStore` port.

use std::path::PathBuf;

use anyhow::{Context, Result};
use handoff_common::{ClientConfig, RetentionPolicy};

use crate::application::ports::ConfigStore;

/// Production `ConfigStore` backed by a JSON file on disk.
///
/// The format is shared with other handoff clients, so it stays JSON
/// rather than this crate's preferred config syntax.
#[derive(Default)]
pub struct JsonConfigStore;

impl JsonConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Result<ClientConfig> {
        let path = self.path()?;
        if !path.exists() {
            // First run: mint an identity and persist it so every ledger
            // entry this client ever writes carries the same id.
            let config = ClientConfig {
                client_id: generate_client_id(),
                endpoint: String::new(),
                server_name: String::new(),
                retention: RetentionPolicy::default(),
            };
            self.save(&config)?;
            return Ok(config);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn save(&self, config: &ClientConfig) -> Result<()> {
        let path = self.path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(config).context("cannot serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("cannot write {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", path.display()))?;
        }
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        if let Ok(val) = std::env::var("HANDOFF_CONFIG") {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".handoff").join("config.json"))
    }
}

/// Generate a fresh client identifier: 30 decimal digits.
///
/// Entropy sources: nanosecond timestamp and independent `RandomState`
/// hashes — no crypto needed, the id only has to be unique among the
/// handful of clients sharing an endpoint.
#[must_use]
pub fn generate_client_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut digits = String::with_capacity(40);
    while digits.len() < 30 {
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u128(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
        );
        hasher.write_u64(RandomState::new().build_hasher().finish());
        digits.push_str(&format!("{:020}", hasher.finish()));
    }
    digits.truncate(30);
    digits
}
