use anyhow::Result;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Checked in order; the first one set wins.
const ENV_API_KEYS: [&str; 2] = ["MAILAGENT_API_KEY", "OPENAI_API_KEY"];

const KEYRING_SERVICE: &str = "mailagent";
const KEYRING_USER: &str = "api_key";

/// Where the API key was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Keyring,
    File,
    ConfigFile,
}

pub struct CredentialStore {
    key_file: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        let key_file = crate::config::Config::config_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".api_key");

        Self { key_file }
    }

    fn env_api_key() -> Option<String> {
        ENV_API_KEYS
            .iter()
            .filter_map(|name| env::var(name).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }

    fn keyring_get(&self) -> Option<String> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
        entry.get_password().ok()
    }

    fn keyring_set(&self, key: &str) -> bool {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            entry.set_password(key).is_ok()
        } else {
            false
        }
    }

    /// Read key from file fallback
    fn file_get(&self) -> Option<String> {
        fs::read_to_string(&self.key_file)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Write key to file fallback (with restricted permissions)
    fn file_set(&self, key: &str) -> Result<()> {
        if let Some(parent) = self.key_file.parent() {
            fs::create_dir_all(parent)?;
        }

        #[cfg(unix)]
        {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.key_file)?;
            file.write_all(key.as_bytes())?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.key_file, key)?;
        }

        Ok(())
    }

    /// Resolve the API key: environment, keyring, key file, then the value
    /// from the config file.
    pub fn api_key(&self, from_config: Option<&str>) -> Result<(String, KeySource)> {
        if let Some(key) = Self::env_api_key() {
            return Ok((key, KeySource::Environment));
        }

        if let Some(key) = self.keyring_get() {
            return Ok((key, KeySource::Keyring));
        }

        if let Some(key) = self.file_get() {
            return Ok((key, KeySource::File));
        }

        if let Some(key) = from_config.map(str::trim).filter(|k| !k.is_empty()) {
            return Ok((key.to_string(), KeySource::ConfigFile));
        }

        anyhow::bail!(
            "API key not found. Set MAILAGENT_API_KEY or OPENAI_API_KEY, or run 'mailagent setup'."
        )
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        if self.keyring_set(key) && self.keyring_get().as_deref() == Some(key) {
            return Ok(());
        }

        eprintln!("Note: Keyring unavailable, using file-based storage.");
        self.file_set(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent parallel test interference with env vars
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn store_in_temp(name: &str) -> CredentialStore {
        CredentialStore {
            key_file: env::temp_dir()
                .join(format!("mailagent-test-{}-{}", name, std::process::id()))
                .join(".api_key"),
        }
    }

    #[test]
    fn test_env_key_wins() {
        let _guard = ENV_MUTEX.lock().unwrap();
        // SAFETY: env access is serialized by ENV_MUTEX
        unsafe {
            env::set_var("MAILAGENT_API_KEY", "  sk-env  ");
        }

        let (key, source) = store_in_temp("env").api_key(Some("sk-config")).unwrap();

        unsafe {
            env::remove_var("MAILAGENT_API_KEY");
        }
        assert_eq!(key, "sk-env");
        assert_eq!(source, KeySource::Environment);
    }

    #[test]
    fn test_file_fallback_round_trip() {
        let store = store_in_temp("file");
        store.file_set("sk-file\n").unwrap();

        assert_eq!(store.file_get().as_deref(), Some("sk-file"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&store.key_file).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let _ = fs::remove_dir_all(store.key_file.parent().unwrap());
    }
}
