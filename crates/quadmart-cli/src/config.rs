use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use quadmart_app::{DomainPolicy, REQUIRED_DOMAIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    File,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "file" => Ok(Self::File),
            other => bail!("QUADMART_BACKEND must be 'sqlite' or 'file', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub allowed_domain: String,
    pub user_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = get("QUADMART_BACKEND")
            .map(|v| v.parse::<BackendKind>())
            .transpose()?
            .unwrap_or(BackendKind::Sqlite);

        Ok(Self {
            backend,
            db_path: get("QUADMART_DB_PATH")
                .unwrap_or_else(|| "quadmart.db".into())
                .into(),
            data_dir: get("QUADMART_DATA_DIR")
                .unwrap_or_else(|| "./quadmart-data".into())
                .into(),
            allowed_domain: get("QUADMART_ALLOWED_DOMAIN").unwrap_or_else(|| REQUIRED_DOMAIN.into()),
            user_email: get("QUADMART_USER_EMAIL").filter(|v| !v.trim().is_empty()),
        })
    }

    pub fn domain_policy(&self) -> DomainPolicy {
        DomainPolicy::new(&self.allowed_domain)
    }

    /// The signed-in user for commands that change listings.
    pub fn require_user(&self) -> Result<&str> {
        let email = self
            .user_email
            .as_deref()
            .context("QUADMART_USER_EMAIL must be set to change listings")?;

        let policy = self.domain_policy();
        if !policy.allows(email) {
            bail!("Not allowed: use your {} email.", policy.suffix());
        }
        Ok(email)
    }
}
