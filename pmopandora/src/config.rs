//! Configuration du client Pandora
//!
//! La configuration est un document YAML. Les clés absentes reprennent
//! les valeurs par défaut intégrées, et quelques valeurs peuvent être
//! surchargées par l'environnement :
//!
//! - `PMOPANDORA_CONFIG` : chemin du fichier YAML à charger
//! - `PMOPANDORA_USERNAME` / `PMOPANDORA_PASSWORD` : identifiants de l'auditeur
//! - `PMOPANDORA_PROXY` : proxy HTTP sortant
//!
//! ```rust,no_run
//! use pmopandora::PandoraConfig;
//!
//! let config = PandoraConfig::load(None)?;
//! let (username, _password) = config.credentials()?;
//! println!("Pandora user: {}", username);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmopandora.yaml");

const ENV_CONFIG_FILE: &str = "PMOPANDORA_CONFIG";
const ENV_USERNAME: &str = "PMOPANDORA_USERNAME";
const ENV_PASSWORD: &str = "PMOPANDORA_PASSWORD";
const ENV_PROXY: &str = "PMOPANDORA_PROXY";

/// Identifiants partenaire (niveau application)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerConfig {
    pub username: String,
    pub password: String,
    pub device_model: String,
}

/// Clés des deux sens de chiffrement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Chiffre les corps de requête
    pub outbound: String,
    /// Déchiffre les URLs audio
    pub inbound: String,
}

/// Limite de fréquence des skips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipConfig {
    /// Nombre maximal de skips dans la fenêtre
    pub max_skips: usize,
    pub window_secs: u64,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            max_skips: 6,
            window_secs: 3600,
        }
    }
}

impl SkipConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Configuration complète du client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PandoraConfig {
    /// Point d'accès auquel sont ajoutés les paramètres de requête
    pub base_url: String,
    pub partner: PartnerConfig,
    pub keys: KeyConfig,
    /// Proxy HTTP sortant optionnel (ex. `http://proxy:3128`)
    pub proxy: Option<String>,
    pub request_timeout_secs: u64,
    /// Format audio demandé avec les fragments de playlist
    pub audio_format: String,
    pub skips: SkipConfig,
    /// Âge au-delà duquel l'URL d'une chanson est périmée sans vérification
    pub song_url_ttl_secs: u64,
    /// Temps d'écoute entre deux publicités
    pub ad_interval_secs: u64,
    /// Retire des noms d'artistes les tags de station du type "(Holiday)"
    pub remove_station_tags: bool,
    /// Nombre de rechargements de playlist autorisés par demande de chanson
    pub max_playlist_fetches: usize,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for PandoraConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.pandora.com/radio/xmlrpc/v30?".to_string(),
            partner: PartnerConfig::default(),
            keys: KeyConfig::default(),
            proxy: None,
            request_timeout_secs: 30,
            audio_format: "mp3-hifi".to_string(),
            skips: SkipConfig::default(),
            song_url_ttl_secs: 3 * 3600,
            ad_interval_secs: 15 * 60,
            remove_station_tags: true,
            max_playlist_fetches: 5,
            username: None,
            password: None,
        }
    }
}

impl PandoraConfig {
    /// Configuration par défaut intégrée
    pub fn embedded() -> Result<Self> {
        serde_yaml::from_str(DEFAULT_CONFIG).context("Invalid embedded pmopandora configuration")
    }

    /// Parse un document YAML ; les clés omises gardent leur valeur par défaut
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut base = serde_yaml::to_value(Self::embedded()?)?;
        let overlay: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        merge_yaml(&mut base, overlay);
        Ok(serde_yaml::from_value(base)?)
    }

    /// Charge la configuration
    ///
    /// Le fichier est cherché dans l'ordre suivant :
    /// 1. Le `path` fourni
    /// 2. La variable d'environnement `PMOPANDORA_CONFIG`
    /// 3. La configuration par défaut intégrée
    ///
    /// Les surcharges d'environnement sont appliquées en dernier.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = env::var(ENV_CONFIG_FILE).ok();
        let path = path.map(Path::to_path_buf).or_else(|| from_env.map(Into::into));

        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "Loading pmopandora configuration");
                let yaml = fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read {}", path.display()))?;
                Self::from_yaml_str(&yaml)?
            }
            None => Self::embedded()?,
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(username) = env::var(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Ok(password) = env::var(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Ok(proxy) = env::var(ENV_PROXY) {
            self.proxy = Some(proxy).filter(|p| !p.is_empty());
        }
    }

    /// Identifiants de l'auditeur (username, password)
    pub fn credentials(&self) -> Result<(String, String)> {
        let username = self
            .username
            .clone()
            .ok_or_else(|| anyhow!("Pandora username not configured"))?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| anyhow!("Pandora password not configured"))?;
        Ok((username, password))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn song_url_ttl(&self) -> Duration {
        Duration::from_secs(self.song_url_ttl_secs)
    }

    pub fn ad_interval(&self) -> Duration {
        Duration::from_secs(self.ad_interval_secs)
    }
}

/// Fusionne récursivement `overlay` dans `base`
fn merge_yaml(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
