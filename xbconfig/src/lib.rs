//! # Configuration XBVR
//!
//! Chargement de la configuration YAML du serveur :
//! - fichier `config.yaml` fusionné avec la configuration embarquée
//! - surcharges par variables d'environnement `XBVR_CONFIG__SECTION__CLE`
//! - getters/setters typés pour l'hôte HTTP, la base et le serveur DLNA
//!
//! ```no_run
//! use xbconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let allowed = config.get_dlna_allowed_ips()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    net::UdpSocket,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::info;
use uuid::Uuid;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("xbvr.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load XBVR configuration"));
}

const ENV_CONFIG_DIR: &str = "XBVR_CONFIG";
const ENV_PREFIX: &str = "XBVR_CONFIG__";
const CONFIG_DIR_NAME: &str = ".xbvr";

const DEFAULT_HTTP_PORT: u16 = 9999;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_DATABASE_PATH: &str = "main.db";
const DEFAULT_SERVICE_NAME: &str = "XBVR";
const DEFAULT_NOTIFY_INTERVAL: usize = 30;

macro_rules! impl_usize_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<usize> {
            match self.get_value($path)? {
                Value::Number(n) => Ok(n.as_u64().map(|v| v as usize).unwrap_or($default)),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, size: usize) -> Result<()> {
            let n = Number::from(size);
            self.set_value($path, Value::Number(n))
        }
    };
}

macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path)? {
                Value::Bool(b) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Listes de chaînes (un scalaire isolé est accepté comme liste à un élément)
macro_rules! impl_string_list_config {
    ($getter:ident, $setter:ident, $path:expr) => {
        pub fn $getter(&self) -> Result<Vec<String>> {
            match self.get_value($path)? {
                Value::Sequence(seq) => Ok(seq
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()),
                Value::String(s) if !s.is_empty() => Ok(vec![s]),
                _ => Ok(Vec::new()),
            }
        }

        pub fn $setter(&self, values: Vec<String>) -> Result<()> {
            let seq = values.into_iter().map(Value::String).collect();
            self.set_value($path, Value::Sequence(seq))
        }
    };
}

/// Gestionnaire de configuration de XBVR
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        fs::read_dir(path)?;

        Ok(())
    }

    /// Détermine et valide le répertoire de configuration.
    ///
    /// Ordre de recherche :
    /// 1. `directory` s'il n'est pas vide
    /// 2. la variable `XBVR_CONFIG`
    /// 3. `.xbvr` dans le répertoire courant
    /// 4. `.xbvr` dans le répertoire de l'utilisateur
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Charge la configuration : défauts embarqués, fusion de `config.yaml`,
    /// surcharges d'environnement, puis réécriture du fichier fusionné.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut default_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file=%path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut default_value, &external_value);
            }
            Err(_) => {
                info!(config_file=%path, "Config file not found, using default embedded config");
            }
        }

        let mut config_value = lower_keys_value(default_value);
        apply_env_overrides(&mut config_value);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Répertoire de configuration effectivement utilisé
    pub fn dir(&self) -> &str {
        &self.config_dir
    }

    /// Modifie une valeur (ex: `&["dlna", "paginate"]`) et sauvegarde
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()
    }

    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock().unwrap();
        get_value_internal(&data, path)
    }

    /// Résout un chemin relatif au répertoire de configuration
    fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.config_dir).join(path)
        }
    }

    /// URL de base annoncée ; à défaut l'IP locale devinée
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            Ok(_) => guess_local_ip(),
            Err(err) => {
                tracing::warn!("Failed to get base URL: {}, guessing local IP", err);
                guess_local_ip()
            }
        }
    }

    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => n
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(DEFAULT_HTTP_PORT),
            Ok(Value::String(s)) => s.parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid HTTP port '{}', using default {}",
                    s,
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }),
            _ => DEFAULT_HTTP_PORT,
        }
    }

    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set_value(&["host", "http_port"], Value::Number(Number::from(port)))
    }

    /// UDN d'un device, généré et persisté au premier appel
    pub fn get_device_udn(&self, devtype: &str, name: &str) -> Result<String> {
        let path = &["devices", devtype, name, "udn"];
        match self.get_value(path) {
            Ok(Value::String(udn)) if !udn.trim().is_empty() => {
                let udn_str = udn.trim();
                Ok(udn_str.strip_prefix("uuid:").unwrap_or(udn_str).to_string())
            }
            _ => {
                let new_udn = Uuid::new_v4().to_string();
                self.set_value(path, Value::String(new_udn.clone()))?;
                Ok(new_udn)
            }
        }
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"])? {
            Value::String(s) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }

    /// Fichier SQLite de la bibliothèque, relatif au répertoire de configuration
    pub fn get_database_path(&self) -> Result<PathBuf> {
        let raw = match self.get_value(&["database", "path"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_DATABASE_PATH.to_string(),
        };
        let path = self.resolve_path(&raw);
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(path)
    }

    impl_bool_config!(
        get_dlna_enabled,
        set_dlna_enabled,
        &["dlna", "enabled"],
        true
    );

    pub fn get_dlna_service_name(&self) -> Result<String> {
        match self.get_value(&["dlna", "service_name"])? {
            Value::String(s) if !s.is_empty() => Ok(s),
            _ => Ok(DEFAULT_SERVICE_NAME.to_string()),
        }
    }

    pub fn set_dlna_service_name(&self, name: String) -> Result<()> {
        self.set_value(&["dlna", "service_name"], Value::String(name))
    }

    impl_string_list_config!(
        get_dlna_allowed_ips,
        set_dlna_allowed_ips,
        &["dlna", "allowed_ip"]
    );

    impl_bool_config!(
        get_dlna_paginate,
        set_dlna_paginate,
        &["dlna", "paginate"],
        true
    );

    impl_bool_config!(
        get_dlna_no_transcode,
        set_dlna_no_transcode,
        &["dlna", "no_transcode"],
        true
    );

    impl_string_list_config!(
        get_dlna_transcode_profiles,
        set_dlna_transcode_profiles,
        &["dlna", "transcode_profiles"]
    );

    impl_bool_config!(
        get_dlna_show_images,
        set_dlna_show_images,
        &["dlna", "show_images"],
        false
    );

    impl_bool_config!(
        get_dlna_ignore_hidden,
        set_dlna_ignore_hidden,
        &["dlna", "ignore_hidden"],
        true
    );

    impl_bool_config!(
        get_dlna_ignore_unreadable,
        set_dlna_ignore_unreadable,
        &["dlna", "ignore_unreadable"],
        false
    );

    /// Racine des dossiers locaux exposés, `None` si non configurée
    pub fn get_dlna_folders_root(&self) -> Result<Option<PathBuf>> {
        match self.get_value(&["dlna", "folders_root"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(Some(self.resolve_path(s.trim()))),
            _ => Ok(None),
        }
    }

    impl_string_list_config!(
        get_dlna_folders_last_user_agents,
        set_dlna_folders_last_user_agents,
        &["dlna", "folders_last_user_agents"]
    );

    impl_usize_config!(
        get_dlna_notify_interval,
        set_dlna_notify_interval,
        &["dlna", "notify_interval"],
        DEFAULT_NOTIFY_INTERVAL
    );
}

/// Instance globale, chargée au premier accès
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Devine l'adresse IP locale en ouvrant une socket UDP vers une adresse publique.
/// Aucun paquet n'est émis ; `127.0.0.1` en cas d'échec.
pub fn guess_local_ip() -> String {
    match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => {
            if socket.connect("8.8.8.8:80").is_ok() {
                if let Ok(local_addr) = socket.local_addr() {
                    return local_addr.ip().to_string();
                }
            }
            "127.0.0.1".to_string()
        }
        Err(_) => "127.0.0.1".to_string(),
    }
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            // un scalaire sur le chemin est remplacé par une table
            if !entry.is_mapping() {
                *entry = Value::Mapping(Mapping::new());
            }
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            match map.get(&Value::String(key.to_lowercase())) {
                Some(next) => current = next,
                None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
            }
        } else {
            return Err(anyhow!("Path {} is not a map", path[..i].join(".")));
        }
    }
    Ok(current.clone())
}

fn apply_env_overrides(config: &mut Value) {
    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let key_path = stripped.split("__").collect::<Vec<_>>();
            let _ = set_value_internal(config, &key_path, convert_env_value(&value));
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Fusion récursive : les tables sont fusionnées clé à clé,
/// scalaires et séquences externes remplacent les défauts
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
