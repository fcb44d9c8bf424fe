use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Parser)]
#[command(name = "backend")]
#[command(about = "Generates member cards as PNG images")]
pub struct ServerArgs {
    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long, help = "Directory holding the ai/, others/ and bg/ assets")]
    pub asset_root: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub assets: AssetConfig,
    pub layout: LayoutConfig,
    pub text: TextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub member_dir: String,
    pub other_dir: String,
    /// Relatif terhadap `root`.
    pub logo: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub font_size: u32,
    pub text_top_percent: u32,
    pub logo_width: u32,
    pub logo_top: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub font_family: String,
    pub font_file: Option<PathBuf>,
    pub system_fonts: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            body_limit: 64 * 1024,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            member_dir: "ai".to_string(),
            other_dir: "others".to_string(),
            logo: PathBuf::from("bg").join("logo.png"),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 60,
            text_top_percent: 15,
            logo_width: 100,
            logo_top: 20,
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_file: None,
            system_fonts: true,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("invalid TOML: {e}")))
    }

    /// Muat file config (jika ada), lalu timpa dengan flag CLI.
    pub fn from_args(args: &ServerArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(host) = &args.host {
            config.server.host = host.clone();
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        if let Some(root) = &args.asset_root {
            config.assets.root = root.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.assets.member_dir.trim().is_empty() || self.assets.other_dir.trim().is_empty() {
            return Err(AppError::Config("asset directory names must not be empty".into()));
        }
        if self.layout.font_size == 0 {
            return Err(AppError::Config("layout.font_size must be greater than 0".into()));
        }
        if self.layout.logo_width == 0 {
            return Err(AppError::Config("layout.logo_width must be greater than 0".into()));
        }
        if self.layout.text_top_percent > 100 {
            return Err(AppError::Config("layout.text_top_percent must be within 0..=100".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
