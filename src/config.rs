use anyhow::Context;
use glam::UVec2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{CropBackend, MagickBackend, NativeBackend};
use crate::{CardLayout, OutputNaming};

/// Run parameters. Every field defaults to the special-card sheet, so an empty
/// file (or no file at all) crops `0008.jpg` into `cards/special_{0,1,2}.jpg`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub extension: String,
    pub count: u32,
    pub side: u32,
    pub start_x: u32,
    pub start_y: u32,
    pub step: u32,
    pub jobs: usize,
    pub create_output_dir: bool,
    pub tool: ToolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from("0008.jpg"),
            output_dir: PathBuf::from("cards"),
            prefix: "special_".to_string(),
            extension: "jpg".to_string(),
            count: 3,
            side: 796,
            start_x: 50,
            start_y: 115,
            step: 798,
            jobs: 1,
            create_output_dir: false,
            tool: ToolConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Magick,
    Native,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "magick" => Ok(Self::Magick),
            "native" => Ok(Self::Native),
            other => anyhow::bail!("unknown backend {:?}, expected magick or native", other),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub backend: BackendKind,
    pub program: PathBuf,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let magick = MagickBackend::default();

        Self {
            backend: BackendKind::Magick,
            program: magick.program,
            args: magick.args,
            timeout_secs: None,
        }
    }
}

impl ToolConfig {
    pub fn build(&self) -> Box<dyn CropBackend> {
        match self.backend {
            BackendKind::Magick => Box::new(MagickBackend {
                program: self.program.clone(),
                args: self.args.clone(),
                timeout: self.timeout_secs.map(Duration::from_secs),
            }),
            BackendKind::Native => Box::new(NativeBackend::new()),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        Self::parse(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn layout(&self) -> CardLayout {
        CardLayout {
            side: self.side,
            start: UVec2::new(self.start_x, self.start_y),
            step: self.step,
            count: self.count,
        }
    }

    pub fn naming(&self) -> OutputNaming {
        OutputNaming {
            dir: self.output_dir.clone(),
            prefix: self.prefix.clone(),
            extension: self.extension.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_the_special_card_sheet() {
        let config = Config::parse("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.source, PathBuf::from("0008.jpg"));
        assert_eq!(
            config.layout(),
            CardLayout {
                side: 796,
                start: UVec2::new(50, 115),
                step: 798,
                count: 3,
            }
        );
        assert_eq!(
            config.naming().path_for(2),
            Path::new("cards").join("special_2.jpg")
        );
        assert_eq!(config.tool.program, PathBuf::from("magick"));
        assert_eq!(config.tool.args, ["convert"]);
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let config = Config::parse(
            r#"
            source = "0009.jpg"
            count = 5
            jobs = 4

            [tool]
            backend = "native"
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.source, PathBuf::from("0009.jpg"));
        assert_eq!(config.count, 5);
        assert_eq!(config.jobs, 4);
        assert_eq!(config.side, 796);
        assert_eq!(config.tool.backend, BackendKind::Native);
        assert_eq!(config.tool.timeout_secs, Some(30));
        assert_eq!(config.tool.build().name(), "native");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("sidee = 10").is_err());
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("magick".parse::<BackendKind>().unwrap(), BackendKind::Magick);
        assert_eq!("native".parse::<BackendKind>().unwrap(), BackendKind::Native);
        assert!("gimp".parse::<BackendKind>().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            count: 7,
            ..Config::default()
        };
        let text = toml::to_string(&config).unwrap();

        assert_eq!(Config::parse(&text).unwrap(), config);
    }
}
