use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::context::WindowRequest;

/// Asset directory relative to the working directory the demos are launched from.
pub const DEFAULT_ASSET_ROOT: &str = "../resources";

/// Static configuration for one demo program.
#[derive(Clone, Debug, PartialEq)]
pub struct DemoConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 4],
    pub depth_test: bool,
    pub flip_textures: bool,
    pub asset_root: PathBuf,
}

impl DemoConfig {
    pub fn multiple_lights() -> Self {
        Self {
            title: "Multiple Lights".to_string(),
            width: 1280,
            height: 720,
            clear_color: [0.15, 0.15, 0.15, 1.0],
            depth_test: true,
            flip_textures: false,
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
        }
    }

    pub fn basic_texture() -> Self {
        Self {
            title: "Basic Texture".to_string(),
            width: 800,
            height: 800,
            clear_color: [0.15, 0.15, 0.15, 1.0],
            depth_test: false,
            flip_textures: true,
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
        }
    }

    pub fn window_request(&self) -> WindowRequest {
        WindowRequest {
            width: self.width,
            height: self.height,
            title: self.title.clone(),
        }
    }

    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.asset_root.join(relative)
    }

    /// Applies command line overrides on top of the built-in defaults.
    pub fn with_options(mut self, options: &CliOptions) -> Self {
        if let Some(root) = &options.asset_root {
            self.asset_root = root.clone();
        }
        self
    }
}

/// Command line switches shared by both demo binaries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CliOptions {
    pub asset_root: Option<PathBuf>,
    pub headless: bool,
    pub frames: u32,
}

impl CliOptions {
    pub const USAGE: &'static str = "Usage: <demo> [--assets <dir>] [--headless] [--frames <n>]";

    pub fn parse() -> Result<Self> {
        Self::from_args(std::env::args().skip(1))
    }

    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self {
            frames: 1,
            ..Self::default()
        };
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => options.headless = true,
                "--assets" => {
                    let dir = args
                        .next()
                        .ok_or_else(|| anyhow!("--assets expects a directory. {}", Self::USAGE))?;
                    options.asset_root = Some(PathBuf::from(dir));
                }
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames expects a number. {}", Self::USAGE))?;
                    options.frames = value
                        .parse()
                        .map_err(|err| anyhow!("invalid frame count {value}: {err}"))?;
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {}", Self::USAGE));
                }
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let options = CliOptions::from_args(Vec::<String>::new()).unwrap();
        assert!(!options.headless);
        assert_eq!(options.frames, 1);
        assert_eq!(options.asset_root, None);
    }

    #[test]
    fn parses_all_switches() {
        let options =
            CliOptions::from_args(["--headless", "--frames", "3", "--assets", "/tmp/res"]).unwrap();
        assert!(options.headless);
        assert_eq!(options.frames, 3);
        assert_eq!(options.asset_root, Some(PathBuf::from("/tmp/res")));

        let config = DemoConfig::multiple_lights().with_options(&options);
        assert_eq!(
            config.asset_path("textures/a.png"),
            PathBuf::from("/tmp/res/textures/a.png")
        );
    }

    #[test]
    fn rejects_unknown_and_incomplete_arguments() {
        assert!(CliOptions::from_args(["--fullscreen"]).is_err());
        assert!(CliOptions::from_args(["--frames"]).is_err());
        assert!(CliOptions::from_args(["--frames", "many"]).is_err());
    }
}
