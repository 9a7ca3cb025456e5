use super::{LoopMode, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 引擎配置（JSON），所有字段均有默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// 资源根目录
    pub asset_root: PathBuf,
    /// 视频子目录（相对 asset_root）
    pub videos_dir: PathBuf,
    /// 音效子目录（相对 asset_root）
    pub sounds_dir: PathBuf,
    pub default_loop_mode: LoopMode,
    pub audio: AudioConfig,
}

/// 音频输出配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// 每次渲染回调请求的帧数
    pub frames_per_buffer: u32,
    /// 音量 0.0 - 1.0
    pub volume: f32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            videos_dir: PathBuf::from("videos"),
            sounds_dir: PathBuf::from("sounds"),
            default_loop_mode: LoopMode::Default,
            audio: AudioConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frames_per_buffer: 256,
            volume: 1.0,
        }
    }
}

impl MediaConfig {
    /// 从 JSON 文件读取配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MediaConfig = serde_json::from_str(&content)?;
        info!("已加载配置: {}", path.display());
        Ok(config)
    }

    /// 指定了路径就读取，否则使用默认配置
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                debug!("未指定配置文件，使用默认配置");
                Ok(Self::default())
            }
        }
    }

    pub fn videos_path(&self) -> PathBuf {
        self.asset_root.join(&self.videos_dir)
    }

    pub fn sounds_path(&self) -> PathBuf {
        self.asset_root.join(&self.sounds_dir)
    }

    /// 视频资源名 -> 完整路径
    pub fn resolve_video(&self, name: &str) -> PathBuf {
        self.videos_path().join(name)
    }

    /// 音效资源名 -> 完整路径
    pub fn resolve_sound(&self, name: &str) -> PathBuf {
        self.sounds_path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = MediaConfig::default();
        assert_eq!(config.resolve_video("intro.mp4"), PathBuf::from("assets/videos/intro.mp4"));
        assert_eq!(config.resolve_sound("click.wav"), PathBuf::from("assets/sounds/click.wav"));
        assert_eq!(config.audio.frames_per_buffer, 256);
    }

    #[test]
    fn test_partial_json() {
        let config: MediaConfig = serde_json::from_str(
            r#"{ "asset_root": "/game/data", "default_loop_mode": "normal", "audio": { "volume": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.sounds_path(), PathBuf::from("/game/data/sounds"));
        assert_eq!(config.default_loop_mode, LoopMode::Normal);
        assert_eq!(config.audio.volume, 0.5);
        assert_eq!(config.audio.sample_rate, 44100);
    }

    #[test]
    fn test_missing_file() {
        let result = MediaConfig::from_file(Path::new("/nonexistent/media_engine.json"));
        assert!(matches!(result, Err(crate::core::MediaError::IoError(_))));
        assert_eq!(MediaConfig::load_or_default(None).unwrap(), MediaConfig::default());
    }
}
