use crate::core::{AudioConfig, MediaConfig, MediaKind, Result};
use crate::player::audio_output::AudioOutput;
use crate::player::backend::MediaBackend;
use crate::player::ffmpeg_backend::FfmpegBackend;
use crate::player::render::RenderShared;
use crate::player::Media;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// 视频与音效共有的播放接口
pub trait Playback {
    fn play(&mut self) -> Result<()>;

    fn stop(&mut self);

    /// 停止并释放全部资源
    fn close(&mut self);
}

/// 视频资源
pub struct Video<B: MediaBackend = FfmpegBackend> {
    media: Media<B>,
}

impl Video<FfmpegBackend> {
    pub fn new() -> Self {
        Self::with_backend(FfmpegBackend)
    }

    /// 从配置的视频目录加载
    pub fn open(config: &MediaConfig, name: &str) -> Result<Self> {
        let mut video = Self::new();
        video.media.set_loop_mode(config.default_loop_mode);
        video.media.load_video(config, name)?;
        Ok(video)
    }
}

impl Default for Video<FfmpegBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: MediaBackend> Video<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            media: Media::with_backend(MediaKind::Video, backend),
        }
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.media.load(path)
    }

    pub fn media(&self) -> &Media<B> {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut Media<B> {
        &mut self.media
    }
}

impl<B: MediaBackend> Playback for Video<B> {
    /// 需要解码循环先完成预解码（`mark_ready`）
    fn play(&mut self) -> Result<()> {
        self.media.play()
    }

    fn stop(&mut self) {
        self.media.stop();
    }

    fn close(&mut self) {
        self.media.close();
    }
}

/// 音效资源
///
/// 真正的解码输出尚未接入，播放时输出锯齿波测试音
pub struct Sound<B: MediaBackend = FfmpegBackend> {
    output: Option<AudioOutput>,
    media: Media<B>,
    shared: Arc<RenderShared>,
    audio: AudioConfig,
}

impl Sound<FfmpegBackend> {
    pub fn new(audio: AudioConfig) -> Self {
        Self::with_backend(audio, FfmpegBackend)
    }

    /// 从配置的音效目录加载
    pub fn open(config: &MediaConfig, name: &str) -> Result<Self> {
        let mut sound = Self::new(config.audio);
        sound.media.set_loop_mode(config.default_loop_mode);
        sound.load(config.resolve_sound(name))?;
        Ok(sound)
    }
}

impl<B: MediaBackend> Sound<B> {
    pub fn with_backend(audio: AudioConfig, backend: B) -> Self {
        let shared = Arc::new(RenderShared::new(audio.volume));
        Self {
            output: None,
            media: Media::with_backend(MediaKind::Sound, backend),
            shared,
            audio,
        }
    }

    /// 加载音效；音效没有预解码阶段，加载成功即就绪
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.media.load(path)?;
        self.media.mark_ready()?;
        self.media.set_volume(self.audio.volume);
        self.shared.set_volume(self.media.volume());
        Ok(())
    }

    pub fn media(&self) -> &Media<B> {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut Media<B> {
        &mut self.media
    }

    /// 暂停时回调输出静音，音频流保持运行
    pub fn set_paused(&mut self, paused: bool) {
        self.media.set_paused(paused);
        self.shared.set_muted(paused);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.media.set_volume(volume);
        self.shared.set_volume(self.media.volume());
    }

    pub fn volume(&self) -> f32 {
        self.shared.volume()
    }

    pub fn is_output_running(&self) -> bool {
        self.output.as_ref().is_some_and(AudioOutput::is_running)
    }

    /// 输出音频回调积累的错误
    pub fn poll_errors(&self) -> usize {
        self.output.as_ref().map_or(0, AudioOutput::drain_errors)
    }

    fn start_output(&mut self) -> Result<()> {
        if self.output.is_none() {
            self.output = Some(AudioOutput::new(&self.audio, self.shared.clone())?);
        }
        if let Some(output) = self.output.as_mut() {
            output.start()?;
        }
        Ok(())
    }
}

impl<B: MediaBackend> Playback for Sound<B> {
    /// 启动音频输出，不会阻塞等待播放结束
    fn play(&mut self) -> Result<()> {
        if self.media.is_loaded() && !self.media.is_ready() {
            // Seek 之后需要重新就绪
            self.media.mark_ready()?;
        }
        self.media.play()?;
        self.shared.set_muted(false);

        if let Err(e) = self.start_output() {
            self.media.stop();
            return Err(e);
        }
        info!("▶️  音效开始播放");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(output) = self.output.as_mut() {
            output.stop();
        }
        self.media.stop();
    }

    /// 先关闭音频流，再释放解码资源
    fn close(&mut self) {
        if self.output.take().is_some() {
            debug!("音频输出已关闭");
        }
        self.media.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MediaError, PlaybackState};
    use crate::player::mock::{audio_stream, MockBackend};

    #[test]
    fn test_video_play_requires_ready() {
        let mut video = Video::with_backend(MockBackend::standard());
        video.load("clip.mp4").unwrap();
        assert!(matches!(video.play(), Err(MediaError::NotReady)));

        video.media_mut().mark_ready().unwrap();
        video.play().unwrap();
        assert_eq!(video.media().state(), PlaybackState::Playing);

        video.close();
        assert_eq!(video.media().state(), PlaybackState::Closed);
    }

    #[test]
    fn test_sound_is_ready_after_load() {
        let audio = AudioConfig { volume: 0.6, ..AudioConfig::default() };
        let mut sound = Sound::with_backend(audio, MockBackend::new(vec![audio_stream(0, 2, 44100)]));
        sound.load("beep.wav").unwrap();

        assert_eq!(sound.media().state(), PlaybackState::Ready);
        assert!((sound.volume() - 0.6).abs() < 1e-6);
        assert!(!sound.is_output_running());
    }

    #[test]
    fn test_sound_pause_mutes_render() {
        let mut sound = Sound::with_backend(AudioConfig::default(), MockBackend::new(vec![audio_stream(0, 2, 44100)]));
        sound.load("beep.wav").unwrap();

        sound.set_paused(true);
        assert!(sound.shared.is_muted());
        assert!(sound.media().is_paused());

        sound.set_paused(false);
        assert!(!sound.shared.is_muted());
    }

    #[test]
    fn test_sound_volume_mirrors_to_render() {
        let mut sound = Sound::with_backend(AudioConfig::default(), MockBackend::new(vec![audio_stream(0, 2, 44100)]));
        sound.load("beep.wav").unwrap();

        sound.set_volume(0.25);
        assert_eq!(sound.media().volume(), 0.25);
        assert_eq!(sound.volume(), 0.25);
    }

    #[test]
    fn test_sound_play_unloaded() {
        let mut sound = Sound::with_backend(AudioConfig::default(), MockBackend::standard());
        assert!(matches!(sound.play(), Err(MediaError::NotLoaded)));
        assert!(!sound.is_output_running());
    }
}
