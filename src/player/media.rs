use crate::core::{
    LifecycleFlags, LoopMode, MediaConfig, MediaError, MediaInfo, MediaKind, PlaybackState, Result,
    StreamSlot, StreamSlots, Timing,
};
use crate::player::backend::{MediaBackend, Reusable};
use crate::player::ffmpeg_backend::FfmpegBackend;
use crate::player::{lifecycle, loader, seek};
use ffmpeg_next::{codec, Rational};
use log::{debug, warn};
use std::path::Path;

/// 视频解码状态
pub struct VideoState<B: MediaBackend> {
    pub(crate) codec: Option<codec::Id>,
    pub(crate) decoder: Option<B::VideoDecoder>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) plane_count: usize,
    pub(crate) frame: Option<B::VideoFrame>,
    pub(crate) converter: Option<B::Converter>,
    /// RGBA 输出缓冲（width * height * 4）
    pub(crate) pixels: Option<Vec<u8>>,
}

impl<B: MediaBackend> Default for VideoState<B> {
    fn default() -> Self {
        Self {
            codec: None,
            decoder: None,
            width: 0,
            height: 0,
            plane_count: 0,
            frame: None,
            converter: None,
            pixels: None,
        }
    }
}

/// 音频解码状态
pub struct AudioState<B: MediaBackend> {
    pub(crate) codec: Option<codec::Id>,
    pub(crate) decoder: Option<B::AudioDecoder>,
    pub(crate) channels: u16,
    pub(crate) sample_rate: u32,
    pub(crate) frame: Option<B::AudioFrame>,
}

impl<B: MediaBackend> Default for AudioState<B> {
    fn default() -> Self {
        Self {
            codec: None,
            decoder: None,
            channels: 0,
            sample_rate: 0,
            frame: None,
        }
    }
}

/// 解码循环一次性借出的视频资源
pub struct VideoParts<'a, B: MediaBackend> {
    pub decoder: &'a mut B::VideoDecoder,
    pub frame: &'a mut B::VideoFrame,
    pub converter: &'a mut B::Converter,
    pub pixels: &'a mut [u8],
}

/// 解码循环一次性借出的音频资源
pub struct AudioParts<'a, B: MediaBackend> {
    pub decoder: &'a mut B::AudioDecoder,
    pub frame: &'a mut B::AudioFrame,
}

/// 媒体句柄 - 单个资源的全部状态
///
/// 加载、Seek 与释放分别由 `loader`、`seek`、`lifecycle` 完成，它们只通过
/// 下面 `pub(crate)` 的修改接口访问句柄内部。
///
/// 注意：字段按释放顺序声明，解码上下文先于容器被 drop。
pub struct Media<B: MediaBackend = FfmpegBackend> {
    video: VideoState<B>,
    audio: AudioState<B>,
    container: Option<B::Container>,
    packet: Option<B::Packet>,
    backend: B,
    kind: MediaKind,
    flags: LifecycleFlags,
    slots: StreamSlots,
    timing: Timing,
    loop_mode: LoopMode,
    volume: f32,
}

impl Media<FfmpegBackend> {
    /// 创建使用 FFmpeg 后端的空句柄
    ///
    /// 调用前需先执行一次 `ffmpeg_next::init()`
    pub fn new(kind: MediaKind) -> Self {
        Self::with_backend(kind, FfmpegBackend)
    }
}

impl<B: MediaBackend> Media<B> {
    pub fn with_backend(kind: MediaKind, backend: B) -> Self {
        Self {
            video: VideoState::default(),
            audio: AudioState::default(),
            container: None,
            packet: None,
            backend,
            kind,
            flags: LifecycleFlags::default(),
            slots: StreamSlots::default(),
            timing: Timing::default(),
            loop_mode: LoopMode::Default,
            volume: 1.0,
        }
    }

    // ============= 加载 / 关闭 =============

    /// 加载媒体文件
    ///
    /// 失败时已获取的资源全部释放，`is_loaded()` 为 false
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        loader::load(self, path.as_ref())
    }

    /// 从视频资源目录加载
    pub fn load_video(&mut self, config: &MediaConfig, name: &str) -> Result<()> {
        self.load(config.resolve_video(name))
    }

    /// 从音效资源目录加载
    pub fn load_sound(&mut self, config: &MediaConfig, name: &str) -> Result<()> {
        self.load(config.resolve_sound(name))
    }

    /// 释放全部资源，可重复调用
    pub fn close(&mut self) {
        lifecycle::release(self);
        self.flags.closed = true;
    }

    // ============= 状态查询 =============

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state(&self) -> PlaybackState {
        self.flags.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.flags.loaded
    }

    pub fn is_ready(&self) -> bool {
        self.flags.ready
    }

    pub fn is_playing(&self) -> bool {
        self.flags.playing
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused
    }

    pub fn is_finished(&self) -> bool {
        self.flags.finished
    }

    /// 只切换暂停标志，不会停止底层音频流
    pub fn set_paused(&mut self, paused: bool) {
        self.flags.paused = paused;
    }

    pub fn slots(&self) -> StreamSlots {
        self.slots
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// 总时长（秒）
    pub fn duration(&self) -> f64 {
        self.timing.duration_seconds()
    }

    /// 当前位置（秒）
    pub fn position(&self) -> f64 {
        self.timing.position_seconds()
    }

    /// 跳转到指定位置（秒），详见 [`seek::seek`]
    pub fn set_position(&mut self, seconds: f64) -> Result<()> {
        seek::seek(self, seconds)
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, loop_mode: LoopMode) {
        self.loop_mode = loop_mode;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// 设置音量 (0.0 - 1.0)，仅在存在音频流时生效
    pub fn set_volume(&mut self, volume: f32) {
        if self.slots.get(StreamSlot::Audio).is_none() {
            warn!("⚠️  没有音频流，忽略音量设置: {}", volume);
            return;
        }
        self.volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
    }

    /// 截断后的整数帧率
    pub fn average_fps(&self) -> i64 {
        self.timing.average_fps
    }

    /// 未截断的帧率
    pub fn frame_rate(&self) -> Rational {
        self.timing.frame_rate
    }

    pub fn width(&self) -> u32 {
        self.video.width
    }

    pub fn height(&self) -> u32 {
        self.video.height
    }

    pub fn plane_count(&self) -> usize {
        self.video.plane_count
    }

    pub fn channels(&self) -> u16 {
        self.audio.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    /// 获取媒体信息快照
    pub fn media_info(&self) -> MediaInfo {
        let codec_name = |id: Option<codec::Id>| {
            id.map(|id| id.name().to_string())
                .unwrap_or_else(|| "none".to_string())
        };
        let rate = self.timing.frame_rate;

        MediaInfo {
            kind: self.kind,
            duration: self.duration(),
            width: self.video.width,
            height: self.video.height,
            average_fps: self.timing.average_fps,
            frame_rate: if rate.denominator() != 0 { f64::from(rate) } else { 0.0 },
            video_codec: codec_name(self.video.codec),
            audio_codec: codec_name(self.audio.codec),
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            video_stream: self.slots.get(StreamSlot::Video),
            audio_stream: self.slots.get(StreamSlot::Audio),
            subtitle_stream: self.slots.get(StreamSlot::Subtitle),
        }
    }

    // ============= 播放控制 =============

    /// 进入播放状态，需要先 `mark_ready`
    pub fn play(&mut self) -> Result<()> {
        if !self.flags.loaded {
            return Err(MediaError::NotLoaded);
        }
        if !self.flags.ready {
            return Err(MediaError::NotReady);
        }
        self.flags.playing = true;
        self.flags.paused = false;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.flags.playing = false;
        self.flags.paused = false;
    }

    // ============= 解码循环接口 =============

    /// 读取下一个数据包到复用的包缓冲中
    ///
    /// 返回数据包所属的流索引，到达文件末尾时返回 None
    pub fn read_packet(&mut self) -> Result<Option<usize>> {
        let (Some(container), Some(packet)) = (self.container.as_mut(), self.packet.as_mut()) else {
            return Err(MediaError::NotLoaded);
        };
        packet.clear_refs();
        self.backend.read_packet(container, packet)
    }

    pub fn packet(&self) -> Option<&B::Packet> {
        self.packet.as_ref()
    }

    pub fn packet_mut(&mut self) -> Option<&mut B::Packet> {
        self.packet.as_mut()
    }

    pub fn video_parts(&mut self) -> Option<VideoParts<'_, B>> {
        let video = &mut self.video;
        Some(VideoParts {
            decoder: video.decoder.as_mut()?,
            frame: video.frame.as_mut()?,
            converter: video.converter.as_mut()?,
            pixels: video.pixels.as_deref_mut()?,
        })
    }

    pub fn audio_parts(&mut self) -> Option<AudioParts<'_, B>> {
        let audio = &mut self.audio;
        Some(AudioParts {
            decoder: audio.decoder.as_mut()?,
            frame: audio.frame.as_mut()?,
        })
    }

    /// 解码循环每输出一帧调用一次，position 为该帧的时间戳（流时间基）
    pub fn advance(&mut self, position: i64) {
        self.timing.frames_decoded += 1;
        self.timing.position = position;
    }

    /// 预解码完成，可以开始播放
    pub fn mark_ready(&mut self) -> Result<()> {
        if !self.flags.loaded {
            return Err(MediaError::NotLoaded);
        }
        self.flags.ready = true;
        Ok(())
    }

    /// 解码循环读到文件末尾
    pub fn mark_finished(&mut self) {
        if self.flags.loaded {
            debug!("播放结束，循环模式: {:?}", self.loop_mode);
            self.flags.finished = true;
            self.flags.playing = false;
        }
    }

    // ============= crate 内部修改接口 =============

    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn begin_loading(&mut self) {
        self.flags = LifecycleFlags { loading: true, ..Default::default() };
    }

    pub(crate) fn finish_loading(&mut self, loaded: bool) {
        self.flags.loading = false;
        self.flags.loaded = loaded;
    }

    /// 是否还持有任何资源
    pub(crate) fn holds_resources(&self) -> bool {
        self.container.is_some()
            || self.packet.is_some()
            || self.video.decoder.is_some()
            || self.video.frame.is_some()
            || self.video.converter.is_some()
            || self.video.pixels.is_some()
            || self.audio.decoder.is_some()
            || self.audio.frame.is_some()
    }

    pub(crate) fn install_container(&mut self, container: B::Container) {
        self.container = Some(container);
    }

    pub(crate) fn install_packet(&mut self, packet: B::Packet) {
        self.packet = Some(packet);
    }

    pub(crate) fn container(&self) -> Option<&B::Container> {
        self.container.as_ref()
    }

    pub(crate) fn container_mut(&mut self) -> Option<&mut B::Container> {
        self.container.as_mut()
    }

    pub(crate) fn container_slot(&mut self) -> &mut Option<B::Container> {
        &mut self.container
    }

    pub(crate) fn packet_slot(&mut self) -> &mut Option<B::Packet> {
        &mut self.packet
    }

    pub(crate) fn slots_mut(&mut self) -> &mut StreamSlots {
        &mut self.slots
    }

    pub(crate) fn timing_mut(&mut self) -> &mut Timing {
        &mut self.timing
    }

    pub(crate) fn video_mut(&mut self) -> &mut VideoState<B> {
        &mut self.video
    }

    pub(crate) fn audio_mut(&mut self) -> &mut AudioState<B> {
        &mut self.audio
    }

    /// Seek 完成后的统一复位：需要重新预解码，之后再次 `play`
    pub(crate) fn reset_after_seek(&mut self) {
        self.timing.frames_decoded = 0;
        self.timing.position = 0;
        self.flags.ready = false;
        self.flags.finished = false;
        self.flags.playing = false;
        self.flags.paused = false;
    }

    /// 资源释放后清空所有元数据（closed 标志由调用方决定）
    pub(crate) fn reset_metadata(&mut self) {
        self.video = VideoState::default();
        self.audio = AudioState::default();
        self.slots.clear();
        self.timing = Timing::default();
        self.flags = LifecycleFlags { closed: self.flags.closed, ..Default::default() };
    }
}

impl<B: MediaBackend> Drop for Media<B> {
    fn drop(&mut self) {
        lifecycle::release(self);
    }
}
