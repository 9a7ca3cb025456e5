use crate::core::{MediaError, Result, StreamInfo, StreamSlot};
use crate::player::backend::{Container, MediaBackend};
use crate::player::Media;
use ffmpeg_next::{media, Rational, Rescale};
use log::{debug, error, info, warn};
use std::path::Path;

/// 容器级时长的时间基（AV_TIME_BASE，微秒）
const CONTAINER_TIME_BASE: Rational = Rational(1, 1_000_000);

/// 流分类结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub video: Option<StreamInfo>,
    pub audio: Option<StreamInfo>,
    pub subtitle: Option<usize>,
}

impl Selection {
    /// 决定时间基与时长的主流：有视频取视频，否则取音频
    pub fn primary(&self) -> Option<&StreamInfo> {
        self.video.as_ref().or(self.audio.as_ref())
    }
}

/// 按媒体类型分类流
///
/// 每种类型只取第一个流，后续同类流忽略；缺少编解码参数的流跳过
pub fn classify_streams(streams: &[StreamInfo]) -> Selection {
    let mut selection = Selection::default();

    for stream in streams {
        let Some(params) = stream.params else {
            warn!("⚠️  流 {} 缺少编解码参数，已跳过", stream.index);
            continue;
        };

        match params.medium {
            media::Type::Video if selection.video.is_none() => {
                debug!("流 {}: 视频, codec = {}", stream.index, params.id.name());
                selection.video = Some(stream.clone());
            }
            media::Type::Audio if selection.audio.is_none() => {
                debug!("流 {}: 音频, codec = {}", stream.index, params.id.name());
                selection.audio = Some(stream.clone());
            }
            media::Type::Subtitle if selection.subtitle.is_none() => {
                debug!("流 {}: 字幕（只记录，不解码）", stream.index);
                selection.subtitle = Some(stream.index);
            }
            medium => debug!("流 {} ({:?}) 已忽略", stream.index, medium),
        }
    }

    selection
}

/// 整数帧率：num / den 整除，29.97 会被截断成 29
pub fn truncated_fps(rate: Rational) -> i64 {
    if rate.denominator() == 0 {
        return 0;
    }
    i64::from(rate.numerator()) / i64::from(rate.denominator())
}

/// 流时长（流时间基）；流本身没有记录时回退到容器时长
pub fn stream_duration(stream: &StreamInfo, container_duration: Option<i64>) -> i64 {
    if let Some(duration) = stream.duration {
        return duration;
    }

    let time_base = stream.time_base;
    match container_duration {
        Some(duration) if time_base.numerator() > 0 && time_base.denominator() > 0 => {
            debug!("流 {} 未记录时长，使用容器时长", stream.index);
            duration.rescale(CONTAINER_TIME_BASE, time_base)
        }
        _ => 0,
    }
}

/// 打开容器、探测流信息，并把选中的流写入句柄
///
/// 容器一旦打开就交给句柄持有，后续任何失败都由生命周期管理统一释放
pub(crate) fn probe<B: MediaBackend>(media: &mut Media<B>, path: &Path) -> Result<Selection> {
    let container = media.backend().open_container(path).map_err(|e| {
        error!("❌ 打开容器失败: {}", e);
        e
    })?;

    let streams = container.streams();
    let container_duration = container.duration();
    media.install_container(container);

    let selection = classify_streams(&streams);
    match (&selection.video, &selection.audio) {
        (None, None) => {
            error!("❌ 文件中找不到可用的音视频流: {}", path.display());
            return Err(MediaError::NoStream);
        }
        (None, Some(_)) => info!("🔊 仅包含音频流，按纯音频资源处理"),
        (Some(_), None) => warn!("⚠️  文件中没有音频流"),
        (Some(_), Some(_)) => {}
    }

    apply_selection(media, &selection, container_duration);
    Ok(selection)
}

fn apply_selection<B: MediaBackend>(media: &mut Media<B>, selection: &Selection, container_duration: Option<i64>) {
    if let Some(stream) = &selection.video {
        media.slots_mut().set(StreamSlot::Video, stream.index);
        if let Some(params) = stream.params {
            let video = media.video_mut();
            video.codec = Some(params.id);
            video.width = params.width;
            video.height = params.height;
        }
    }

    if let Some(stream) = &selection.audio {
        media.slots_mut().set(StreamSlot::Audio, stream.index);
        if let Some(params) = stream.params {
            let audio = media.audio_mut();
            audio.codec = Some(params.id);
            audio.channels = params.channels;
            audio.sample_rate = params.sample_rate;
        }
    }

    if let Some(index) = selection.subtitle {
        media.slots_mut().set(StreamSlot::Subtitle, index);
    }

    let Some(primary) = selection.primary() else {
        return;
    };

    let timing = media.timing_mut();
    timing.time_base = primary.time_base;
    timing.frames_expected = primary.frames;
    timing.duration = stream_duration(primary, container_duration);

    if selection.video.is_some() {
        timing.frame_rate = primary.guessed_frame_rate;
        timing.average_fps = truncated_fps(primary.guessed_frame_rate);
    }

    debug!(
        "时间基 {}/{}, 时长 {} 单位, 预计 {} 帧, 帧率 {}",
        timing.time_base.numerator(),
        timing.time_base.denominator(),
        timing.duration,
        timing.frames_expected,
        timing.average_fps
    );
}
