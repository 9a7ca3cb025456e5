use crate::core::{MediaError, Result, StreamSlot};
use crate::player::backend::{Container, DecodeContext, MediaBackend, Reusable};
use crate::player::Media;
use ffmpeg_next::{Rational, Rescale};
use log::{debug, error, info, warn};

/// 目标时间先量化到 1/100 秒
const SEEK_QUANTUM: Rational = Rational(1, 100);

/// 把请求的位置限制在 [0, duration] 内；duration 未知（<= 0）时只限制下界
pub fn clamp_target(seconds: f64, duration: f64) -> f64 {
    let requested = if seconds.is_finite() { seconds } else { 0.0 };
    let mut target = requested.max(0.0);
    if duration > 0.0 {
        target = target.min(duration);
    }
    if target != seconds {
        warn!("⚠️  Seek 位置 {:.3}s 超出范围，已调整为 {:.3}s", seconds, target);
    }
    target
}

/// 秒 → 流时间基下的目标时间戳
///
/// 先截断到百分之一秒，再换算到流时间基。时间基无效时返回 0。
pub fn seek_target(seconds: f64, time_base: Rational) -> i64 {
    if time_base.numerator() == 0 || time_base.denominator() == 0 {
        return 0;
    }
    let hundredths = (seconds * 100.0) as i64;
    hundredths.rescale(SEEK_QUANTUM, time_base)
}

/// 跳转到指定位置（秒）
///
/// 有视频流时在视频流上定位，否则在音频流上定位。无论定位本身是否成功，
/// 两个解码器都会被刷新、帧与包缓冲都会被清空、解码计数与 ready 标志复位，
/// 播放状态也会退出，之后需要重新预解码并再次 `play`。返回值反映容器定位是否成功。
pub(crate) fn seek<B: MediaBackend>(media: &mut Media<B>, seconds: f64) -> Result<()> {
    if !media.is_loaded() {
        warn!("⚠️  媒体未加载，无法 Seek");
        return Err(MediaError::NotLoaded);
    }

    let slots = media.slots();
    let index = slots
        .get(StreamSlot::Video)
        .or_else(|| slots.get(StreamSlot::Audio))
        .ok_or(MediaError::NoStream)?;

    let seconds = clamp_target(seconds, media.duration());
    let target = seek_target(seconds, media.timing().time_base);
    info!("⏩ Seek 到 {:.2}s (流 {}, 时间戳 {})", seconds, index, target);

    let outcome = match media.container_mut() {
        Some(container) => container.seek_backward(index, target),
        None => Err(MediaError::NotLoaded),
    };
    if let Err(e) = &outcome {
        error!("❌ Seek 失败: {}", e);
    }

    flush_and_reset(media);
    outcome
}

/// 刷新解码器、清空复用缓冲，并复位解码进度
fn flush_and_reset<B: MediaBackend>(media: &mut Media<B>) {
    let video = media.video_mut();
    if let Some(decoder) = video.decoder.as_mut() {
        if let Err(e) = decoder.flush_buffers() {
            error!("❌ 刷新视频解码器失败: {}", e);
        }
    }
    if let Some(frame) = video.frame.as_mut() {
        frame.clear_refs();
    }

    let audio = media.audio_mut();
    if let Some(decoder) = audio.decoder.as_mut() {
        if let Err(e) = decoder.flush_buffers() {
            error!("❌ 刷新音频解码器失败: {}", e);
        }
    }
    if let Some(frame) = audio.frame.as_mut() {
        frame.clear_refs();
    }

    if let Some(packet) = media.packet_mut() {
        packet.clear_refs();
    }

    media.reset_after_seek();
    debug!("解码状态已复位，等待重新预解码");
}
