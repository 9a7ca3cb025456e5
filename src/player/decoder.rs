use crate::core::{MediaError, Result, StreamSlot};
use crate::player::backend::MediaBackend;
use crate::player::Media;
use ffmpeg_next::codec;
use log::{error, info, warn};

/// 打开解码器前的公共步骤：查找解码器 → 分配上下文 → 写入流参数
///
/// 上下文在这里只是局部值，任何一步失败时随作用域一起释放
fn prepare<B: MediaBackend>(
    media: &Media<B>,
    id: codec::Id,
    stream_index: usize,
) -> Result<(B::CodecContext, B::Codec)> {
    let backend = media.backend();

    let codec = backend.find_decoder(id).ok_or_else(|| {
        error!("❌ 找不到解码器: {}", id.name());
        MediaError::DecoderNotFound(id.name().to_string())
    })?;

    let mut context = backend.alloc_context(codec).map_err(|e| {
        error!("❌ 分配解码上下文失败: {}", e);
        e
    })?;

    let container = media.container().ok_or(MediaError::NotLoaded)?;
    backend
        .apply_parameters(&mut context, container, stream_index)
        .map_err(|e| {
            error!("❌ 写入流 {} 的编解码参数失败: {}", stream_index, e);
            e
        })?;

    Ok((context, codec))
}

/// 打开视频解码器并分配复用的视频帧
pub(crate) fn open_video<B: MediaBackend>(media: &mut Media<B>) -> Result<()> {
    let index = media.slots().get(StreamSlot::Video).ok_or(MediaError::NoStream)?;
    let id = media.video_mut().codec.ok_or(MediaError::NoStream)?;

    let (context, codec) = prepare(media, id, index)?;
    let decoder = media.backend().open_video(context, codec).map_err(|e| {
        error!("❌ 打开视频解码器失败: {}", e);
        e
    })?;
    media.video_mut().decoder = Some(decoder);

    let frame = media.backend().alloc_video_frame()?;
    media.video_mut().frame = Some(frame);

    let video = media.video_mut();
    info!("✓ 视频解码器已打开: {} ({}x{})", id.name(), video.width, video.height);
    Ok(())
}

/// 打开音频解码器并分配复用的音频帧
pub(crate) fn open_audio<B: MediaBackend>(media: &mut Media<B>) -> Result<()> {
    let index = media.slots().get(StreamSlot::Audio).ok_or(MediaError::NoStream)?;
    let id = media.audio_mut().codec.ok_or(MediaError::NoStream)?;

    let (channels, sample_rate) = {
        let audio = media.audio_mut();
        (audio.channels, audio.sample_rate)
    };
    if channels != 2 {
        // 只是提示，输出端固定为立体声
        warn!("⚠️  音频流为 {} 声道（非立体声）", channels);
    }

    let (context, codec) = prepare(media, id, index)?;
    let decoder = media.backend().open_audio(context, codec).map_err(|e| {
        error!("❌ 打开音频解码器失败: {}", e);
        e
    })?;
    media.audio_mut().decoder = Some(decoder);

    let frame = media.backend().alloc_audio_frame()?;
    media.audio_mut().frame = Some(frame);

    info!("✓ 音频解码器已打开: {} ({} Hz, {} 声道)", id.name(), sample_rate, channels);
    Ok(())
}
