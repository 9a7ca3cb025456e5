use crate::core::{MediaError, Result};
use crate::player::backend::{MediaBackend, VideoDecodeContext};
use crate::player::Media;
use ffmpeg_next::format::Pixel;
use log::{error, info, warn};

/// 解码输出统一转换成的像素格式
pub const OUTPUT_FORMAT: Pixel = Pixel::RGBA;

/// RGBA 每像素字节数
const BYTES_PER_PIXEL: usize = 4;

/// 把已废弃的 JPEG 全范围格式映射到对应的标准格式
///
/// swscale 对 YUVJ* 会打印 deprecated 警告，色彩范围由转换器自行处理
pub fn normalize_pixel_format(format: Pixel) -> Pixel {
    match format {
        Pixel::YUVJ420P => Pixel::YUV420P,
        Pixel::YUVJ422P => Pixel::YUV422P,
        Pixel::YUVJ444P => Pixel::YUV444P,
        Pixel::YUVJ440P => Pixel::YUV440P,
        other => other,
    }
}

/// 输出缓冲大小（字节），溢出时返回 None
pub fn output_buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(BYTES_PER_PIXEL)
}

/// 为已打开的视频解码器配置像素格式转换
///
/// 记录源格式的平面数，创建 源格式 → RGBA 的转换器，并分配输出缓冲。
/// 转换器创建失败对视频资源是致命的。
pub(crate) fn configure_converter<B: MediaBackend>(media: &mut Media<B>) -> Result<()> {
    let source = {
        let decoder = media.video_mut().decoder.as_ref().ok_or(MediaError::NotLoaded)?;
        decoder.pixel_format()
    };
    let format = normalize_pixel_format(source);
    if format != source {
        warn!("⚠️  像素格式 {:?} 已废弃，按 {:?} 处理", source, format);
    }

    let (width, height) = {
        let video = media.video_mut();
        (video.width, video.height)
    };

    let planes = media.backend().plane_count(format);
    let converter = media
        .backend()
        .build_converter(format, width, height, OUTPUT_FORMAT)
        .map_err(|e| {
            error!("❌ 创建像素格式转换器失败: {}", e);
            e
        })?;

    let len = output_buffer_len(width, height).ok_or(MediaError::AllocError("RGBA 缓冲"))?;

    let video = media.video_mut();
    video.plane_count = planes;
    video.converter = Some(converter);
    video.pixels = Some(vec![0u8; len]);

    info!("🎨 像素格式 {:?} ({} 平面) → {:?}", format, planes, OUTPUT_FORMAT);
    Ok(())
}
