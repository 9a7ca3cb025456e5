use crate::core::Result;
use crate::player::backend::MediaBackend;
use crate::player::{decoder, lifecycle, pixel, prober, Media};
use log::{error, info, warn};
use std::path::Path;

/// 加载媒体文件
///
/// 流程：打开容器 → 选择流 → 打开视频解码器 → 配置像素转换 → 打开音频解码器 → 分配数据包。
/// 任何一步失败都会释放此前获取的全部资源，句柄回到未加载状态。
pub(crate) fn load<B: MediaBackend>(media: &mut Media<B>, path: &Path) -> Result<()> {
    if media.holds_resources() {
        warn!("⚠️  句柄已持有资源，重新加载前先释放");
        lifecycle::release(media);
    }

    media.begin_loading();
    match acquire(media, path) {
        Ok(()) => {
            media.finish_loading(true);
            info!(
                "✅ 加载完成: {} ({:?}, 时长 {:.2}s)",
                path.display(),
                media.kind(),
                media.duration()
            );
            Ok(())
        }
        Err(e) => {
            error!("❌ 加载失败: {}: {}", path.display(), e);
            lifecycle::release(media);
            media.finish_loading(false);
            Err(e)
        }
    }
}

fn acquire<B: MediaBackend>(media: &mut Media<B>, path: &Path) -> Result<()> {
    let selection = prober::probe(media, path)?;

    if selection.video.is_some() {
        decoder::open_video(media)?;
        pixel::configure_converter(media)?;
    }

    if selection.audio.is_some() {
        decoder::open_audio(media)?;
    }

    let packet = media.backend().alloc_packet()?;
    media.install_packet(packet);
    Ok(())
}
