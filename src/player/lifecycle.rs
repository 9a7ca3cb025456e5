use crate::player::backend::MediaBackend;
use crate::player::Media;
use log::debug;

/// 释放一个资源槽位，返回是否真的释放了资源
fn drop_slot<T>(slot: &mut Option<T>, name: &str) -> bool {
    match slot.take() {
        Some(resource) => {
            drop(resource);
            debug!("已释放: {}", name);
            true
        }
        None => false,
    }
}

/// 释放句柄持有的全部资源并清空元数据
///
/// 释放顺序：解码上下文 → 容器 → 转换器 → 帧 → 包 → 像素缓冲。
/// 每个槽位释放后置空，所以重复调用、或在加载中途失败后调用都是安全的。
/// 返回本次实际释放的资源数。
pub(crate) fn release<B: MediaBackend>(media: &mut Media<B>) -> usize {
    let mut released = 0;

    released += drop_slot(&mut media.video_mut().decoder, "视频解码器") as usize;
    released += drop_slot(&mut media.audio_mut().decoder, "音频解码器") as usize;
    released += drop_slot(media.container_slot(), "容器") as usize;
    released += drop_slot(&mut media.video_mut().converter, "像素格式转换器") as usize;
    released += drop_slot(&mut media.video_mut().frame, "视频帧") as usize;
    released += drop_slot(&mut media.audio_mut().frame, "音频帧") as usize;
    released += drop_slot(media.packet_slot(), "数据包") as usize;
    released += drop_slot(&mut media.video_mut().pixels, "RGBA 缓冲") as usize;

    if released > 0 {
        debug!("🧹 共释放 {} 项资源", released);
    }

    media.reset_metadata();
    released
}
