use crate::core::{Result, StreamInfo};
use ffmpeg_next::codec;
use ffmpeg_next::format::Pixel;
use std::path::Path;

/// 已打开并完成探测的容器
pub trait Container {
    /// 所有流的元数据（按流索引顺序）
    fn streams(&self) -> Vec<StreamInfo>;

    /// 容器级时长（微秒，AV_TIME_BASE），未知时为 `None`
    fn duration(&self) -> Option<i64>;

    /// 在指定流上向后 seek：定位到 target（流时间基单位）之前最近的关键帧
    fn seek_backward(&mut self, stream_index: usize, target: i64) -> Result<()>;
}

/// 已打开的解码上下文
pub trait DecodeContext {
    /// 丢弃内部缓存的参考帧
    fn flush_buffers(&mut self) -> Result<()>;
}

pub trait VideoDecodeContext: DecodeContext {
    fn pixel_format(&self) -> Pixel;
}

/// 可复用的帧 / 包缓冲
pub trait Reusable {
    /// 释放缓冲持有的引用数据，缓冲本身保留
    fn clear_refs(&mut self);
}

/// 媒体后端抽象
///
/// 加载流程的每一步（打开容器、查找解码器、分配上下文、写入参数、打开解码器、
/// 创建转换器、分配帧/包）都单独暴露出来，每一步都可能失败。
/// 所有资源都是 RAII 类型，drop 即释放。
pub trait MediaBackend: Clone {
    type Container: Container;
    type Codec: Copy;
    /// 已分配但未打开的解码上下文
    type CodecContext;
    type VideoDecoder: VideoDecodeContext;
    type AudioDecoder: DecodeContext;
    type Converter;
    type VideoFrame: Reusable;
    type AudioFrame: Reusable;
    type Packet: Reusable;

    /// 打开容器并探测流信息（可能需要预读数据，会阻塞）
    fn open_container(&self, path: &Path) -> Result<Self::Container>;

    /// 读取下一个数据包到 packet 中
    ///
    /// 返回：
    /// - Ok(Some(index)): 数据包所属的流索引
    /// - Ok(None): 到达文件末尾
    fn read_packet(&self, container: &mut Self::Container, packet: &mut Self::Packet) -> Result<Option<usize>>;

    fn find_decoder(&self, id: codec::Id) -> Option<Self::Codec>;

    fn alloc_context(&self, codec: Self::Codec) -> Result<Self::CodecContext>;

    /// 把流的编解码参数写入上下文
    fn apply_parameters(
        &self,
        context: &mut Self::CodecContext,
        container: &Self::Container,
        stream_index: usize,
    ) -> Result<()>;

    fn open_video(&self, context: Self::CodecContext, codec: Self::Codec) -> Result<Self::VideoDecoder>;

    fn open_audio(&self, context: Self::CodecContext, codec: Self::Codec) -> Result<Self::AudioDecoder>;

    /// 像素格式的平面数
    fn plane_count(&self, format: Pixel) -> usize;

    /// 创建同分辨率的像素格式转换器
    fn build_converter(&self, source: Pixel, width: u32, height: u32, target: Pixel) -> Result<Self::Converter>;

    fn alloc_video_frame(&self) -> Result<Self::VideoFrame>;

    fn alloc_audio_frame(&self) -> Result<Self::AudioFrame>;

    fn alloc_packet(&self) -> Result<Self::Packet>;
}
