//! 测试用后端：不依赖真实媒体文件，记录每个资源的获取与释放

use crate::core::{CodecParams, MediaError, Result, StreamInfo};
use crate::player::backend::{Container, DecodeContext, MediaBackend, Reusable, VideoDecodeContext};
use ffmpeg_next::codec::Id;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::{media, Rational};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

/// 注入失败的位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailPoint {
    Open,
    FindDecoder(Id),
    AllocContext(Id),
    Parameters(Id),
    OpenDecoder(Id),
    Converter,
    VideoFrame,
    AudioFrame,
    Packet,
}

/// 资源台账
#[derive(Debug, Default)]
pub struct Ledger {
    pub acquired: Vec<String>,
    pub released: Vec<String>,
    /// (流索引, 目标时间戳)
    pub seeks: Vec<(usize, i64)>,
    pub flushes: usize,
    pub cleared: usize,
    pub converter_source: Option<Pixel>,
}

impl Ledger {
    /// 尚未释放的资源数
    pub fn live(&self) -> usize {
        self.acquired.len() - self.released.len()
    }
}

type SharedLedger = Rc<RefCell<Ledger>>;

/// 创建时记一笔获取，drop 时记一笔释放
struct Tracked {
    name: &'static str,
    ledger: SharedLedger,
}

impl Tracked {
    fn new(name: &'static str, ledger: &SharedLedger) -> Self {
        ledger.borrow_mut().acquired.push(name.to_string());
        Self { name, ledger: ledger.clone() }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger.borrow_mut().released.push(self.name.to_string());
    }
}

pub struct MockContainer {
    streams: Vec<StreamInfo>,
    duration: Option<i64>,
    packets: VecDeque<usize>,
    fail_seek: bool,
    ledger: SharedLedger,
    _tracked: Tracked,
}

impl Container for MockContainer {
    fn streams(&self) -> Vec<StreamInfo> {
        self.streams.clone()
    }

    fn duration(&self) -> Option<i64> {
        self.duration
    }

    fn seek_backward(&mut self, stream_index: usize, target: i64) -> Result<()> {
        self.ledger.borrow_mut().seeks.push((stream_index, target));
        if self.fail_seek {
            return Err(MediaError::SeekError("mock seek failure".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MockCodec(Id);

pub struct MockContext {
    id: Id,
    _tracked: Tracked,
}

pub struct MockDecoder {
    pixel_format: Pixel,
    fail_flush: bool,
    ledger: SharedLedger,
    _tracked: Tracked,
}

impl DecodeContext for MockDecoder {
    fn flush_buffers(&mut self) -> Result<()> {
        self.ledger.borrow_mut().flushes += 1;
        if self.fail_flush {
            return Err(MediaError::FFmpegError(ffmpeg_next::Error::Bug));
        }
        Ok(())
    }
}

impl VideoDecodeContext for MockDecoder {
    fn pixel_format(&self) -> Pixel {
        self.pixel_format
    }
}

pub struct MockConverter {
    _tracked: Tracked,
}

/// 帧与数据包共用的缓冲
pub struct MockBuffer {
    ledger: SharedLedger,
    _tracked: Tracked,
}

impl Reusable for MockBuffer {
    fn clear_refs(&mut self) {
        self.ledger.borrow_mut().cleared += 1;
    }
}

#[derive(Clone)]
pub struct MockBackend {
    streams: Vec<StreamInfo>,
    container_duration: Option<i64>,
    pixel_format: Pixel,
    packets: Vec<usize>,
    fail: Option<FailPoint>,
    fail_seek: bool,
    fail_flush: bool,
    ledger: SharedLedger,
}

impl MockBackend {
    pub fn new(streams: Vec<StreamInfo>) -> Self {
        Self {
            streams,
            container_duration: Some(10_000_000),
            pixel_format: Pixel::YUV420P,
            packets: Vec::new(),
            fail: None,
            fail_seek: false,
            fail_flush: false,
            ledger: SharedLedger::default(),
        }
    }

    /// H.264 640x360 30fps 10 秒 + AAC 立体声 48kHz
    pub fn standard() -> Self {
        Self::new(vec![video_stream(0, 640, 360), audio_stream(1, 2, 48000)])
    }

    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.fail = Some(point);
        self
    }

    pub fn with_pixel_format(mut self, format: Pixel) -> Self {
        self.pixel_format = format;
        self
    }

    pub fn with_packets(mut self, packets: Vec<usize>) -> Self {
        self.packets = packets;
        self
    }

    pub fn with_failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }

    pub fn with_failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    pub fn ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }

    fn fails(&self, point: FailPoint) -> bool {
        self.fail == Some(point)
    }

    fn open_decoder(&self, context: MockContext, name: &'static str) -> Result<MockDecoder> {
        let id = context.id;
        drop(context);
        if self.fails(FailPoint::OpenDecoder(id)) {
            return Err(MediaError::DecoderOpenError(id.name().to_string()));
        }
        Ok(MockDecoder {
            pixel_format: self.pixel_format,
            fail_flush: self.fail_flush,
            ledger: self.ledger.clone(),
            _tracked: Tracked::new(name, &self.ledger),
        })
    }

    fn buffer(&self, name: &'static str, point: FailPoint) -> Result<MockBuffer> {
        if self.fails(point) {
            return Err(MediaError::AllocError(name));
        }
        Ok(MockBuffer {
            ledger: self.ledger.clone(),
            _tracked: Tracked::new(name, &self.ledger),
        })
    }
}

impl MediaBackend for MockBackend {
    type Container = MockContainer;
    type Codec = MockCodec;
    type CodecContext = MockContext;
    type VideoDecoder = MockDecoder;
    type AudioDecoder = MockDecoder;
    type Converter = MockConverter;
    type VideoFrame = MockBuffer;
    type AudioFrame = MockBuffer;
    type Packet = MockBuffer;

    fn open_container(&self, path: &Path) -> Result<Self::Container> {
        if self.fails(FailPoint::Open) {
            return Err(MediaError::OpenError(path.display().to_string()));
        }
        Ok(MockContainer {
            streams: self.streams.clone(),
            duration: self.container_duration,
            packets: self.packets.iter().copied().collect(),
            fail_seek: self.fail_seek,
            ledger: self.ledger.clone(),
            _tracked: Tracked::new("container", &self.ledger),
        })
    }

    fn read_packet(&self, container: &mut Self::Container, _packet: &mut Self::Packet) -> Result<Option<usize>> {
        Ok(container.packets.pop_front())
    }

    fn find_decoder(&self, id: Id) -> Option<Self::Codec> {
        (!self.fails(FailPoint::FindDecoder(id))).then_some(MockCodec(id))
    }

    fn alloc_context(&self, codec: Self::Codec) -> Result<Self::CodecContext> {
        if self.fails(FailPoint::AllocContext(codec.0)) {
            return Err(MediaError::ContextAllocError(codec.0.name().to_string()));
        }
        Ok(MockContext {
            id: codec.0,
            _tracked: Tracked::new("codec_context", &self.ledger),
        })
    }

    fn apply_parameters(
        &self,
        context: &mut Self::CodecContext,
        _container: &Self::Container,
        stream_index: usize,
    ) -> Result<()> {
        if self.fails(FailPoint::Parameters(context.id)) {
            return Err(MediaError::ParametersError(format!("stream {}", stream_index)));
        }
        Ok(())
    }

    fn open_video(&self, context: Self::CodecContext, _codec: Self::Codec) -> Result<Self::VideoDecoder> {
        self.open_decoder(context, "video_decoder")
    }

    fn open_audio(&self, context: Self::CodecContext, _codec: Self::Codec) -> Result<Self::AudioDecoder> {
        self.open_decoder(context, "audio_decoder")
    }

    fn plane_count(&self, format: Pixel) -> usize {
        match format {
            Pixel::YUV420P | Pixel::YUV422P | Pixel::YUV444P | Pixel::YUV440P => 3,
            Pixel::NV12 | Pixel::NV21 => 2,
            _ => 1,
        }
    }

    fn build_converter(&self, source: Pixel, _width: u32, _height: u32, _target: Pixel) -> Result<Self::Converter> {
        if self.fails(FailPoint::Converter) {
            return Err(MediaError::ConverterError(format!("{:?}", source)));
        }
        self.ledger.borrow_mut().converter_source = Some(source);
        Ok(MockConverter {
            _tracked: Tracked::new("converter", &self.ledger),
        })
    }

    fn alloc_video_frame(&self) -> Result<Self::VideoFrame> {
        self.buffer("video_frame", FailPoint::VideoFrame)
    }

    fn alloc_audio_frame(&self) -> Result<Self::AudioFrame> {
        self.buffer("audio_frame", FailPoint::AudioFrame)
    }

    fn alloc_packet(&self) -> Result<Self::Packet> {
        self.buffer("packet", FailPoint::Packet)
    }
}

// ============= 流构造 =============

/// H.264 视频流，时间基 1/15360，10 秒 300 帧
pub fn video_stream(index: usize, width: u32, height: u32) -> StreamInfo {
    StreamInfo {
        index,
        params: Some(CodecParams {
            medium: media::Type::Video,
            id: Id::H264,
            width,
            height,
            channels: 0,
            sample_rate: 0,
        }),
        time_base: Rational(1, 15360),
        frames: 300,
        duration: Some(153_600),
        guessed_frame_rate: Rational(30, 1),
    }
}

/// AAC 音频流，时间基 1/sample_rate，10 秒
pub fn audio_stream(index: usize, channels: u16, sample_rate: u32) -> StreamInfo {
    StreamInfo {
        index,
        params: Some(CodecParams {
            medium: media::Type::Audio,
            id: Id::AAC,
            width: 0,
            height: 0,
            channels,
            sample_rate,
        }),
        time_base: Rational(1, sample_rate as i32),
        frames: 0,
        duration: Some(i64::from(sample_rate) * 10),
        guessed_frame_rate: Rational(0, 1),
    }
}

pub fn subtitle_stream(index: usize) -> StreamInfo {
    StreamInfo {
        index,
        params: Some(CodecParams {
            medium: media::Type::Subtitle,
            id: Id::SUBRIP,
            width: 0,
            height: 0,
            channels: 0,
            sample_rate: 0,
        }),
        time_base: Rational(1, 1000),
        frames: 0,
        duration: None,
        guessed_frame_rate: Rational(0, 1),
    }
}

/// 没有编解码参数的流
pub fn broken_stream(index: usize) -> StreamInfo {
    StreamInfo {
        index,
        params: None,
        time_base: Rational(0, 1),
        frames: 0,
        duration: None,
        guessed_frame_rate: Rational(0, 1),
    }
}
