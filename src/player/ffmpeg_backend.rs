use crate::core::{CodecParams, MediaError, Result, StreamInfo};
use crate::player::backend::{Container, DecodeContext, MediaBackend, Reusable, VideoDecodeContext};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::{codec, ffi, format, software, util, Rational};
use log::{debug, info};
use std::os::raw::c_int;
use std::path::Path;
use std::ptr;

/// 基于 FFmpeg（ffmpeg-next）的后端
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

/// FFmpeg 输入容器
pub struct FfmpegContainer {
    input: format::context::Input,
}

impl FfmpegContainer {
    pub fn input(&self) -> &format::context::Input {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut format::context::Input {
        &mut self.input
    }

    /// av_guess_frame_rate：综合容器与流信息推测帧率
    fn guess_frame_rate(&self, stream: &format::stream::Stream) -> Rational {
        // 两个指针都来自仍然存活的 input，av_guess_frame_rate 只读不写
        unsafe {
            Rational::from(ffi::av_guess_frame_rate(
                self.input.as_ptr() as *mut _,
                stream.as_ptr() as *mut _,
                ptr::null_mut(),
            ))
        }
    }
}

/// 读取流的编解码参数，codecpar 为空时返回 None
fn codec_params(parameters: &codec::Parameters) -> Option<CodecParams> {
    unsafe {
        let raw = parameters.as_ptr();
        if raw.is_null() {
            return None;
        }

        Some(CodecParams {
            medium: parameters.medium(),
            id: parameters.id(),
            width: (*raw).width.max(0) as u32,
            height: (*raw).height.max(0) as u32,
            channels: (*raw).ch_layout.nb_channels.max(0) as u16,
            sample_rate: (*raw).sample_rate.max(0) as u32,
        })
    }
}

fn known(value: i64) -> Option<i64> {
    (value != ffi::AV_NOPTS_VALUE && value > 0).then_some(value)
}

impl Container for FfmpegContainer {
    fn streams(&self) -> Vec<StreamInfo> {
        self.input
            .streams()
            .map(|stream| StreamInfo {
                index: stream.index(),
                params: codec_params(&stream.parameters()),
                time_base: stream.time_base(),
                frames: stream.frames(),
                duration: known(stream.duration()),
                guessed_frame_rate: self.guess_frame_rate(&stream),
            })
            .collect()
    }

    fn duration(&self) -> Option<i64> {
        known(self.input.duration())
    }

    fn seek_backward(&mut self, stream_index: usize, target: i64) -> Result<()> {
        // input.seek() 只支持 AV_TIME_BASE 单位，这里需要按流时间基定位，直接调用 av_seek_frame
        let ret = unsafe {
            ffi::av_seek_frame(
                self.input.as_mut_ptr(),
                stream_index as c_int,
                target,
                ffi::AVSEEK_FLAG_BACKWARD as c_int,
            )
        };

        if ret < 0 {
            return Err(MediaError::SeekError(ffmpeg::Error::from(ret).to_string()));
        }
        Ok(())
    }
}

impl DecodeContext for codec::decoder::Video {
    fn flush_buffers(&mut self) -> Result<()> {
        self.flush();
        Ok(())
    }
}

impl VideoDecodeContext for codec::decoder::Video {
    fn pixel_format(&self) -> format::Pixel {
        self.format()
    }
}

impl DecodeContext for codec::decoder::Audio {
    fn flush_buffers(&mut self) -> Result<()> {
        self.flush();
        Ok(())
    }
}

impl Reusable for util::frame::Video {
    fn clear_refs(&mut self) {
        unsafe { ffi::av_frame_unref(self.as_mut_ptr()) }
    }
}

impl Reusable for util::frame::Audio {
    fn clear_refs(&mut self) {
        unsafe { ffi::av_frame_unref(self.as_mut_ptr()) }
    }
}

impl Reusable for ffmpeg::Packet {
    fn clear_refs(&mut self) {
        unsafe { ffi::av_packet_unref(self.as_mut_ptr()) }
    }
}

impl MediaBackend for FfmpegBackend {
    type Container = FfmpegContainer;
    type Codec = codec::Codec;
    type CodecContext = codec::context::Context;
    type VideoDecoder = codec::decoder::Video;
    type AudioDecoder = codec::decoder::Audio;
    type Converter = software::scaling::Context;
    type VideoFrame = util::frame::Video;
    type AudioFrame = util::frame::Audio;
    type Packet = ffmpeg::Packet;

    fn open_container(&self, path: &Path) -> Result<Self::Container> {
        info!("正在打开文件: {}", path.display());

        // format::input 内部依次执行 avformat_open_input 与 avformat_find_stream_info，
        // 任一步失败时已分配的 AVFormatContext 会被一并释放
        let input = format::input(path)
            .map_err(|e| MediaError::OpenError(format!("{}: {}", path.display(), e)))?;

        debug!("容器格式: {}, 共 {} 个流", input.format().name(), input.streams().count());
        Ok(FfmpegContainer { input })
    }

    fn read_packet(&self, container: &mut Self::Container, packet: &mut Self::Packet) -> Result<Option<usize>> {
        match packet.read(&mut container.input) {
            Ok(()) => Ok(Some(packet.stream())),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn find_decoder(&self, id: codec::Id) -> Option<Self::Codec> {
        codec::decoder::find(id)
    }

    fn alloc_context(&self, codec: Self::Codec) -> Result<Self::CodecContext> {
        unsafe {
            let raw = ffi::avcodec_alloc_context3(codec.as_ptr());
            if raw.is_null() {
                return Err(MediaError::ContextAllocError(codec.name().to_string()));
            }
            // owner 为 None：Context 被 drop 时调用 avcodec_free_context
            Ok(codec::context::Context::wrap(raw, None))
        }
    }

    fn apply_parameters(
        &self,
        context: &mut Self::CodecContext,
        container: &Self::Container,
        stream_index: usize,
    ) -> Result<()> {
        let stream = container
            .input
            .stream(stream_index)
            .ok_or_else(|| MediaError::ParametersError(format!("流 {} 不存在", stream_index)))?;

        context
            .set_parameters(stream.parameters())
            .map_err(|e| MediaError::ParametersError(e.to_string()))
    }

    fn open_video(&self, context: Self::CodecContext, codec: Self::Codec) -> Result<Self::VideoDecoder> {
        context
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.video())
            .map_err(|e| MediaError::DecoderOpenError(format!("{}: {}", codec.name(), e)))
    }

    fn open_audio(&self, context: Self::CodecContext, codec: Self::Codec) -> Result<Self::AudioDecoder> {
        context
            .decoder()
            .open_as(codec)
            .and_then(|opened| opened.audio())
            .map_err(|e| MediaError::DecoderOpenError(format!("{}: {}", codec.name(), e)))
    }

    fn plane_count(&self, format: format::Pixel) -> usize {
        let planes = unsafe { ffi::av_pix_fmt_count_planes(format.into()) };
        planes.max(0) as usize
    }

    fn build_converter(
        &self,
        source: format::Pixel,
        width: u32,
        height: u32,
        target: format::Pixel,
    ) -> Result<Self::Converter> {
        software::scaling::Context::get(
            source,
            width,
            height,
            target,
            width,
            height,
            software::scaling::Flags::FAST_BILINEAR,
        )
        .map_err(|e| MediaError::ConverterError(format!("{:?} -> {:?}: {}", source, target, e)))
    }

    fn alloc_video_frame(&self) -> Result<Self::VideoFrame> {
        let frame = util::frame::Video::empty();
        if unsafe { frame.as_ptr().is_null() } {
            return Err(MediaError::AllocError("视频帧"));
        }
        Ok(frame)
    }

    fn alloc_audio_frame(&self) -> Result<Self::AudioFrame> {
        let frame = util::frame::Audio::empty();
        if unsafe { frame.as_ptr().is_null() } {
            return Err(MediaError::AllocError("音频帧"));
        }
        Ok(frame)
    }

    fn alloc_packet(&self) -> Result<Self::Packet> {
        Ok(ffmpeg::Packet::empty())
    }
}
