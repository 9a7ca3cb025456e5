use crate::core::{AudioConfig, MediaError, Result};
use crate::player::render::{self, RenderShared, ToneState, CHANNELS};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// 音频输出 - 使用 cpal 驱动实时渲染回调
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    shared: Arc<RenderShared>,
    error_tx: Sender<String>,
    error_rx: Receiver<String>,
}

impl AudioOutput {
    /// 在默认输出设备上创建立体声输出
    ///
    /// 设备不支持固定缓冲大小时回退到设备默认值
    pub fn new(audio: &AudioConfig, shared: Arc<RenderShared>) -> Result<Self> {
        info!(
            "初始化音频输出: {} Hz, {} 声道, 每次回调 {} 帧",
            audio.sample_rate, CHANNELS, audio.frames_per_buffer
        );

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| MediaError::AudioError("无法找到音频输出设备".to_string()))?;

        debug!("使用音频设备: {}", device.name().unwrap_or_default());

        let mut config = StreamConfig {
            channels: CHANNELS as u16,
            sample_rate: cpal::SampleRate(audio.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(audio.frames_per_buffer),
        };

        let supported_configs = device
            .supported_output_configs()
            .map_err(|e| MediaError::AudioError(format!("无法获取支持的音频配置: {}", e)))?;

        let mut supported_range = None;
        for supported in supported_configs {
            if Self::is_config_compatible(&config, &supported) {
                supported_range = Some(supported);
                break;
            }
        }

        let Some(supported) = supported_range else {
            return Err(MediaError::AudioError(format!(
                "音频设备不支持 {} Hz, {} 声道",
                audio.sample_rate, CHANNELS
            )));
        };

        if !Self::buffer_size_supported(audio.frames_per_buffer, &supported) {
            warn!("⚠️  设备不支持 {} 帧的缓冲，使用默认缓冲大小", audio.frames_per_buffer);
            config.buffer_size = cpal::BufferSize::Default;
        }

        let (error_tx, error_rx) = crossbeam_channel::unbounded();

        Ok(Self {
            device,
            config,
            stream: None,
            shared,
            error_tx,
            error_rx,
        })
    }

    /// 检查配置是否兼容
    fn is_config_compatible(config: &StreamConfig, supported: &SupportedStreamConfigRange) -> bool {
        let rate_in_range = config.sample_rate.0 >= supported.min_sample_rate().0
            && config.sample_rate.0 <= supported.max_sample_rate().0;

        let channels_match = config.channels == supported.channels();

        rate_in_range && channels_match
    }

    fn buffer_size_supported(frames: u32, supported: &SupportedStreamConfigRange) -> bool {
        match supported.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max } => frames >= *min && frames <= *max,
            cpal::SupportedBufferSize::Unknown => false,
        }
    }

    /// 开始播放
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let shared = self.shared.clone();
        let mut tone = ToneState::default();
        let error_tx = self.error_tx.clone();

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / CHANNELS;
                    render::render(data, frames, &mut tone, &shared);
                },
                move |err| {
                    // 回调线程里不打日志，交给控制线程处理
                    let _ = error_tx.try_send(err.to_string());
                },
                None,
            )
            .map_err(|e| MediaError::AudioError(format!("创建音频流失败: {}", e)))?;

        stream
            .play()
            .map_err(|e| MediaError::AudioError(format!("启动音频流失败: {}", e)))?;

        self.stream = Some(stream);
        info!("🔊 音频输出已启动");

        Ok(())
    }

    /// 停止播放
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("音频输出已停止");
        }
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// 输出回调积累的流错误，返回错误条数
    pub fn drain_errors(&self) -> usize {
        let mut count = 0;
        for err in self.error_rx.try_iter() {
            error!("❌ 音频流错误: {}", err);
            count += 1;
        }
        count
    }

    /// 获取实际使用的音频配置
    pub fn get_config(&self) -> (u32, u16) {
        (self.config.sample_rate.0, self.config.channels)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
