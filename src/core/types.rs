use ffmpeg_next::{codec, media, Rational};
use serde::{Deserialize, Serialize};

/// 媒体类型（构造时确定，之后不再改变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Sound,
}

/// 循环模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Default,
    None,
    Normal,
}

/// 流槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSlot {
    Video,
    Audio,
    Subtitle,
}

impl StreamSlot {
    fn position(self) -> usize {
        match self {
            StreamSlot::Video => 0,
            StreamSlot::Audio => 1,
            StreamSlot::Subtitle => 2,
        }
    }
}

/// 视频 / 音频 / 字幕 三个槽位各自选中的流索引，`None` 表示不存在
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSlots([Option<usize>; 3]);

impl StreamSlots {
    pub fn get(&self, slot: StreamSlot) -> Option<usize> {
        self.0[slot.position()]
    }

    pub(crate) fn set(&mut self, slot: StreamSlot, index: usize) {
        self.0[slot.position()] = Some(index);
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [None; 3];
    }

    /// 根据流索引反查槽位
    pub fn slot_of(&self, index: usize) -> Option<StreamSlot> {
        [StreamSlot::Video, StreamSlot::Audio, StreamSlot::Subtitle]
            .into_iter()
            .find(|slot| self.get(*slot) == Some(index))
    }
}

/// 生命周期标志（彼此独立，组合后构成状态机，见 [`PlaybackState`]）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleFlags {
    pub loading: bool,
    pub loaded: bool,
    pub ready: bool,
    pub playing: bool,
    pub paused: bool,
    pub finished: bool,
    pub closed: bool,
}

/// 由生命周期标志推导出的播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Unloaded,
    Loading,
    Loaded,
    Ready,
    Playing,
    Paused,
    Finished,
    Closed,
}

impl LifecycleFlags {
    pub fn state(&self) -> PlaybackState {
        if self.loading {
            PlaybackState::Loading
        } else if !self.loaded {
            if self.closed {
                PlaybackState::Closed
            } else {
                PlaybackState::Unloaded
            }
        } else if self.finished {
            PlaybackState::Finished
        } else if self.playing && self.paused {
            PlaybackState::Paused
        } else if self.playing {
            PlaybackState::Playing
        } else if self.ready {
            PlaybackState::Ready
        } else {
            PlaybackState::Loaded
        }
    }
}

/// 时间信息，单位均为所选主流的时间基
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub time_base: Rational,
    pub duration: i64,
    pub position: i64,
    pub frames_decoded: i64,
    pub frames_expected: i64,
    /// 截断后的整数帧率（num / den 整除）
    pub average_fps: i64,
    /// 未截断的帧率，29.97 之类的帧率在这里不会丢精度
    pub frame_rate: Rational,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            time_base: Rational(0, 1),
            duration: 0,
            position: 0,
            frames_decoded: 0,
            frames_expected: 0,
            average_fps: 0,
            frame_rate: Rational(0, 1),
        }
    }
}

impl Timing {
    /// 时间基单位 -> 秒
    pub fn to_seconds(&self, units: i64) -> f64 {
        let (num, den) = (self.time_base.numerator(), self.time_base.denominator());
        if den == 0 {
            return 0.0;
        }
        units as f64 * num as f64 / den as f64
    }

    pub fn duration_seconds(&self) -> f64 {
        self.to_seconds(self.duration)
    }

    pub fn position_seconds(&self) -> f64 {
        self.to_seconds(self.position)
    }
}

/// 单个流的编解码参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecParams {
    pub medium: media::Type,
    pub id: codec::Id,
    pub width: u32,
    pub height: u32,
    pub channels: u16,
    pub sample_rate: u32,
}

/// 探测得到的流元数据（与具体后端无关）
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub index: usize,
    /// 编解码参数缺失时为 `None`，该流会被跳过
    pub params: Option<CodecParams>,
    pub time_base: Rational,
    pub frames: i64,
    /// 流自身未记录时长时为 `None`
    pub duration: Option<i64>,
    pub guessed_frame_rate: Rational,
}

/// 媒体信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub kind: MediaKind,
    pub duration: f64,          // 总时长（秒）
    pub width: u32,
    pub height: u32,
    pub average_fps: i64,
    pub frame_rate: f64,
    pub video_codec: String,
    pub audio_codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub video_stream: Option<usize>,
    pub audio_stream: Option<usize>,
    pub subtitle_stream: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_lookup() {
        let mut slots = StreamSlots::default();
        slots.set(StreamSlot::Video, 0);
        slots.set(StreamSlot::Audio, 2);
        assert_eq!(slots.get(StreamSlot::Video), Some(0));
        assert_eq!(slots.get(StreamSlot::Subtitle), None);
        assert_eq!(slots.slot_of(2), Some(StreamSlot::Audio));
        assert_eq!(slots.slot_of(1), None);

        slots.clear();
        assert_eq!(slots, StreamSlots::default());
    }

    #[test]
    fn test_state_from_flags() {
        let mut flags = LifecycleFlags::default();
        assert_eq!(flags.state(), PlaybackState::Unloaded);

        flags.loaded = true;
        assert_eq!(flags.state(), PlaybackState::Loaded);
        flags.ready = true;
        assert_eq!(flags.state(), PlaybackState::Ready);
        flags.playing = true;
        assert_eq!(flags.state(), PlaybackState::Playing);
        flags.paused = true;
        assert_eq!(flags.state(), PlaybackState::Paused);
        flags.finished = true;
        assert_eq!(flags.state(), PlaybackState::Finished);

        let closed = LifecycleFlags { closed: true, ..Default::default() };
        assert_eq!(closed.state(), PlaybackState::Closed);
    }

    #[test]
    fn test_timing_seconds() {
        let timing = Timing {
            time_base: Rational(1, 1000),
            duration: 12_500,
            position: 500,
            ..Default::default()
        };
        assert_eq!(timing.duration_seconds(), 12.5);
        assert_eq!(timing.position_seconds(), 0.5);

        let broken = Timing { time_base: Rational(1, 0), duration: 10, ..Default::default() };
        assert_eq!(broken.duration_seconds(), 0.0);
    }
}
