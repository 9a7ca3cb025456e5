// 媒体引擎：容器探测、解码上下文生命周期与 Seek

pub mod core;
pub mod player;

pub use crate::core::{MediaConfig, MediaError, MediaInfo, MediaKind, PlaybackState, Result};
pub use crate::player::{Media, Playback, Sound, Video};
