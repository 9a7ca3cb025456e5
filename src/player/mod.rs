// 媒体加载、Seek、资源生命周期与音频输出

pub mod backend;
pub mod ffmpeg_backend;
pub mod media;
pub mod prober;
pub mod pixel;
pub mod render;
pub mod audio_output;
pub mod playback;

mod decoder;
mod loader;
mod lifecycle;
mod seek;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::MediaBackend;
pub use ffmpeg_backend::FfmpegBackend;
pub use media::{AudioParts, Media, VideoParts};
pub use prober::Selection;
pub use pixel::{normalize_pixel_format, OUTPUT_FORMAT};
pub use seek::{clamp_target, seek_target};
pub use render::{RenderShared, ToneState};
pub use audio_output::AudioOutput;
pub use playback::{Playback, Sound, Video};
