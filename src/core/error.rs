use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("FFmpeg 错误: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("配置解析错误: {0}")]
    ConfigError(#[from] serde_json::Error),

    #[error("无法打开文件: {0}")]
    OpenError(String),

    #[error("文件中找不到可用的音视频流")]
    NoStream,

    #[error("找不到 {0} 的解码器")]
    DecoderNotFound(String),

    #[error("无法创建解码上下文: {0}")]
    ContextAllocError(String),

    #[error("无法写入解码参数: {0}")]
    ParametersError(String),

    #[error("无法打开解码器: {0}")]
    DecoderOpenError(String),

    #[error("无法分配缓冲: {0}")]
    AllocError(&'static str),

    #[error("无法创建像素转换器: {0}")]
    ConverterError(String),

    #[error("Seek 失败: {0}")]
    SeekError(String),

    #[error("媒体尚未加载")]
    NotLoaded,

    #[error("媒体尚未就绪，需先预解码")]
    NotReady,

    #[error("音频输出错误: {0}")]
    AudioError(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;
