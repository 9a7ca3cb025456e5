use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "media-engine")]
#[command(author, version, about = "媒体加载 / Seek / 音效播放调试工具")]
pub struct Cli {
    /// 配置文件路径（JSON）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 加载媒体文件并显示流信息
    Probe {
        #[arg(required = true)]
        file: PathBuf,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 加载后跳转到指定位置
    Seek {
        #[arg(required = true)]
        file: PathBuf,

        /// 目标位置（秒）
        #[arg(long)]
        at: f64,
    },

    /// 从音效目录加载并播放
    Play {
        /// 音效文件名（相对音效目录）
        #[arg(required = true)]
        name: String,

        /// 播放时长（秒）
        #[arg(long, default_value = "2")]
        seconds: u64,
    },
}
