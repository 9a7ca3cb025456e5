use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use media_engine::core::{MediaConfig, MediaInfo, MediaKind};
use media_engine::player::{Media, Playback, Sound};
use std::path::Path;
use std::thread;
use std::time::Duration;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    // 初始化 FFmpeg
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("FFmpeg 初始化失败: {}", e))?;
    if !cli.verbose {
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
    }

    let config = MediaConfig::load_or_default(cli.config.as_deref()).context("读取配置失败")?;

    match cli.command {
        Commands::Probe { file, json } => probe(&file, json),
        Commands::Seek { file, at } => seek(&file, at),
        Commands::Play { name, seconds } => play(&config, &name, seconds),
    }
}

fn load(path: &Path) -> Result<Media> {
    let mut media = Media::new(MediaKind::Video);
    media
        .load(path)
        .with_context(|| format!("无法加载 {}", path.display()))?;
    Ok(media)
}

fn probe(path: &Path, json: bool) -> Result<()> {
    let media = load(path)?;
    let info = media.media_info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print_info(path, &info);
    }
    Ok(())
}

fn print_info(path: &Path, info: &MediaInfo) {
    println!("文件: {}", path.display());
    println!("时长: {:.2}s", info.duration);
    if let Some(index) = info.video_stream {
        println!(
            "视频: 流 {} | {} | {}x{} | {} fps ({:.3})",
            index, info.video_codec, info.width, info.height, info.average_fps, info.frame_rate
        );
    }
    if let Some(index) = info.audio_stream {
        println!(
            "音频: 流 {} | {} | {} Hz | {} 声道",
            index, info.audio_codec, info.sample_rate, info.channels
        );
    }
    if let Some(index) = info.subtitle_stream {
        println!("字幕: 流 {}（未解码）", index);
    }
}

fn seek(path: &Path, at: f64) -> Result<()> {
    let mut media = load(path)?;
    media.set_position(at).context("Seek 失败")?;
    println!(
        "Seek 完成: 请求 {:.2}s / 时长 {:.2}s, 状态 {:?}",
        at,
        media.duration(),
        media.state()
    );
    Ok(())
}

fn play(config: &MediaConfig, name: &str, seconds: u64) -> Result<()> {
    let mut sound = Sound::open(config, name).with_context(|| format!("无法加载音效 {}", name))?;
    sound.play()?;

    info!("播放 {} 秒...", seconds);
    thread::sleep(Duration::from_secs(seconds));

    sound.poll_errors();
    sound.close();
    Ok(())
}
