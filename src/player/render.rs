use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// 输出固定为交错立体声
pub const CHANNELS: usize = 2;

/// 控制线程与音频回调之间共享的参数
///
/// 回调运行在实时线程上，只能做无锁读取
#[derive(Debug)]
pub struct RenderShared {
    /// f32 位模式
    volume: AtomicU32,
    muted: AtomicBool,
}

impl RenderShared {
    pub fn new(volume: f32) -> Self {
        Self {
            volume: AtomicU32::new(clamp_volume(volume).to_bits()),
            muted: AtomicBool::new(false),
        }
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.store(clamp_volume(volume).to_bits(), Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }
}

impl Default for RenderShared {
    fn default() -> Self {
        Self::new(1.0)
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 锯齿波测试音的相位，范围 [-1, 1)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToneState {
    pub left_phase: f32,
    pub right_phase: f32,
}

impl ToneState {
    const LEFT_STEP: f32 = 0.01;
    const RIGHT_STEP: f32 = 0.03;

    fn step(phase: &mut f32, delta: f32) {
        *phase += delta;
        if *phase >= 1.0 {
            *phase -= 2.0;
        }
    }

    /// 取当前采样后推进相位
    fn next(&mut self) -> (f32, f32) {
        let sample = (self.left_phase, self.right_phase);
        Self::step(&mut self.left_phase, Self::LEFT_STEP);
        Self::step(&mut self.right_phase, Self::RIGHT_STEP);
        sample
    }
}

/// 音频回调：向交错立体声缓冲写入 `frames` 帧
///
/// 只写请求的帧数，缓冲多出的部分填零；缓冲不足以容纳 `frames` 帧时整块静音并返回 false。
/// 这里不分配内存、不加锁、不打日志。
pub fn render(out: &mut [f32], frames: usize, tone: &mut ToneState, shared: &RenderShared) -> bool {
    let Some(needed) = frames.checked_mul(CHANNELS) else {
        out.fill(0.0);
        return false;
    };
    if needed > out.len() {
        out.fill(0.0);
        return false;
    }

    let (body, tail) = out.split_at_mut(needed);
    let muted = shared.is_muted();
    let gain = shared.volume();

    for frame in body.chunks_exact_mut(CHANNELS) {
        let (left, right) = tone.next();
        if muted {
            frame[0] = 0.0;
            frame[1] = 0.0;
        } else {
            frame[0] = left * gain;
            frame[1] = right * gain;
        }
    }
    tail.fill(0.0);
    true
}
