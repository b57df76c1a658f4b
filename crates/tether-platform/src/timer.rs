use gloo_timers::future::TimeoutFuture;
use tether_core::ports::{Sleep, TimerPort};

/// `setTimeout`-backed timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooTimer;

impl GlooTimer {
    pub fn new() -> Self {
        Self
    }
}

impl TimerPort for GlooTimer {
    fn sleep(&self, ms: u64) -> Sleep {
        let ms = u32::try_from(ms).unwrap_or(u32::MAX);
        Box::pin(TimeoutFuture::new(ms))
    }
}
