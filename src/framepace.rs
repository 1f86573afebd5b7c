use std::time::{Duration, Instant};

/// Frame timing for the host loop: per-frame delta, total elapsed time and an
/// optional framerate cap.
pub struct FrameClock {
    start: Instant,
    frame_start: Instant,
    delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            frame_start: now,
            delta: 0.0,
        }
    }

    /// Starts a new frame, returns `(delta, elapsed)` in seconds.
    pub fn begin_frame(&mut self) -> (f32, f32) {
        let now = Instant::now();
        self.delta = (now - self.frame_start).as_secs_f32();
        self.frame_start = now;

        (self.delta, self.elapsed())
    }

    pub fn elapsed(&self) -> f32 {
        (self.frame_start - self.start).as_secs_f32()
    }

    /// Time spent in the current frame so far
    pub fn frametime(&self) -> f32 {
        self.frame_start.elapsed().as_secs_f32()
    }

    /// Sleeps away the rest of the frame when `framerate` is non-zero.
    pub fn end_frame(&self, framerate: u32) {
        if framerate == 0 {
            return;
        }

        let limit_frametime = 1.0 / framerate as f32;
        const ACCURACY: f32 = 0.0001; // 100 microseconds
        let sleep_time = limit_frametime - self.frametime() - ACCURACY;

        if sleep_time > 0.0 {
            std::thread::sleep(Duration::from_secs_f32(sleep_time));

            while self.frametime() < limit_frametime {
                std::thread::yield_now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_accumulates_deltas() {
        let mut clock = FrameClock::new();
        let mut total = 0.0;
        let mut last_elapsed = 0.0;

        for _ in 0..3 {
            std::thread::sleep(Duration::from_millis(2));
            let (delta, elapsed) = clock.begin_frame();
            assert!(delta > 0.0);
            assert!(elapsed >= last_elapsed);
            total += delta;
            last_elapsed = elapsed;
        }

        assert!((total - clock.elapsed()).abs() < 1e-3);
    }

    #[test]
    fn caps_the_framerate() {
        let mut clock = FrameClock::new();
        clock.begin_frame();
        clock.end_frame(100);
        assert!(clock.frametime() >= 0.01);
    }
}
