use std::time::Duration;

use instant::Instant;

use crate::cat::{Cat, Viewport};
use crate::input::{Control, InputState};
use crate::render::{DestRect, SpriteRenderer};

/// Window fill behind the cat (0xRRGGBB).
pub const BACKGROUND_COLOR: u32 = 0x9B9BFF;
/// Fill while the cat is pressed against a side wall.
pub const CRASH_COLOR: u32 = 0xFF0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Stopped,
}

/// One play session: the cat, the held keys and the run flag.
pub struct Session {
    state: SessionState,
    input: InputState,
    cat: Cat,
    viewport: Viewport,
    tick_count: u64,
}

impl Session {
    pub fn new(cat: Cat, viewport: Viewport) -> Self {
        Self {
            state: SessionState::NotStarted,
            input: InputState::default(),
            cat,
            viewport,
            tick_count: 0,
        }
    }

    pub fn start(&mut self) {
        if self.state == SessionState::NotStarted {
            self.state = SessionState::Running;
            log::info!(
                "Session started ({}x{})",
                self.viewport.width,
                self.viewport.height
            );
        }
    }

    /// Terminal. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.state != SessionState::Stopped {
            self.state = SessionState::Stopped;
            log::info!("Session stopped after {} ticks", self.tick_count);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn cat(&self) -> &Cat {
        &self.cat
    }

    pub fn input(&self) -> InputState {
        self.input
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Apply a key edge. Quit stops the session on press.
    pub fn handle_key(&mut self, control: Control, pressed: bool) {
        if control == Control::Quit {
            if pressed {
                log::info!("Quit requested");
                self.stop();
            }
            return;
        }
        self.input.set(control, pressed);
    }

    /// Advance the cat by one tick using the current key levels.
    pub fn tick(&mut self, now: Instant) {
        if !self.is_running() {
            return;
        }
        self.cat.update(self.input, self.viewport, now);
        self.tick_count += 1;
    }

    pub fn background(&self) -> u32 {
        if self.cat.touching_wall() {
            CRASH_COLOR
        } else {
            BACKGROUND_COLOR
        }
    }

    /// Clear, blit the cat's current frame, present. Advances the animation.
    pub fn draw(&mut self, renderer: &mut impl SpriteRenderer) {
        renderer.clear(self.background());

        let sample = self.cat.sample_frame();
        let dest = DestRect {
            x: self.cat.pos.x,
            y: self.cat.pos.y,
            w: self.cat.size.x,
            h: self.cat.size.y,
        };
        renderer.draw_frame(sample.rect, dest, self.cat.angle, sample.flip);
        renderer.present();
    }
}

/// Fixed-rate tick pacing.
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    interval: Duration,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left to wait after a tick that took `elapsed`.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed)
    }

    /// When the tick after one that started at `frame_start` is due.
    pub fn next_deadline(&self, frame_start: Instant) -> Instant {
        frame_start + self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat::animation::{Action, FrameRect};

    #[derive(Debug, PartialEq)]
    enum Call {
        Clear(u32),
        Draw {
            src: FrameRect,
            dest: DestRect,
            angle: f32,
            flip: bool,
        },
        Present,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl SpriteRenderer for Recorder {
        fn clear(&mut self, rgb: u32) {
            self.calls.push(Call::Clear(rgb));
        }

        fn draw_frame(&mut self, src: FrameRect, dest: DestRect, angle: f32, flip: bool) {
            self.calls.push(Call::Draw {
                src,
                dest,
                angle,
                flip,
            });
        }

        fn present(&mut self) {
            self.calls.push(Call::Present);
        }
    }

    fn session() -> Session {
        Session::new(Cat::new(400, 1300, 4, 8.0), Viewport::new(600, 400))
    }

    #[test]
    fn lifecycle_transitions() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::NotStarted);
        s.start();
        assert!(s.is_running());
        s.stop();
        assert_eq!(s.state(), SessionState::Stopped);
        s.start();
        assert_eq!(s.state(), SessionState::Stopped, "stopped is terminal");
    }

    #[test]
    fn escape_press_stops() {
        let mut s = session();
        s.start();
        s.handle_key(Control::Quit, false);
        assert!(s.is_running());
        s.handle_key(Control::Quit, true);
        assert!(!s.is_running());
    }

    #[test]
    fn keys_set_levels() {
        let mut s = session();
        s.handle_key(Control::Left, true);
        s.handle_key(Control::Jump, true);
        s.handle_key(Control::Jump, false);
        assert!(s.input().left);
        assert!(!s.input().jump);
    }

    #[test]
    fn ticks_only_while_running() {
        let mut s = session();
        let now = Instant::now();
        s.tick(now);
        assert_eq!(s.tick_count(), 0);
        assert_eq!(s.cat().pos.y, 150);

        s.start();
        s.tick(now);
        assert_eq!(s.tick_count(), 1);
        assert_eq!(s.cat().pos.y, 151, "gravity pulled the cat down");

        s.stop();
        s.tick(now);
        assert_eq!(s.tick_count(), 1);
    }

    #[test]
    fn draw_emits_clear_blit_present() {
        let mut s = session();
        let mut recorder = Recorder::default();
        s.draw(&mut recorder);
        s.draw(&mut recorder);

        assert_eq!(recorder.calls.len(), 6);
        assert_eq!(recorder.calls[0], Call::Clear(BACKGROUND_COLOR));
        assert_eq!(
            recorder.calls[1],
            Call::Draw {
                src: FrameRect { x: 100, y: 0, w: 100, h: 100 },
                dest: DestRect { x: 100, y: 150, w: 25, h: 25 },
                angle: 0.0,
                flip: true,
            }
        );
        assert_eq!(recorder.calls[2], Call::Present);

        // Second draw samples the next sitting frame.
        let Call::Draw { src, .. } = &recorder.calls[4] else {
            panic!("expected a draw, got {:?}", recorder.calls[4]);
        };
        assert_eq!((src.x, src.y), (100, 100));
        assert_eq!(s.cat().anim.action, Action::Sitting);
    }

    #[test]
    fn wall_contact_switches_background() {
        let mut s = session();
        s.start();
        s.handle_key(Control::Left, true);
        let now = Instant::now();
        // 1+2+...+8 = 36, then 8 per tick reaches x=0 on tick 16.
        // Tick 17 pushes into the wall.
        for _ in 0..17 {
            s.tick(now);
        }
        assert_eq!(s.cat().pos.x, 0);
        assert_eq!(s.background(), CRASH_COLOR);

        s.handle_key(Control::Left, false);
        for _ in 0..8 {
            s.tick(now);
        }
        assert_eq!(s.background(), BACKGROUND_COLOR);
    }

    #[test]
    fn pacer_waits_out_the_remainder() {
        let pacer = FramePacer::new(Duration::from_millis(33));
        assert_eq!(pacer.remaining(Duration::from_millis(10)), Duration::from_millis(23));
        assert_eq!(pacer.remaining(Duration::from_millis(50)), Duration::ZERO);

        let start = Instant::now();
        assert_eq!(pacer.next_deadline(start) - start, Duration::from_millis(33));
    }
}
