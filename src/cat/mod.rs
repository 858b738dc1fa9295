pub mod animation;
pub mod policy;

use std::time::Duration;

use glam::IVec2;
use instant::Instant;

use crate::input::InputState;
use self::animation::{Action, AnimationFrames, AnimationState, FrameSample};
use self::policy::{FallSeverity, JumpPhase};

/// Spawn point in screen pixels.
pub const START_POS: IVec2 = IVec2::new(100, 150);
/// Minimum time between jump starts.
pub const JUMP_COOLDOWN: Duration = Duration::from_millis(250);
/// Downward speed gained per tick.
const GRAVITY: f32 = 1.0;
/// Jump impulse as a multiple of max speed.
const JUMP_IMPULSE: f32 = 2.0;
/// Upward speed lost per tick while the jump key is held.
const RISE_DECAY: f32 = 0.06;
/// Upward speed is divided by this every airborne tick.
const JUMP_DAMPING: f32 = 1.2;
/// Floor line sits this fraction of a sheet frame above the viewport bottom.
const FLOOR_DIVISOR: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

/// Per-direction speed magnitudes, all non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub up: f32,
    pub down: f32,
    pub left: f32,
    pub right: f32,
}

/// Area the cat must stay inside, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
        }
    }
}

/// The player-controlled cat: pose, velocity and animation cursor.
#[derive(Debug, Clone)]
pub struct Cat {
    /// Top-left corner on screen.
    pub pos: IVec2,
    /// On-screen size (sheet frame size / display scale).
    pub size: IVec2,
    /// Tilt in degrees, clockwise. Zero unless falling.
    pub angle: f32,
    pub facing: Facing,
    pub velocity: Velocity,
    pub anim: AnimationState,
    frames: AnimationFrames,
    max_speed: f32,
    jumped_at: Option<Instant>,
    falling: bool,
    touching_wall: bool,
}

impl Cat {
    pub fn new(sheet_width: u32, sheet_height: u32, display_scale: i32, max_speed: f32) -> Self {
        let frames = AnimationFrames::new(sheet_width, sheet_height);
        let size = frames.frame_size() / display_scale.max(1);
        Self {
            pos: START_POS,
            size,
            angle: 0.0,
            facing: Facing::Right,
            velocity: Velocity::default(),
            anim: AnimationState::new(Action::Sitting),
            frames,
            max_speed,
            jumped_at: None,
            falling: false,
            touching_wall: false,
        }
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn is_falling(&self) -> bool {
        self.falling
    }

    /// Whether the last update pushed the cat into a side wall.
    pub fn touching_wall(&self) -> bool {
        self.touching_wall
    }

    /// Distance from the viewport bottom to the lowest allowed `pos.y`.
    pub fn floor_offset(&self) -> i32 {
        self.frames.frame_size().y / FLOOR_DIVISOR
    }

    /// Lowest allowed `pos.y` for `viewport`.
    pub fn floor_line(&self, viewport: Viewport) -> i32 {
        (viewport.height - self.floor_offset()).max(0)
    }

    fn jump_ready(&self, now: Instant) -> bool {
        self.jumped_at
            .is_none_or(|last| now.saturating_duration_since(last) >= JUMP_COOLDOWN)
    }

    /// Advance one tick: gravity, jump, horizontal motion, facing, tilt and
    /// action selection.
    pub fn update(&mut self, input: InputState, viewport: Viewport, now: Instant) {
        let up_held = input.up || input.jump;
        let max = self.max_speed;
        let floor_y = self.floor_line(viewport);

        // Gravity
        self.velocity.down = (self.velocity.down + GRAVITY).min(max);

        let grounded = self.pos.y + self.floor_offset() >= viewport.height - 1;
        if grounded {
            self.velocity.down = 0.0;
            self.pos.y = floor_y;
        } else {
            self.pos.y = (self.pos.y + self.velocity.down.floor() as i32).min(floor_y);
        }
        self.falling = !grounded;
        let fall = FallSeverity::classify(self.velocity.down, max);

        // Jump
        let mut jump = JumpPhase::None;
        if grounded && up_held && self.jump_ready(now) {
            self.jumped_at = Some(now);
            self.velocity.up += JUMP_IMPULSE * max;
            jump = JumpPhase::Launch;
            log::debug!("jump at ({}, {})", self.pos.x, self.pos.y);
        }
        if self.velocity.up > 0.0 {
            if up_held {
                self.velocity.up -= RISE_DECAY;
                if jump == JumpPhase::None {
                    jump = JumpPhase::Rising;
                }
            } else {
                self.velocity.up -= self.velocity.down;
                jump = JumpPhase::Released;
            }
            self.velocity.up /= JUMP_DAMPING;
            self.pos.y = (self.pos.y - self.velocity.up.floor() as i32).clamp(0, floor_y);
            self.velocity.up = self.velocity.up.max(0.0);
        }

        self.step_horizontal(input, viewport);

        if self.velocity.left > self.velocity.right {
            self.facing = Facing::Left;
        } else if self.velocity.right > self.velocity.left {
            self.facing = Facing::Right;
        }

        if let Some(pose) = policy::airborne_pose(jump, self.falling, fall) {
            self.anim.force(pose.action, pose.frame);
        }

        if self.falling {
            let tilt = (self.velocity.up - self.velocity.down) * 2.0;
            self.angle = match self.facing {
                Facing::Left => tilt,
                Facing::Right => -tilt,
            };
            return;
        }
        self.angle = 0.0;

        if jump.in_progress() {
            return;
        }
        self.resolve_grounded();
    }

    /// Accelerate or coast each horizontal direction, then integrate with
    /// a clamp after each direction.
    fn step_horizontal(&mut self, input: InputState, viewport: Viewport) {
        let max = self.max_speed;
        let max_x = (viewport.width - self.size.x).max(0);
        self.touching_wall = false;

        self.velocity.left = accelerate(self.velocity.left, input.left, max);
        let x = self.pos.x - self.velocity.left.floor() as i32;
        if x < 0 {
            self.touching_wall = true;
        }
        self.pos.x = x.clamp(0, max_x);

        self.velocity.right = accelerate(self.velocity.right, input.right, max);
        let x = self.pos.x + self.velocity.right.floor() as i32;
        if x > max_x {
            self.touching_wall = true;
        }
        self.pos.x = x.clamp(0, max_x);
    }

    fn resolve_grounded(&mut self) {
        let v = self.velocity;
        let action = if v.left == self.max_speed || v.right == self.max_speed {
            Action::Running
        } else if v.left != v.right {
            Action::Walking
        } else {
            Action::Sitting
        };
        if self.anim.switch_to(action) {
            log::debug!("cat is now {}", action.label());
        }
    }

    /// Current frame without advancing the cursor.
    pub fn frame(&self) -> FrameSample {
        FrameSample {
            rect: self.frames.rect(self.anim.action, self.anim.frame),
            flip: self.facing == Facing::Right,
        }
    }

    /// Frame to draw now; moves the cursor on. Call exactly once per draw.
    pub fn sample_frame(&mut self) -> FrameSample {
        let sample = self.frame();
        self.anim.advance();
        sample
    }
}

/// One tick of speed change along a single direction.
fn accelerate(speed: f32, held: bool, max: f32) -> f32 {
    if held {
        (speed + 1.0).min(max)
    } else {
        (speed - 1.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::policy::{
        FAST_FALL_FRAME, LAUNCH_FRAME, RELEASED_FRAME, RISING_FRAME, TERMINAL_FALL_FRAME,
    };
    use super::*;

    const VIEW: Viewport = Viewport {
        width: 600,
        height: 400,
    };
    const TICK: Duration = Duration::from_millis(33);

    /// 400x1300 sheet: 100x100 frames, 25x25 on screen, floor at y=375.
    fn cat_on_floor(x: i32) -> Cat {
        let mut cat = Cat::new(400, 1300, 4, 8.0);
        cat.pos = IVec2::new(x, cat.floor_line(VIEW));
        cat
    }

    fn held(f: impl FnOnce(&mut InputState)) -> InputState {
        let mut input = InputState::default();
        f(&mut input);
        input
    }

    fn assert_invariants(cat: &Cat) {
        let v = cat.velocity;
        let max = cat.max_speed();
        for speed in [v.down, v.left, v.right] {
            assert!((0.0..=max).contains(&speed), "speed {speed} out of range");
        }
        assert!(v.up >= 0.0);
        assert!((0..=VIEW.width - cat.size.x).contains(&cat.pos.x));
        assert!((0..=cat.floor_line(VIEW)).contains(&cat.pos.y));
        assert!(cat.anim.frame < cat.anim.action.frame_count());
    }

    #[test]
    fn holding_right_ramps_to_running() {
        let mut cat = cat_on_floor(100);
        let right = held(|i| i.right = true);
        let mut now = Instant::now();
        let mut expected_x = 100;

        for tick in 1..=8 {
            cat.update(right, VIEW, now);
            now += TICK;
            expected_x += tick;
            assert_eq!(cat.velocity.right, tick as f32);
            assert_eq!(cat.pos.x, expected_x);
            let want = if tick == 8 { Action::Running } else { Action::Walking };
            assert_eq!(cat.anim.action, want, "tick {tick}");
        }
        assert_eq!(cat.pos.x, 136);

        cat.update(right, VIEW, now);
        assert_eq!(cat.velocity.right, 8.0);
        assert_eq!(cat.facing, Facing::Right);
    }

    #[test]
    fn horizontal_motion_is_symmetric() {
        let max_x = VIEW.width - 25;
        let start = 130;
        let mut right = cat_on_floor(start);
        let mut left = cat_on_floor(max_x - start);
        let now = Instant::now();

        for k in 0..12 {
            right.update(held(|i| i.right = true), VIEW, now);
            left.update(held(|i| i.left = true), VIEW, now);
            assert_eq!(right.pos.x - start, (max_x - start) - left.pos.x, "tick {k}");
        }
        assert_eq!(left.facing, Facing::Left);
        assert_eq!(right.facing, Facing::Right);
    }

    #[test]
    fn released_keys_coast_to_a_stop() {
        let mut cat = cat_on_floor(100);
        let now = Instant::now();
        for _ in 0..3 {
            cat.update(held(|i| i.left = true), VIEW, now);
        }
        assert_eq!(cat.pos.x, 94);

        // 2 + 1 + 0 more pixels while decelerating.
        for _ in 0..3 {
            cat.update(InputState::default(), VIEW, now);
        }
        assert_eq!(cat.velocity.left, 0.0);
        assert_eq!(cat.pos.x, 91);
        assert_eq!(cat.facing, Facing::Left, "facing is sticky at rest");
        assert_eq!(cat.anim.action, Action::Sitting);
    }

    #[test]
    fn side_walls_clamp_and_flag_contact() {
        let mut cat = cat_on_floor(2);
        cat.update(held(|i| i.left = true), VIEW, Instant::now());
        assert_eq!(cat.pos.x, 1);
        assert!(!cat.touching_wall());
        cat.update(held(|i| i.left = true), VIEW, Instant::now());
        assert_eq!(cat.pos.x, 0);
        assert!(cat.touching_wall());
    }

    #[test]
    fn idle_cat_sits_and_holds_pose() {
        let mut cat = cat_on_floor(100);
        let now = Instant::now();
        for _ in 0..30 {
            cat.update(InputState::default(), VIEW, now);
            cat.sample_frame();
        }
        assert_eq!(cat.anim.action, Action::Sitting);
        assert_eq!(cat.anim.frame, Action::Sitting.frame_count() - 2);
        assert_eq!(cat.pos, IVec2::new(100, 375));
        assert_eq!(cat.angle, 0.0);
    }

    #[test]
    fn jump_launches_with_impulse() {
        let mut cat = cat_on_floor(100);
        cat.update(held(|i| i.jump = true), VIEW, Instant::now());

        let expected_up = (2.0 * 8.0 - 0.06) / 1.2;
        assert!((cat.velocity.up - expected_up).abs() < 1e-4);
        assert_eq!(cat.pos.y, 375 - expected_up.floor() as i32);
        assert_eq!(cat.anim.action, Action::Running);
        assert_eq!(cat.anim.frame, LAUNCH_FRAME);
    }

    #[test]
    fn held_jump_rises_then_lands_sitting() {
        let mut cat = cat_on_floor(100);
        let jump = held(|i| i.jump = true);
        // Clock stays put while held so the cooldown never allows a relaunch.
        let mut now = Instant::now();

        cat.update(jump, VIEW, now);
        let mut prev_up = cat.velocity.up;
        let mut peak = cat.pos.y;
        let mut ticks = 0;
        while cat.velocity.up > 0.0 {
            cat.update(jump, VIEW, now);
            assert!(cat.velocity.up < prev_up);
            if cat.velocity.up > 0.0 {
                assert_eq!(cat.anim.frame, RISING_FRAME);
            }
            prev_up = cat.velocity.up;
            peak = peak.min(cat.pos.y);
            assert_invariants(&cat);
            ticks += 1;
            assert!(ticks < 100, "jump never decayed");
        }
        assert!(peak < 350, "peak {peak}");

        for _ in 0..100 {
            now += TICK;
            cat.update(InputState::default(), VIEW, now);
            assert_invariants(&cat);
            if !cat.is_falling() {
                break;
            }
        }
        assert!(!cat.is_falling());
        assert_eq!(cat.pos.y, 375);
        assert_eq!(cat.angle, 0.0);
        assert_eq!(cat.anim.action, Action::Sitting);
    }

    #[test]
    fn releasing_jump_mid_air_cuts_the_rise() {
        let mut cat = cat_on_floor(100);
        let jump = held(|i| i.jump = true);
        let mut now = Instant::now();

        cat.update(jump, VIEW, now);
        cat.update(jump, VIEW, now);
        let up_before = cat.velocity.up;
        assert!(cat.is_falling());

        cat.update(InputState::default(), VIEW, now);
        let held_decay = (up_before - RISE_DECAY) / JUMP_DAMPING;
        assert!(cat.velocity.up < held_decay, "up {} vs held {held_decay}", cat.velocity.up);
        assert!((cat.velocity.up - (up_before - cat.velocity.down) / JUMP_DAMPING).abs() < 1e-4);
        assert_eq!((cat.anim.action, cat.anim.frame), (Action::Running, RELEASED_FRAME));

        for _ in 0..100 {
            now += TICK;
            cat.update(InputState::default(), VIEW, now);
            assert_invariants(&cat);
            if !cat.is_falling() {
                break;
            }
        }
        assert!(!cat.is_falling());
        assert_eq!(cat.pos.y, 375);
        assert_eq!(cat.anim.action, Action::Sitting);
    }

    #[test]
    fn jumps_respect_cooldown() {
        let jump = held(|i| i.jump = true);
        let t0 = Instant::now();
        let mut cat = cat_on_floor(100);
        cat.update(jump, VIEW, t0);
        assert!(cat.velocity.up > 0.0);

        // Put it back on the floor and try again too soon.
        cat.velocity = Velocity::default();
        cat.pos.y = 375;
        cat.update(jump, VIEW, t0 + Duration::from_millis(100));
        assert_eq!(cat.velocity.up, 0.0);
        assert_eq!(cat.pos.y, 375);

        cat.update(jump, VIEW, t0 + JUMP_COOLDOWN);
        assert!(cat.velocity.up > 0.0);
    }

    #[test]
    fn up_key_also_jumps() {
        let mut cat = cat_on_floor(100);
        cat.update(held(|i| i.up = true), VIEW, Instant::now());
        assert!(cat.velocity.up > 0.0);
    }

    #[test]
    fn falling_forces_fall_frames_and_tilts() {
        let mut cat = Cat::new(400, 1300, 4, 8.0);
        cat.pos = IVec2::new(100, 0);
        let now = Instant::now();

        for _ in 0..5 {
            cat.update(InputState::default(), VIEW, now);
        }
        assert!(cat.is_falling());
        assert_eq!(cat.velocity.down, 5.0);
        assert_eq!((cat.anim.action, cat.anim.frame), (Action::Running, FAST_FALL_FRAME));

        for _ in 0..3 {
            cat.update(InputState::default(), VIEW, now);
        }
        assert_eq!(cat.velocity.down, 8.0);
        assert_eq!(cat.anim.frame, TERMINAL_FALL_FRAME);
        assert_eq!(cat.pos.y, 36);
        // Facing right mirrors the tilt.
        assert_eq!(cat.angle, 16.0);
    }

    #[test]
    fn sample_frame_advances_and_flips() {
        let mut cat = cat_on_floor(100);
        cat.anim.switch_to(Action::Walking);
        let first = cat.sample_frame();
        assert_eq!(first.rect.x, 0);
        assert_eq!(first.rect.y, 0);
        assert!(first.flip);
        assert_eq!(cat.frame().rect.y, 100);

        for _ in 1..Action::Walking.frame_count() {
            cat.sample_frame();
        }
        assert_eq!(cat.anim.frame, 0);
    }

    #[test]
    fn random_input_keeps_invariants() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut cat = Cat::new(400, 1300, 4, 8.0);
        let mut now = Instant::now();
        for _ in 0..5_000 {
            let input = InputState {
                up: rng.u8(0..8) == 0,
                down: rng.bool(),
                left: rng.bool(),
                right: rng.bool(),
                jump: rng.u8(0..6) == 0,
            };
            now += TICK;
            cat.update(input, VIEW, now);
            if rng.bool() {
                cat.sample_frame();
            }
            assert_invariants(&cat);
        }
    }

    #[test]
    fn tiny_viewport_pins_cat_to_origin() {
        let mut cat = Cat::new(400, 1300, 4, 8.0);
        let tiny = Viewport { width: 10, height: 10 };
        cat.update(held(|i| i.right = true), tiny, Instant::now());
        assert_eq!(cat.pos, IVec2::ZERO);
    }
}
