//! Airborne pose table: which strip and frame to pin while jumping or falling.
//! Grounded action resolution lives in `Cat::resolve_grounded`.

use super::animation::Action;

/// Running frame shown on the tick a jump starts.
pub const LAUNCH_FRAME: usize = 11;
/// Running frame while the jump key is held on the way up.
pub const RISING_FRAME: usize = 12;
/// Running frame once the jump key is let go mid-jump.
pub const RELEASED_FRAME: usize = 0;
/// Running frame when falling faster than half of max speed.
pub const FAST_FALL_FRAME: usize = 3;
/// Running frame at terminal velocity.
pub const TERMINAL_FALL_FRAME: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpPhase {
    /// No upward velocity this tick.
    None,
    /// Jump triggered this tick.
    Launch,
    /// Upward velocity, key held.
    Rising,
    /// Upward velocity, key released.
    Released,
}

impl JumpPhase {
    pub fn in_progress(self) -> bool {
        self != JumpPhase::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallSeverity {
    Gentle,
    Fast,
    Terminal,
}

impl FallSeverity {
    pub fn classify(down: f32, max_speed: f32) -> Self {
        if down >= max_speed {
            FallSeverity::Terminal
        } else if down > max_speed / 2.0 {
            FallSeverity::Fast
        } else {
            FallSeverity::Gentle
        }
    }
}

/// A pinned frame of a specific strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedPose {
    pub action: Action,
    pub frame: usize,
}

const fn running(frame: usize) -> Option<ForcedPose> {
    Some(ForcedPose {
        action: Action::Running,
        frame,
    })
}

/// Jump phase outranks fall severity. `None` leaves the animation untouched.
pub fn airborne_pose(jump: JumpPhase, falling: bool, fall: FallSeverity) -> Option<ForcedPose> {
    match (jump, falling, fall) {
        (JumpPhase::Launch, _, _) => running(LAUNCH_FRAME),
        (JumpPhase::Rising, _, _) => running(RISING_FRAME),
        (JumpPhase::Released, _, _) => running(RELEASED_FRAME),
        (JumpPhase::None, true, FallSeverity::Terminal) => running(TERMINAL_FALL_FRAME),
        (JumpPhase::None, true, FallSeverity::Fast) => running(FAST_FALL_FRAME),
        (JumpPhase::None, true, FallSeverity::Gentle) => None,
        (JumpPhase::None, false, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_thresholds() {
        assert_eq!(FallSeverity::classify(4.0, 8.0), FallSeverity::Gentle);
        assert_eq!(FallSeverity::classify(5.0, 8.0), FallSeverity::Fast);
        assert_eq!(FallSeverity::classify(8.0, 8.0), FallSeverity::Terminal);
    }

    #[test]
    fn jump_outranks_fall() {
        let pose = airborne_pose(JumpPhase::Rising, true, FallSeverity::Terminal);
        assert_eq!(pose.map(|p| p.frame), Some(RISING_FRAME));

        let pose = airborne_pose(JumpPhase::Launch, false, FallSeverity::Gentle);
        assert_eq!(pose.map(|p| p.frame), Some(LAUNCH_FRAME));
    }

    #[test]
    fn grounded_or_gentle_fall_leaves_animation_alone() {
        assert_eq!(airborne_pose(JumpPhase::None, false, FallSeverity::Terminal), None);
        assert_eq!(airborne_pose(JumpPhase::None, true, FallSeverity::Gentle), None);
    }

    #[test]
    fn forced_frames_exist_in_running_strip() {
        for frame in [
            LAUNCH_FRAME,
            RISING_FRAME,
            RELEASED_FRAME,
            FAST_FALL_FRAME,
            TERMINAL_FALL_FRAME,
        ] {
            assert!(frame < Action::Running.frame_count());
        }
    }
}
