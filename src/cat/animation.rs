use glam::IVec2;

/// Named animation strip. The discriminant is the sprite-sheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Action {
    Walking = 0,
    Sitting = 1,
    Transitioning = 2,
    Running = 3,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Walking,
        Action::Sitting,
        Action::Transitioning,
        Action::Running,
    ];

    /// Number of frames in this action's strip.
    pub fn frame_count(self) -> usize {
        match self {
            Action::Walking => 12,
            Action::Sitting => 6,
            Action::Transitioning => 12,
            Action::Running => 13,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Walking => "walking",
            Action::Sitting => "sitting",
            Action::Transitioning => "transitioning",
            Action::Running => "running",
        }
    }
}

/// Sheet grid: one column per action, one row per frame of the longest strip.
pub const SHEET_COLUMNS: i32 = 4;
pub const SHEET_ROWS: i32 = 13;

/// Top-left origin of one frame on the sprite sheet, in sheet pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub origin: IVec2,
}

/// Sub-rectangle of the sprite sheet, in sheet pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// What the renderer needs to blit the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSample {
    pub rect: FrameRect,
    /// Mirror horizontally (the sheet is drawn facing left).
    pub flip: bool,
}

/// Every action's frame strip, sliced from a sheet of known pixel size.
/// Built once; never mutated.
#[derive(Debug, Clone)]
pub struct AnimationFrames {
    strips: [Vec<Frame>; 4],
    frame_size: IVec2,
}

impl AnimationFrames {
    pub fn new(sheet_width: u32, sheet_height: u32) -> Self {
        let frame_size = IVec2::new(
            sheet_width as i32 / SHEET_COLUMNS,
            sheet_height as i32 / SHEET_ROWS,
        );
        let strips: [Vec<Frame>; 4] = Action::ALL.map(|action| {
            let col = action as i32;
            (0..action.frame_count() as i32)
                .map(|row| Frame {
                    origin: IVec2::new(col * frame_size.x, row * frame_size.y),
                })
                .collect()
        });
        Self { strips, frame_size }
    }

    pub fn frame_size(&self) -> IVec2 {
        self.frame_size
    }

    pub fn strip(&self, action: Action) -> &[Frame] {
        &self.strips[action as usize]
    }

    pub fn rect(&self, action: Action, index: usize) -> FrameRect {
        let origin = self.strip(action)[index].origin;
        FrameRect {
            x: origin.x,
            y: origin.y,
            w: self.frame_size.x,
            h: self.frame_size.y,
        }
    }
}

/// Action plus cursor into its strip. Advances once per draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub action: Action,
    pub frame: usize,
}

impl AnimationState {
    pub fn new(action: Action) -> Self {
        Self { action, frame: 0 }
    }

    /// Switch strips, restarting at frame 0 only on an actual change.
    /// Returns true if the action changed.
    pub fn switch_to(&mut self, action: Action) -> bool {
        if self.action == action {
            return false;
        }
        self.action = action;
        self.frame = 0;
        true
    }

    /// Pin a specific frame of `action`, regardless of the current strip.
    pub fn force(&mut self, action: Action, frame: usize) {
        debug_assert!(frame < action.frame_count());
        self.action = action;
        self.frame = frame;
    }

    /// Sitting holds on its penultimate frame instead of looping.
    pub fn is_held(&self) -> bool {
        self.action == Action::Sitting && self.frame == Action::Sitting.frame_count() - 2
    }

    pub fn advance(&mut self) {
        if self.is_held() {
            return;
        }
        self.frame += 1;
        if self.frame >= self.action.frame_count() {
            self.frame = 0;
        }
    }
}
