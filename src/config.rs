use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line settings. Everything has a default, so `catwalk` alone runs.
#[derive(Debug, Clone, Parser)]
#[command(name = "catwalk")]
#[command(about = "A keyboard-driven sprite cat. Arrows move, Space jumps, Esc quits, F12 debug.")]
pub struct Config {
    /// Sprite sheet PNG: 4 action columns by 13 frame rows.
    #[arg(long = "sprite", default_value = "assets/cat.png")]
    pub sprite: PathBuf,

    /// Simulation and draw rate in ticks per second.
    #[arg(long = "fps", default_value_t = 30)]
    pub fps: u32,

    /// Sheet frames are drawn at 1/scale of their pixel size.
    #[arg(long = "scale", default_value_t = 4)]
    pub scale: i32,

    /// Cap on horizontal and falling speed, in pixels per tick.
    #[arg(long = "max-speed", default_value_t = 8.0, value_parser = parse_speed)]
    pub max_speed: f32,

    /// How much smaller than the primary display the window is, per axis.
    #[arg(long = "margin", default_value_t = 200)]
    pub margin: u32,
}

/// Speeds must be finite and positive.
fn parse_speed(raw: &str) -> Result<f32, String> {
    let speed: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("expected a positive speed, got {raw}"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_from(["catwalk"])
    }
}

impl Config {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn display_scale(&self) -> i32 {
        self.scale.max(1)
    }
}
