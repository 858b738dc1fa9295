pub mod history;
pub mod timer;

use std::time::Duration;

use winit::window::Window;

use self::history::{FrameHistory, FrameTimeStats};
use self::timer::{Phase, PhaseTimers};
use crate::cat::{Cat, Facing};
use crate::input::InputState;
use crate::render::GpuState;

/// Number of frame times to keep in the histogram.
const FRAME_HISTORY_LEN: usize = 300;

/// Live readout of the cat, copied out each frame.
#[derive(Debug, Clone, Default)]
pub struct CatReadout {
    pub pos: (i32, i32),
    pub velocity: [f32; 4],
    pub max_speed: f32,
    pub action: &'static str,
    pub frame: usize,
    pub facing: &'static str,
    pub angle: f32,
    pub falling: bool,
    pub input: InputState,
}

impl CatReadout {
    pub fn capture(cat: &Cat, input: InputState) -> Self {
        let v = cat.velocity;
        Self {
            pos: (cat.pos.x, cat.pos.y),
            velocity: [v.up, v.down, v.left, v.right],
            max_speed: cat.max_speed(),
            action: cat.anim.action.label(),
            frame: cat.anim.frame,
            facing: match cat.facing {
                Facing::Left => "left",
                Facing::Right => "right",
            },
            angle: cat.angle,
            falling: cat.is_falling(),
            input,
        }
    }
}

/// Debug overlay powered by egui.
pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,

    pub visible: bool,
    f12_was_down: bool,

    /// Rolling window of frame times (seconds).
    pub frame_times: FrameHistory,
    pub stats: FrameTimeStats,

    /// Per-phase timers (updated by the app each tick).
    pub timers: PhaseTimers,

    /// UI controls.
    pub paused: bool,

    pub tick_count: u64,
    pub cat: CatReadout,

    /// Tick interval in seconds; drawn as the histogram budget line.
    frame_budget: f64,
}

impl DebugOverlay {
    pub fn new(window: &Window, gpu: &GpuState, tick_interval: Duration) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            visible: false,
            f12_was_down: false,
            frame_times: FrameHistory::new(FRAME_HISTORY_LEN),
            stats: FrameTimeStats::default(),
            timers: PhaseTimers::new(),
            paused: false,
            tick_count: 0,
            cat: CatReadout::default(),
            frame_budget: tick_interval.as_secs_f64(),
        }
    }

    pub fn record_frame(&mut self, dt: f64) {
        self.frame_times.push(dt);
        self.stats = self.frame_times.stats();
    }

    /// Handle F12 toggle. Returns true if visibility changed.
    pub fn poll_toggle(&mut self, f12_down: bool) -> bool {
        // Edge-detect: trigger on press, not hold.
        if f12_down && !self.f12_was_down {
            self.f12_was_down = true;
            self.visible = !self.visible;
            return true;
        }
        if !f12_down {
            self.f12_was_down = false;
        }
        false
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    /// Run the egui frame and produce paint output.
    /// Returns (clipped_primitives, textures_delta, screen_descriptor).
    pub fn run_frame(
        &mut self,
        window: &Window,
        screen_w: u32,
        screen_h: u32,
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let ui_state = UiSnapshot {
            visible: self.visible,
            stats: self.stats,
            frame_times: self.frame_times.iter().collect(),
            samples: self.frame_times.len(),
            frame_budget: self.frame_budget,
            phase_durations: self.timers.durations_us,
            phase_total: self.timers.total_us(),
            tick_count: self.tick_count,
            cat: self.cat.clone(),
        };

        // Written back after run().
        let mut paused = self.paused;

        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            draw_ui(ctx, &ui_state, &mut paused);
        });

        if paused != self.paused {
            log::info!("Simulation {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_w, screen_h],
            pixels_per_point,
        };

        (clipped_primitives, full_output.textures_delta, screen_descriptor)
    }

    /// Upload egui textures and buffers. Call before the egui render pass.
    pub fn prepare_egui(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    pub fn render_egui(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// UI snapshot + free-function draw (avoids borrow conflicts with egui_ctx)
// ---------------------------------------------------------------------------

struct UiSnapshot {
    visible: bool,
    stats: FrameTimeStats,
    frame_times: Vec<f64>,
    samples: usize,
    frame_budget: f64,
    phase_durations: [f64; 2],
    phase_total: f64,
    tick_count: u64,
    cat: CatReadout,
}

fn draw_ui(ctx: &egui::Context, s: &UiSnapshot, paused: &mut bool) {
    if !s.visible {
        return;
    }

    let panel_frame = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220))
        .corner_radius(6.0)
        .inner_margin(10.0);

    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .default_width(300.0)
        .resizable(true)
        .frame(panel_frame)
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            // --- Performance ---
            ui.heading("Performance");
            ui.label(format!("FPS: {:.1}", s.stats.fps));
            ui.label(format!(
                "Frame: {:.2}ms avg | {:.2} min | {:.2} max ({} frames)",
                s.stats.avg * 1000.0,
                s.stats.min * 1000.0,
                s.stats.max * 1000.0,
                s.samples,
            ));
            frame_time_histogram(ui, &s.frame_times, s.frame_budget);
            ui.add_space(4.0);

            for phase in Phase::ALL {
                ui.label(
                    egui::RichText::new(format!(
                        "{:<8}{:>6.0}us",
                        phase.label(),
                        s.phase_durations[phase as usize]
                    ))
                    .monospace(),
                );
            }
            ui.label(egui::RichText::new(format!("{:<8}{:>6.0}us", "total", s.phase_total)).monospace());
            ui.add_space(4.0);

            // --- Cat ---
            ui.heading("Cat");
            let c = &s.cat;
            ui.label(format!("Pos: ({}, {})  facing {}", c.pos.0, c.pos.1, c.facing));
            ui.label(format!(
                "Vel: up {:.2} down {:.2} left {:.0} right {:.0} (max {:.0})",
                c.velocity[0], c.velocity[1], c.velocity[2], c.velocity[3], c.max_speed,
            ));
            ui.label(format!("Action: {} #{}", c.action, c.frame));
            ui.label(format!(
                "Angle: {:.1}  {}",
                c.angle,
                if c.falling { "falling" } else { "grounded" }
            ));
            let i = c.input;
            ui.label(
                egui::RichText::new(format!(
                    "Keys: {}{}{}{}{}",
                    if i.up { "U" } else { "." },
                    if i.down { "D" } else { "." },
                    if i.left { "L" } else { "." },
                    if i.right { "R" } else { "." },
                    if i.jump { "J" } else { "." },
                ))
                .monospace(),
            );
            ui.add_space(4.0);

            // --- Controls ---
            ui.heading("Controls");
            ui.checkbox(paused, "Pause Simulation");
            ui.label(format!("Ticks: {}", s.tick_count));
            ui.label("Arrows: Move | Space: Jump | F12: Toggle | ESC: Quit");
        });
}

/// Histogram top: the slowest frame, but never below 1.5x the budget.
fn histogram_ceiling(frame_times: &[f64], budget: f64) -> f64 {
    frame_times
        .iter()
        .copied()
        .fold(0.0f64, f64::max)
        .max(budget * 1.5)
}

fn frame_time_histogram(ui: &mut egui::Ui, frame_times: &[f64], budget: f64) {
    if frame_times.is_empty() || budget <= 0.0 {
        return;
    }
    let max_time = histogram_ceiling(frame_times, budget);

    let (response, painter) = ui.allocate_painter(egui::vec2(280.0, 50.0), egui::Sense::hover());
    let rect = response.rect;
    let bar_width = rect.width() / frame_times.len() as f32;
    let target_y = rect.bottom() - (budget / max_time) as f32 * rect.height();

    for (i, &t) in frame_times.iter().enumerate() {
        let h = (t / max_time) as f32 * rect.height();
        let x = rect.left() + i as f32 * bar_width;
        let color = if t > budget * 1.1 {
            egui::Color32::from_rgb(255, 100, 80)
        } else {
            egui::Color32::from_rgb(80, 200, 120)
        };
        painter.rect_filled(
            egui::Rect::from_min_max(
                egui::pos2(x, rect.bottom() - h),
                egui::pos2(x + bar_width, rect.bottom()),
            ),
            0.0,
            color,
        );
    }

    painter.line_segment(
        [
            egui::pos2(rect.left(), target_y),
            egui::pos2(rect.right(), target_y),
        ],
        egui::Stroke::new(1.0, egui::Color32::from_rgb(255, 255, 100)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readout_reflects_cat() {
        let mut cat = Cat::new(400, 1300, 4, 8.0);
        cat.facing = Facing::Left;
        cat.velocity.left = 3.0;
        let input = InputState {
            left: true,
            ..Default::default()
        };

        let r = CatReadout::capture(&cat, input);
        assert_eq!(r.pos, (100, 150));
        assert_eq!(r.velocity, [0.0, 0.0, 3.0, 0.0]);
        assert_eq!(r.action, "sitting");
        assert_eq!(r.facing, "left");
        assert!(r.input.left);
        assert_eq!(r.max_speed, 8.0);
    }

    #[test]
    fn histogram_ceiling_tracks_tick_budget() {
        let budget_60 = 1.0 / 60.0;
        assert!((histogram_ceiling(&[0.001], budget_60) - budget_60 * 1.5).abs() < 1e-12);
        assert!((histogram_ceiling(&[0.001], 1.0 / 30.0) - 0.05).abs() < 1e-12);
        assert_eq!(histogram_ceiling(&[0.2, 0.01], budget_60), 0.2);
    }
}
