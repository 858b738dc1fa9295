use std::sync::Arc;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::cat::{Cat, Viewport};
use crate::config::Config;
use crate::debug::history::FpsLog;
use crate::debug::timer::Phase;
use crate::debug::{CatReadout, DebugOverlay};
use crate::error::StartupError;
use crate::input::{self, Control};
use crate::render::sheet::SpriteSheet;
use crate::render::{Canvas, GpuState};
use crate::session::{FramePacer, Session, SessionState};

/// Window size when no monitor reports one.
const FALLBACK_WINDOW_SIZE: PhysicalSize<u32> = PhysicalSize::new(800, 600);

/// Top-level application state.
struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    overlay: Option<DebugOverlay>,
    session: Option<Session>,

    // Fixed-rate ticks
    pacer: FramePacer,
    tick_started: Instant,
    tick_pending: bool,

    // Frame timing
    last_frame_time: Option<Instant>,
    fps_log: FpsLog,

    startup_error: Option<StartupError>,
}

impl App {
    fn new(config: Config) -> Self {
        let pacer = FramePacer::new(config.frame_interval());
        Self {
            config,
            window: None,
            gpu: None,
            overlay: None,
            session: None,
            pacer,
            tick_started: Instant::now(),
            tick_pending: false,
            last_frame_time: None,
            fps_log: FpsLog::new(),
            startup_error: None,
        }
    }

    /// Window, GPU, sprite sheet, cat. Any failure here ends the process.
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), StartupError> {
        let window_size = match event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
        {
            Some(monitor) => {
                let screen = monitor.size();
                PhysicalSize::new(
                    screen.width.saturating_sub(self.config.margin).max(1),
                    screen.height.saturating_sub(self.config.margin).max(1),
                )
            }
            None => {
                log::warn!("No monitor reported, using {FALLBACK_WINDOW_SIZE:?}");
                FALLBACK_WINDOW_SIZE
            }
        };

        let attrs = WindowAttributes::default()
            .with_title("catwalk")
            .with_inner_size(window_size);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let mut gpu = GpuState::new(window.clone())?;
        log::info!("wgpu + sprite pipeline initialized");

        let sheet = SpriteSheet::load(&self.config.sprite)?;
        gpu.upload_sprite_sheet(&sheet)?;

        let cat = Cat::new(
            sheet.width,
            sheet.height,
            self.config.display_scale(),
            self.config.max_speed,
        );
        let mut session = Session::new(cat, Viewport::new(size.width, size.height));
        session.start();

        self.overlay = Some(DebugOverlay::new(&window, &gpu, self.pacer.interval()));
        self.gpu = Some(gpu);
        self.session = Some(session);
        self.window = Some(window);

        log::info!("Ticking every {:?}", self.pacer.interval());
        self.tick_started = Instant::now();
        self.tick_pending = true;
        Ok(())
    }

    fn on_key(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        let pressed = state == ElementState::Pressed;

        if code == KeyCode::F12 {
            if let Some(overlay) = &mut self.overlay {
                if overlay.poll_toggle(pressed) {
                    log::debug!("Debug overlay {}", if overlay.visible { "shown" } else { "hidden" });
                }
            }
            return;
        }
        if repeat {
            return;
        }

        let Some(session) = &mut self.session else {
            return;
        };
        if let Some(control) = input::map_key(code) {
            session.handle_key(control, pressed);
        }
    }

    /// One tick (if due) followed by one draw.
    fn frame(&mut self, now: Instant) {
        let (Some(window), Some(gpu), Some(session)) =
            (&self.window, &mut self.gpu, &mut self.session)
        else {
            return;
        };

        let paused = self.overlay.as_ref().is_some_and(|o| o.paused);
        if let Some(overlay) = &mut self.overlay {
            overlay.timers.begin();
        }
        if std::mem::take(&mut self.tick_pending) && !paused {
            session.tick(now);
        }
        if let Some(overlay) = &mut self.overlay {
            overlay.timers.end(Phase::Update);
            overlay.tick_count = session.tick_count();
            overlay.cat = CatReadout::capture(session.cat(), session.input());
            overlay.timers.begin();
        }

        {
            let overlay = self.overlay.as_mut().map(|o| (o, window.as_ref()));
            let mut canvas = Canvas::new(gpu, overlay);
            session.draw(&mut canvas);
        }

        if let Some(overlay) = &mut self.overlay {
            overlay.timers.end(Phase::Render);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.startup_error.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("Startup failed: {e}");
            self.startup_error = Some(e);
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            self.pacer.next_deadline(self.tick_started),
        ));
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = &self.session else {
            return;
        };
        if session.state() == SessionState::Stopped {
            event_loop.exit();
            return;
        }

        let wait = self.pacer.remaining(self.tick_started.elapsed());
        if wait.is_zero() {
            self.tick_started = Instant::now();
            self.tick_pending = true;
            if let Some(w) = &self.window {
                w.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            self.pacer.next_deadline(self.tick_started),
        ));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // egui sees everything first; a focused widget swallows key presses.
        let egui_consumed = match (&self.window, &mut self.overlay) {
            (Some(window), Some(overlay)) => {
                let consumed = overlay.on_window_event(window, &event);
                overlay.visible && consumed
            }
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                if let Some(session) = &mut self.session {
                    session.handle_key(Control::Quit, true);
                }
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event: key, .. } => {
                let PhysicalKey::Code(code) = key.physical_key else {
                    return;
                };
                if egui_consumed && key.state == ElementState::Pressed && code != KeyCode::F12 {
                    return;
                }
                self.on_key(code, key.state, key.repeat);
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                if let Some(session) = &mut self.session {
                    session.set_viewport(Viewport::new(new_size.width, new_size.height));
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if let Some(last) = self.last_frame_time {
                    let dt = now.duration_since(last).as_secs_f64();
                    self.fps_log.record(dt);
                    if let Some(overlay) = &mut self.overlay {
                        overlay.record_frame(dt);
                    }
                }
                self.last_frame_time = Some(now);

                self.frame(now);
            }
            _ => {}
        }
    }
}

/// Create the event loop and run until the session stops.
pub fn run(config: Config) -> Result<(), StartupError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => {
            log::info!("Exited cleanly after {} frames", app.fps_log.frame_count());
            Ok(())
        }
    }
}
