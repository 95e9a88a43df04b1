use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{debug, error, info, warn};

use crate::gpu::GpuState;
use crate::loader::{self, LoadOutcome, IMAGE_EXTENSIONS};
use crate::session::Session;
use crate::types::RendererConfig;

/// Everything the event loop needs between events.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    session: Session,
    proxy: EventLoopProxy<LoadOutcome>,
    title: String,
}

impl WindowState {
    fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        proxy: EventLoopProxy<LoadOutcome>,
    ) -> Result<Self> {
        let gpu = GpuState::new(window.clone(), config.gpu_power)?;
        let state = Self {
            window,
            gpu,
            session: Session::new(),
            proxy,
            title: config.title.clone(),
        };
        state.refresh_title();
        Ok(state)
    }

    fn refresh_title(&self) {
        self.window
            .set_title(&format!("{} - {}", self.title, self.session.describe()));
    }

    /// Starts decoding `path`, superseding any load still in flight.
    fn select(&mut self, path: PathBuf) {
        info!(path = %path.display(), "image selected");
        let ticket = self.session.select(path);
        let generation = ticket.generation;
        let proxy = self.proxy.clone();
        let spawned = loader::spawn_decode(ticket, move |outcome| {
            if proxy.send_event(outcome).is_err() {
                debug!("event loop closed before decode finished");
            }
        });
        if let Err(err) = spawned {
            error!(error = %err, "failed to start decode worker");
            self.session.accept_failure(generation, err.to_string());
        }
        self.refresh_title();
    }

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open image")
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file();
        match picked {
            Some(path) => self.select(path),
            None => debug!("file dialog dismissed"),
        }
    }

    fn handle_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Decoded { generation, image } => {
                if !self.session.accept_decoded(generation) {
                    debug!(generation, "dropping stale decode result");
                    return;
                }
                self.refresh_title();

                let viewport = image.viewport();
                let _ = self
                    .window
                    .request_inner_size(PhysicalSize::new(viewport.width, viewport.height));
                match self.gpu.render_image(&image) {
                    Ok(viewport) => self.session.finish_render(viewport),
                    Err(err) => {
                        error!(path = %image.path().display(), error = %err, "render failed");
                        self.session.fail_render(err.to_string());
                    }
                }
            }
            LoadOutcome::Failed { generation, error } => {
                let reason = error.to_string();
                if !self.session.accept_failure(generation, reason) {
                    debug!(generation, "dropping stale decode failure");
                    return;
                }
                error!(error = %error, "failed to load image");
            }
        }
        self.refresh_title();
    }

    fn handle_key(&mut self, event: &KeyEvent) -> KeyAction {
        if event.state != ElementState::Pressed || event.repeat {
            return KeyAction::None;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => KeyAction::Exit,
            Key::Character(value) if value.eq_ignore_ascii_case("o") => {
                self.open_dialog();
                KeyAction::None
            }
            _ => KeyAction::None,
        }
    }
}

enum KeyAction {
    None,
    Exit,
}

/// Opens the window and blocks until it is closed.
pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::<LoadOutcome>::with_user_event()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let (width, height) = config.placeholder_size;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config, proxy)
        .map_err(|err| anyhow!("failed to initialise renderer: {err:#}"))?;
    if let Some(path) = config.initial_image.clone() {
        state.select(path);
    }

    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop
        .run(move |event, elwt| match event {
            Event::UserEvent(outcome) => state.handle_outcome(outcome),
            Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::KeyboardInput { event, .. } => {
                        if let KeyAction::Exit = state.handle_key(&event) {
                            elwt.exit();
                        }
                    }
                    WindowEvent::DroppedFile(path) => state.select(path),
                    WindowEvent::Resized(_) => state.window.request_redraw(),
                    WindowEvent::ScaleFactorChanged {
                        mut inner_size_writer,
                        ..
                    } => {
                        if let Some(viewport) = state.gpu.viewport() {
                            let size = PhysicalSize::new(viewport.width, viewport.height);
                            let _ = inner_size_writer.request_inner_size(size);
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Err(err) = state.gpu.present() {
                            match err.as_surface_error() {
                                Some(wgpu::SurfaceError::OutOfMemory) => {
                                    error!("surface out of memory; exiting");
                                    elwt.exit();
                                }
                                Some(wgpu::SurfaceError::Timeout) => {
                                    warn!("surface timeout; retrying on next redraw");
                                }
                                _ => warn!(error = %err, "failed to present frame"),
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
