use anyhow::{anyhow, Result};
use std::ffi::CString;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use gl::types::*;
use glutin::{
    config::{ConfigTemplateBuilder, GlConfig},
    context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext},
    display::{GetGlDisplay, GlDisplay},
    prelude::{GlSurface, NotCurrentGlContext},
    surface::{Surface as GlutinSurface, SurfaceAttributesBuilder, WindowSurface},
};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use skia_safe::{
    gpu::{self, backend_render_targets, gl::FramebufferInfo, SurfaceOrigin},
    Color, ColorType, Image, Surface,
};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, ModifiersState, NamedKey},
    window::Window,
};

use sheetmark::config::Config;
use sheetmark::coords::{Point, SurfaceGeometry};
use sheetmark::document::{PageRaster, PageSource, PdfSheet};
use sheetmark::egui_integration::EguiIntegration;
use sheetmark::error::MarkingError;
use sheetmark::loader::SheetLoader;
use sheetmark::overlay::{page_image, OverlayRenderer};
use sheetmark::session::MarkingSession;
use sheetmark::tools::{PointerEvent, Tool};
use sheetmark::ui::{self, UiAction, UiState};

const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(50);
const PAGE_MARGIN: f64 = 12.0;

/// Ensures DirectContext drops before Window (prevents AMD GPU segfaults).
struct Env {
    surface: Surface,
    gl_surface: GlutinSurface<WindowSurface>,
    gr_context: gpu::DirectContext,
    gl_context: PossiblyCurrentContext,
    window: Window,
    fb_info: FramebufferInfo,
    num_samples: usize,
    stencil_size: usize,
}

impl Drop for Env {
    fn drop(&mut self) {
        self.gr_context.release_resources_and_abandon();
    }
}

struct App {
    // egui's painter must release its GL objects while the context is still alive
    egui: EguiIntegration,
    env: Env,
    config: Config,
    loader: Option<SheetLoader>,
    sheet: Option<PdfSheet>,
    session: Option<MarkingSession>,
    page_image: Option<Image>,
    overlay: OverlayRenderer,
    ui_state: UiState,
    geometry: Option<SurfaceGeometry>,
    cursor: Point,
    pressed: bool,
    modifiers: ModifiersState,
    repaint_at: Option<Instant>,
}

impl App {
    /// Move a finished load into a marking session, or surface why it failed.
    fn poll_loader(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        let Some(result) = loader.poll() else {
            return;
        };
        self.loader = None;

        let opened = result.and_then(|loaded| {
            let sheet = PdfSheet::from_bytes(&loaded.sheet_bytes, self.config.raster_target_size)?;
            Ok((sheet, loaded.paper))
        });
        match opened {
            Ok((sheet, paper)) => {
                self.session = Some(MarkingSession::new(&paper, sheet.page_count()));
                self.sheet = Some(sheet);
            }
            Err(e) => self.ui_state.notices.push(&e),
        }
        self.env.window.request_redraw();
    }

    /// Rasterise the current page if the session is waiting on one.
    fn ensure_page_raster(&mut self) {
        let (Some(session), Some(sheet)) = (self.session.as_mut(), self.sheet.as_ref()) else {
            return;
        };
        if session.is_ready() {
            return;
        }
        let page = session.current_page();
        let raster = sheet.render_page(page).unwrap_or_else(|e| {
            log::warn!("Failed to render page {}: {}", page, e);
            let side = self.config.raster_target_size;
            PageRaster::blank(page, side * 3 / 4, side)
        });
        match page_image(&raster) {
            Ok(image) => {
                self.page_image = Some(image);
                session.set_raster(raster);
            }
            Err(e) => log::error!("Failed to upload page {}: {}", page, e),
        }
    }

    /// Fit the current page, centred, into the area the panels leave free.
    fn layout_page(&mut self) {
        self.geometry = None;
        let Some(raster) = self.session.as_ref().and_then(|s| s.raster()) else {
            return;
        };
        let ppp = self.egui.pixels_per_point() as f64;
        let rect = self.ui_state.content_rect;
        let (left, top) = (rect.min.x as f64 * ppp, rect.min.y as f64 * ppp);
        let size = self.env.window.inner_size();
        let right = (rect.max.x as f64 * ppp).min(size.width as f64);
        let bottom = (rect.max.y as f64 * ppp).min(size.height as f64);

        let avail_w = (right - left - 2.0 * PAGE_MARGIN).max(1.0);
        let avail_h = (bottom - top - 2.0 * PAGE_MARGIN).max(1.0);
        let (raster_w, raster_h) = (raster.width as f64, raster.height as f64);
        let fit = (avail_w / raster_w).min(avail_h / raster_h);
        let displayed_width = raster_w * fit;
        let displayed_height = raster_h * fit;

        self.geometry = Some(SurfaceGeometry {
            origin: Point::new(
                left + (right - left - displayed_width) / 2.0,
                top + (bottom - top - displayed_height) / 2.0,
            ),
            displayed_width,
            displayed_height,
            raster_width: raster_w,
            raster_height: raster_h,
        });
    }

    fn report(&mut self, error: MarkingError) {
        match error {
            MarkingError::NotReady => log::debug!("Input ignored: {}", error),
            e => {
                self.ui_state.notices.push(&e);
                self.env.window.request_redraw();
            }
        }
    }

    /// Ask for a frame only when the session changed something visible.
    fn redraw_if_dirty(&mut self) {
        if self.session.as_mut().is_some_and(|s| s.take_redraw()) {
            self.env.window.request_redraw();
        }
    }

    fn pointer(&mut self, make: fn(Point) -> PointerEvent) {
        let (Some(session), Some(geometry)) = (self.session.as_mut(), self.geometry) else {
            return;
        };
        let result = session.pointer(make(geometry.to_raster_space(self.cursor)));
        if let Err(e) = result {
            self.report(e);
        }
    }

    fn apply_actions(&mut self, actions: Vec<UiAction>, event_loop: &ActiveEventLoop) {
        for action in actions {
            if let Err(e) = self.apply_action(action, event_loop) {
                self.report(e);
            }
        }
    }

    fn apply_action(
        &mut self,
        action: UiAction,
        event_loop: &ActiveEventLoop,
    ) -> Result<(), MarkingError> {
        match action {
            UiAction::ConfigChanged => {
                self.overlay = OverlayRenderer::new(&self.config);
                self.egui.set_font_scale(self.config.ui_font_scale);
                return Ok(());
            }
            UiAction::Finish => {
                self.finish(true);
                event_loop.exit();
                return Ok(());
            }
            UiAction::Quit => {
                self.finish(false);
                event_loop.exit();
                return Ok(());
            }
            _ => {}
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        match action {
            UiAction::SelectTool(tool) => session.select_tool(tool)?,
            UiAction::ChooseMark(award) => session.choose_mark(award)?,
            UiAction::SelectQuestion(question_no) => session.select_question(&question_no)?,
            UiAction::SubmitPrompt(input) => session.submit_prompt(&input)?,
            UiAction::CancelPrompt => session.cancel_prompt(),
            UiAction::NextPage => {
                session.next_page()?;
            }
            UiAction::PrevPage => {
                session.prev_page()?;
            }
            UiAction::GoToPage(page) => {
                session.jump_to(page)?;
            }
            UiAction::ConfigChanged | UiAction::Finish | UiAction::Quit => {}
        }
        Ok(())
    }

    /// Log the score summary; `submit` also writes it to stdout for the caller.
    fn finish(&self, submit: bool) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match serde_json::to_string_pretty(&session.summary()) {
            Ok(json) => {
                log::info!("Score summary: {}", json);
                if submit {
                    println!("{}", json);
                }
            }
            Err(e) => log::error!("Failed to serialize score summary: {}", e),
        }
    }

    fn handle_key(&mut self, key: &Key, event_loop: &ActiveEventLoop) {
        let ctrl = self.modifiers.control_key();
        let action = match key {
            Key::Named(NamedKey::F1) => {
                self.ui_state.show_shortcuts = !self.ui_state.show_shortcuts;
                self.env.window.request_redraw();
                None
            }
            Key::Character(c) if ctrl && c.as_str() == "," => {
                self.ui_state.show_settings = !self.ui_state.show_settings;
                self.env.window.request_redraw();
                None
            }
            Key::Character(c) if ctrl && c.as_str() == "q" => Some(UiAction::Quit),
            Key::Character(c) if ctrl && c.as_str() == "z" => Some(UiAction::SelectTool(Tool::Undo)),
            Key::Named(NamedKey::PageDown) | Key::Named(NamedKey::ArrowRight) => {
                Some(UiAction::NextPage)
            }
            Key::Named(NamedKey::PageUp) | Key::Named(NamedKey::ArrowLeft) => {
                Some(UiAction::PrevPage)
            }
            Key::Named(NamedKey::Home) => Some(UiAction::GoToPage(1)),
            Key::Named(NamedKey::End) => self
                .session
                .as_ref()
                .map(|s| UiAction::GoToPage(s.navigator().total() as i64)),
            Key::Named(NamedKey::Escape) => Some(UiAction::CancelPrompt),
            Key::Character(c) if !ctrl => match c.as_str() {
                "c" => Some(UiAction::SelectTool(Tool::Check)),
                "x" => Some(UiAction::SelectTool(Tool::Cross)),
                "t" => Some(UiAction::SelectTool(Tool::Text)),
                "p" => Some(UiAction::SelectTool(Tool::Stroke)),
                "n" => Some(UiAction::SelectTool(Tool::Number)),
                _ => None,
            },
            _ => None,
        };
        if let Some(action) = action {
            self.apply_actions(vec![action], event_loop);
        }
        self.redraw_if_dirty();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let size = self.env.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }

        self.poll_loader();
        self.repaint_at = None;

        let ctx = self.egui.begin_frame(&self.env.window).clone();
        let actions = ui::build_ui(
            &ctx,
            &mut self.ui_state,
            self.session.as_ref(),
            &mut self.config,
        );
        let repaint_delay = self.egui.end_frame(&self.env.window);
        self.apply_actions(actions, event_loop);

        self.ensure_page_raster();
        self.layout_page();

        let canvas = self.env.surface.canvas();
        canvas.clear(Color::from_argb(255, 128, 128, 128));

        if let (Some(session), Some(image), Some(geometry)) =
            (self.session.as_ref(), self.page_image.as_ref(), self.geometry)
        {
            let inverse = (1.0 / geometry.scale()) as f32;
            canvas.save();
            canvas.translate((geometry.origin.x as f32, geometry.origin.y as f32));
            canvas.scale((inverse, inverse));
            self.overlay.compose(canvas, image, session.annotations());
            if let Some(points) = session.tools().in_progress_stroke() {
                self.overlay.draw_live_stroke(canvas, points);
            }
            canvas.restore();
        }

        self.env.gr_context.flush_and_submit();

        self.egui.paint(&self.env.window);
        // glow leaves GL state behind that Skia does not track
        self.env.gr_context.reset(None);

        if let Err(e) = self.env.gl_surface.swap_buffers(&self.env.gl_context) {
            log::error!("Failed to swap buffers: {}", e);
        }

        // Panels were built before this frame's actions landed, so a dirty
        // session needs one more pass for them to catch up.
        let dirty = self.session.as_mut().is_some_and(|s| s.take_redraw());
        if dirty || repaint_delay.is_zero() {
            self.env.window.request_redraw();
        } else {
            self.repaint_at = Instant::now().checked_add(repaint_delay);
        }
    }
}

fn create_surface(
    window: &Window,
    fb_info: FramebufferInfo,
    gr_context: &mut gpu::DirectContext,
    num_samples: usize,
    stencil_size: usize,
) -> Result<Surface> {
    let size = window.inner_size();
    let size = (
        i32::try_from(size.width.max(1))?,
        i32::try_from(size.height.max(1))?,
    );
    let backend_render_target =
        backend_render_targets::make_gl(size, num_samples, stencil_size, fb_info);

    gpu::surfaces::wrap_backend_render_target(
        gr_context,
        &backend_render_target,
        SurfaceOrigin::BottomLeft,
        ColorType::RGBA8888,
        None,
        None,
    )
    .ok_or_else(|| anyhow!("Could not create skia surface"))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, cause: StartCause) {
        if let StartCause::ResumeTimeReached { .. } = cause {
            self.env.window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let mut wake = self.repaint_at;
        if self.loader.is_some() {
            self.poll_loader();
            let poll_at = Instant::now() + LOAD_POLL_INTERVAL;
            wake = Some(wake.map_or(poll_at, |at| at.min(poll_at)));
        }
        match wake {
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let response = self.egui.handle_event(&self.env.window, &event);
        if response.repaint {
            self.env.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                self.finish(false);
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                match create_surface(
                    &self.env.window,
                    self.env.fb_info,
                    &mut self.env.gr_context,
                    self.env.num_samples,
                    self.env.stencil_size,
                ) {
                    Ok(surface) => self.env.surface = surface,
                    Err(e) => log::error!("{}", e),
                }
                let (width, height): (u32, u32) = physical_size.into();
                if let (Some(w), Some(h)) =
                    (NonZeroU32::new(width.max(1)), NonZeroU32::new(height.max(1)))
                {
                    self.env.gl_surface.resize(&self.env.gl_context, w, h);
                }
                self.env.window.request_redraw();
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(position.x, position.y);
                if self.pressed && !response.consumed {
                    self.pointer(PointerEvent::Move);
                    self.redraw_if_dirty();
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let on_page = self.geometry.is_some_and(|g| g.contains(self.cursor));
                    if on_page && !response.consumed {
                        self.pressed = true;
                        self.pointer(PointerEvent::Down);
                        self.redraw_if_dirty();
                    }
                }
                ElementState::Released => {
                    if std::mem::take(&mut self.pressed) {
                        self.pointer(PointerEvent::Up);
                        if self.geometry.is_some_and(|g| g.contains(self.cursor)) {
                            self.pointer(PointerEvent::Click);
                        }
                        self.redraw_if_dirty();
                    }
                }
            },

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !response.consumed {
                    self.handle_key(&event.logical_key, event_loop);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <sheet-id> <paper-id>", args[0]);
        std::process::exit(1);
    }

    let config = Config::load();
    let sheet_path = config.sheet_path(&args[1]);
    let paper_path = config.paper_path(&args[2]);
    let loader = SheetLoader::spawn(sheet_path, paper_path)?;

    // Set up winit + glutin + skia
    let el = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_inner_size(LogicalSize::new(1200.0, 900.0))
        .with_resizable(true)
        .with_title(format!("sheetmark: {}", args[1]));

    let template = ConfigTemplateBuilder::new()
        .with_alpha_size(8)
        .with_transparency(true);

    let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));
    let (window, gl_config) = display_builder
        .build(&el, template, |configs| {
            configs
                .reduce(|accum, config| {
                    let transparency_check = config.supports_transparency().unwrap_or(false)
                        & !accum.supports_transparency().unwrap_or(false);
                    if transparency_check || config.num_samples() < accum.num_samples() {
                        config
                    } else {
                        accum
                    }
                })
                .expect("no GL configs offered")
        })
        .map_err(|e| anyhow!("Failed to build display: {}", e))?;
    let window = window.ok_or_else(|| anyhow!("Could not create window with OpenGL context"))?;
    let window_handle = window.window_handle()?;
    let raw_window_handle = window_handle.as_raw();

    let context_attributes = ContextAttributesBuilder::new().build(Some(raw_window_handle));
    let fallback_context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::Gles(None))
        .build(Some(raw_window_handle));

    let not_current_gl_context = unsafe {
        gl_config
            .display()
            .create_context(&gl_config, &context_attributes)
            .or_else(|_| {
                gl_config
                    .display()
                    .create_context(&gl_config, &fallback_context_attributes)
            })?
    };

    let (width, height): (u32, u32) = window.inner_size().into();
    let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_window_handle,
        NonZeroU32::new(width.max(1)).ok_or_else(|| anyhow!("zero window width"))?,
        NonZeroU32::new(height.max(1)).ok_or_else(|| anyhow!("zero window height"))?,
    );

    let gl_surface = unsafe {
        gl_config
            .display()
            .create_window_surface(&gl_config, &attrs)?
    };

    let gl_context = not_current_gl_context.make_current(&gl_surface)?;

    gl::load_with(|s| match CString::new(s) {
        Ok(name) => gl_config.display().get_proc_address(name.as_c_str()),
        Err(_) => std::ptr::null(),
    });
    let interface = skia_safe::gpu::gl::Interface::new_load_with(|name| {
        if name == "eglGetCurrentDisplay" {
            return std::ptr::null();
        }
        match CString::new(name) {
            Ok(name) => gl_config.display().get_proc_address(name.as_c_str()),
            Err(_) => std::ptr::null(),
        }
    })
    .ok_or_else(|| anyhow!("Could not create GL interface"))?;

    let mut gr_context = skia_safe::gpu::direct_contexts::make_gl(interface, None)
        .ok_or_else(|| anyhow!("Could not create direct context"))?;

    let fb_info = {
        let mut fboid: GLint = 0;
        unsafe { gl::GetIntegerv(gl::FRAMEBUFFER_BINDING, &mut fboid) };
        FramebufferInfo {
            fboid: fboid.try_into()?,
            format: skia_safe::gpu::gl::Format::RGBA8.into(),
            ..Default::default()
        }
    };

    let num_samples = gl_config.num_samples() as usize;
    let stencil_size = gl_config.stencil_size() as usize;

    let surface = create_surface(&window, fb_info, &mut gr_context, num_samples, stencil_size)?;

    let egui = EguiIntegration::new(&window, &gl_context, config.ui_font_scale)?;
    let overlay = OverlayRenderer::new(&config);

    let env = Env {
        surface,
        gl_surface,
        gr_context,
        gl_context,
        window,
        fb_info,
        num_samples,
        stencil_size,
    };

    let mut app = App {
        egui,
        env,
        config,
        loader: Some(loader),
        sheet: None,
        session: None,
        page_image: None,
        overlay,
        ui_state: UiState::default(),
        geometry: None,
        cursor: Point::ORIGIN,
        pressed: false,
        modifiers: ModifiersState::empty(),
        repaint_at: None,
    };

    el.run_app(&mut app)?;

    Ok(())
}
