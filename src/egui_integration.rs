use anyhow::Result;
use egui_winit::EventResponse;
use glutin::display::{GetGlDisplay, GlDisplay};
use std::sync::Arc;
use std::time::Duration;

/// egui panels painted with glow on top of the Skia-rendered sheet, sharing its GL context.
pub struct EguiIntegration {
    pub ctx: egui::Context,
    winit_state: egui_winit::State,
    painter: egui_glow::Painter,
    shapes: Vec<egui::epaint::ClippedShape>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
}

impl EguiIntegration {
    /// The GL context must be current and the GL loader initialized.
    pub fn new(
        window: &winit::window::Window,
        gl_context: &glutin::context::PossiblyCurrentContext,
        font_scale: f32,
    ) -> Result<Self> {
        let display = gl_context.display();
        let glow_context = unsafe {
            glow::Context::from_loader_function(|s| {
                let s = std::ffi::CString::new(s)
                    .expect("failed to construct CString for GL function pointer");
                display.get_proc_address(s.as_c_str()).cast()
            })
        };

        let painter = egui_glow::Painter::new(Arc::new(glow_context), "", None, false)?;

        let ctx = egui::Context::default();
        apply_font_scale(&ctx, font_scale);

        let winit_state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            None, // native_pixels_per_point
            None, // theme
            None, // max_texture_side
        );

        Ok(Self {
            ctx,
            winit_state,
            painter,
            shapes: Default::default(),
            textures_delta: Default::default(),
            pixels_per_point: window.scale_factor() as f32,
        })
    }

    /// `consumed` is set when a panel or text field took the event.
    pub fn handle_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> EventResponse {
        self.winit_state.on_window_event(window, event)
    }

    pub fn begin_frame(&mut self, window: &winit::window::Window) -> &egui::Context {
        let raw_input = self.winit_state.take_egui_input(window);
        self.ctx.begin_pass(raw_input);
        &self.ctx
    }

    /// Returns how long egui is happy to wait before the next frame.
    pub fn end_frame(&mut self, window: &winit::window::Window) -> Duration {
        // end_pass() clears the input state, so read the scale first
        self.pixels_per_point = self.ctx.input(|i| i.pixels_per_point);

        let output = self.ctx.end_pass();
        let repaint_delay = output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .map_or(Duration::MAX, |v| v.repaint_delay);
        self.winit_state
            .handle_platform_output(window, output.platform_output);
        self.shapes = output.shapes;
        self.textures_delta = output.textures_delta;
        repaint_delay
    }

    /// Paint the panels over whatever is already in the framebuffer.
    pub fn paint(&mut self, window: &winit::window::Window) {
        let shapes = std::mem::take(&mut self.shapes);
        let textures_delta = std::mem::take(&mut self.textures_delta);
        let meshes = self.ctx.tessellate(shapes, self.pixels_per_point);

        let size = window.inner_size();
        self.painter.paint_and_update_textures(
            [size.width, size.height],
            self.pixels_per_point,
            &meshes,
            &textures_delta,
        );
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    pub fn set_font_scale(&self, scale: f32) {
        apply_font_scale(&self.ctx, scale);
    }
}

impl Drop for EguiIntegration {
    fn drop(&mut self) {
        self.painter.destroy();
    }
}

fn apply_font_scale(ctx: &egui::Context, scale: f32) {
    let defaults = egui::Style::default();
    ctx.style_mut(|style| {
        for (text_style, font_id) in style.text_styles.iter_mut() {
            if let Some(base) = defaults.text_styles.get(text_style) {
                font_id.size = base.size * scale;
            }
        }
    });
}
