use boid_core::pose::heading;
use boid_core::{velocity_range, Agent, Bounds, Flock, FlockConfig, UniformSampler, Vector2D};
use boid_shared::{FlockSettings, SurfaceSize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement};

use crate::{flock_error, load_settings};

const AGENT_FILL: &str = "rgba(16, 185, 129, 0.6)";

/// 2D particle flock drawn on a canvas
#[wasm_bindgen]
pub struct CanvasSimulation {
    flock: Flock<Vector2D>,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

#[wasm_bindgen]
impl CanvasSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, settings_json: Option<String>) -> Result<CanvasSimulation, JsValue> {
        let settings = load_settings(settings_json, FlockSettings::canvas())?;
        let config = FlockConfig::from_settings(&settings).map_err(flock_error)?;

        let window = web_sys::window().ok_or("no global window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let context = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let size = fit_to_layout(&canvas);
        let bounds = Bounds::surface(size).map_err(flock_error)?;
        let mut sampler = UniformSampler::from_entropy(
            velocity_range::<Vector2D>(&settings).map_err(flock_error)?,
        );
        let flock = Flock::initialize(config, bounds, &mut sampler).map_err(flock_error)?;

        log::info!(
            "Canvas flock: {} agents on {}x{}",
            flock.agents().len(),
            size.width,
            size.height
        );

        Ok(CanvasSimulation {
            flock,
            canvas,
            context,
        })
    }

    pub fn tick(&mut self) {
        self.flock.tick();
    }

    pub fn render(&self) -> Result<(), JsValue> {
        let width = self.canvas.width() as f64;
        let height = self.canvas.height() as f64;
        self.context.clear_rect(0.0, 0.0, width, height);

        self.context.set_fill_style_str(AGENT_FILL);
        for agent in self.flock.agents() {
            self.draw_agent(agent)?;
        }

        Ok(())
    }

    /// Explicit resize from the page; a rejected size leaves canvas and bounds as they were
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.flock
            .resize_surface(SurfaceSize::new(width as f32, height as f32))
            .map_err(flock_error)?;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        Ok(())
    }

    pub fn agent_count(&self) -> usize {
        self.flock.agents().len()
    }

    pub fn frame(&self) -> u64 {
        self.flock.frame()
    }

    /// Flat `[x0, y0, x1, y1, ...]`
    pub fn positions(&self) -> Vec<f32> {
        self.flock
            .agents()
            .iter()
            .flat_map(|agent| [agent.position.x, agent.position.y])
            .collect()
    }
}

impl CanvasSimulation {
    /// Resize the backing store to the laid-out size and move the bounds with it
    pub(crate) fn fit_to_layout(&mut self) -> Result<(), JsValue> {
        let size = fit_to_layout(&self.canvas);
        self.flock.resize_surface(size).map_err(flock_error)
    }

    pub(crate) fn element(&self) -> &Element {
        self.canvas.as_ref()
    }

    fn draw_agent(&self, agent: &Agent<Vector2D>) -> Result<(), JsValue> {
        let size = agent.size as f64;

        self.context.save();
        self.context
            .translate(agent.position.x as f64, agent.position.y as f64)?;
        self.context.rotate(heading(&agent.velocity) as f64)?;

        // Triangle pointing along the velocity
        self.context.begin_path();
        self.context.move_to(size * 2.0, 0.0);
        self.context.line_to(-size, size);
        self.context.line_to(-size, -size);
        self.context.close_path();
        self.context.fill();

        self.context.restore();
        Ok(())
    }
}

/// Match the canvas backing store to its CSS box; an unlaid-out canvas keeps its attributes
fn fit_to_layout(canvas: &HtmlCanvasElement) -> SurfaceSize {
    let width = canvas.client_width();
    let height = canvas.client_height();
    if width > 0 && height > 0 {
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);
    }
    SurfaceSize::new(canvas.width() as f32, canvas.height() as f32)
}
