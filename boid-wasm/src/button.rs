use boid_core::pose::instance_matrix;
use boid_core::{velocity_range, Bounds, Flock, FlockConfig, UniformSampler, Vector3D};
use boid_shared::{CameraSettings, FlockSettings, SurfaceSize};
use wasm_bindgen::prelude::*;

use crate::{flock_error, load_settings};

/// 3D flock behind a button, handed to the page as instance matrices
#[wasm_bindgen]
pub struct ButtonSimulation {
    flock: Flock<Vector3D>,
    camera: CameraSettings,
}

#[wasm_bindgen]
impl ButtonSimulation {
    /// `width` and `height` are the pixel size of the button the scene is drawn on
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: f32,
        height: f32,
        settings_json: Option<String>,
    ) -> Result<ButtonSimulation, JsValue> {
        let settings = load_settings(settings_json, FlockSettings::button())?;
        let config = FlockConfig::from_settings(&settings).map_err(flock_error)?;
        let camera = settings.camera;

        let bounds = Bounds::from_camera(&camera, SurfaceSize::new(width, height))
            .map_err(flock_error)?;
        let mut sampler = UniformSampler::from_entropy(
            velocity_range::<Vector3D>(&settings).map_err(flock_error)?,
        );
        let flock = Flock::initialize(config, bounds, &mut sampler).map_err(flock_error)?;

        log::info!(
            "Button flock: {} agents, bounds ±{:.2} x ±{:.2} x ±{:.2}",
            flock.agents().len(),
            bounds.max.x,
            bounds.max.y,
            bounds.max.z
        );

        Ok(ButtonSimulation { flock, camera })
    }

    pub fn tick(&mut self) {
        self.flock.tick();
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.flock.set_hovered(hovered);
    }

    pub fn is_hovered(&self) -> bool {
        self.flock.is_hovered()
    }

    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        self.flock
            .resize_camera(&self.camera, SurfaceSize::new(width, height))
            .map_err(flock_error)
    }

    pub fn agent_count(&self) -> usize {
        self.flock.agents().len()
    }

    pub fn frame(&self) -> u64 {
        self.flock.frame()
    }

    /// Column-major 4x4 matrices, 16 floats per agent, ready for an instanced mesh
    pub fn instance_matrices(&self) -> Vec<f32> {
        self.flock
            .agents()
            .iter()
            .flat_map(instance_matrix)
            .collect()
    }

    pub fn camera_fov(&self) -> f32 {
        self.camera.fov_degrees
    }

    pub fn camera_distance(&self) -> f32 {
        self.camera.distance
    }
}
