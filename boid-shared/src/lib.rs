use serde::{Deserialize, Serialize};

/// How agents are kept inside the bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Reflect the velocity component at an edge
    #[default]
    Bounce,
    /// Teleport to the opposite edge
    Wrap,
}

/// Pixel dimensions of a drawing surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Perspective camera used to derive the visible volume of the 3D flock
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Distance from the camera to the flock plane
    pub distance: f32,
    /// Half-depth of the flock volume along z
    pub depth: f32,
    /// The raw visible extent is divided by this to keep agents mostly on-screen
    pub margin: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            distance: 25.0,
            depth: 15.0,
            margin: 1.5,
        }
    }
}

/// Neighbor attraction parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CohesionSettings {
    pub radius: f32,
    pub gain: f32,
}

/// Flock configuration as loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockSettings {
    /// Signed so that a bad value from a host is rejected instead of wrapping
    pub count: i64,
    pub boundary: BoundaryMode,
    pub cohesion: Option<CohesionSettings>,
    pub max_speed: Option<f32>,
    /// Also cap `velocity * dt_factor` at `max_speed`
    pub limit_scaled_step: bool,
    pub hover_multiplier: f32,
    pub agent_size: f32,
    /// Per-axis half range of the initial velocity; two entries for 2D, three for 3D
    pub velocity_range: Vec<f32>,
    pub camera: CameraSettings,
}

impl FlockSettings {
    /// The 2D canvas particle flock
    pub fn canvas() -> Self {
        Self {
            count: 15,
            boundary: BoundaryMode::Bounce,
            cohesion: Some(CohesionSettings {
                radius: 30.0,
                gain: 0.001,
            }),
            max_speed: Some(1.5),
            limit_scaled_step: false,
            hover_multiplier: 1.0,
            agent_size: 2.0,
            velocity_range: vec![1.0, 1.0],
            camera: CameraSettings::default(),
        }
    }

    /// The 3D instanced flock behind the portfolio button
    pub fn button() -> Self {
        Self {
            count: 30,
            boundary: BoundaryMode::Wrap,
            cohesion: None,
            max_speed: None,
            limit_scaled_step: false,
            hover_multiplier: 2.5,
            agent_size: 1.0,
            velocity_range: vec![0.15, 0.15, 0.05],
            camera: CameraSettings::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a possibly partial JSON object on top of `base`; keys present in
    /// `json` replace the base value, top-level only.
    pub fn from_json_with_base(json: &str, base: &FlockSettings) -> Result<Self, serde_json::Error> {
        let patch: serde_json::Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(base)?;
        match (&mut merged, patch) {
            (serde_json::Value::Object(target), serde_json::Value::Object(patch)) => {
                target.extend(patch);
                serde_json::from_value(merged)
            }
            _ => Err(serde::de::Error::custom("flock settings must be a JSON object")),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for FlockSettings {
    fn default() -> Self {
        Self::canvas()
    }
}

/// One agent as exported for inspection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub position: Vec<f32>,
    pub velocity: Vec<f32>,
}

/// The whole flock after a given frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub hovered: bool,
    pub agents: Vec<AgentSnapshot>,
}
