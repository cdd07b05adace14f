use boid_shared::{AgentSnapshot, CameraSettings, FrameSnapshot, SurfaceSize};

use crate::bounds::Bounds;
use crate::config::{BoundaryPolicy, Cohesion, FlockConfig};
use crate::error::FlockError;
use crate::sampling::AgentSampler;
use crate::vector::{Vector, Vector2D, Vector3D};

/// A single flocking agent. Plain data; the rules live in free functions.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent<V> {
    pub position: V,
    pub velocity: V,
    pub size: f32,
}

impl<V: Vector> Agent<V> {
    pub fn new(position: V, velocity: V, size: f32) -> Self {
        Self {
            position,
            velocity,
            size,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            position: self.position.components(),
            velocity: self.velocity.components(),
        }
    }
}

/// Velocity change pulling agent `index` toward every neighbor inside the radius.
///
/// Reads only `positions`, so callers pass a snapshot taken before any agent moved.
pub fn cohesion_nudge<V: Vector>(index: usize, positions: &[V], cohesion: &Cohesion) -> V {
    let me = positions[index];
    positions
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != index)
        .map(|(_, position)| *position - me)
        .filter(|offset| offset.magnitude() < cohesion.radius)
        .fold(V::zero(), |nudge, offset| nudge + offset * cohesion.gain)
}

/// Apply the boundary policy to one agent on every axis.
pub fn apply_boundary<V: Vector>(agent: &mut Agent<V>, bounds: &Bounds<V>, policy: BoundaryPolicy) {
    for axis in 0..V::AXES {
        let min = bounds.min.axis(axis);
        let max = bounds.max.axis(axis);
        let position = agent.position.axis(axis);

        match policy {
            BoundaryPolicy::Bounce => {
                // Only flip while still heading outward: one flip per crossing
                let velocity = agent.velocity.axis_mut(axis);
                if (position < min && *velocity < 0.0) || (position > max && *velocity > 0.0) {
                    *velocity = -*velocity;
                }
            }
            BoundaryPolicy::Wrap => {
                if position > max {
                    *agent.position.axis_mut(axis) = min;
                } else if position < min {
                    *agent.position.axis_mut(axis) = max;
                }
            }
        }
    }
}

/// Advance every agent by one frame.
///
/// Per agent, in index order: cohesion, speed clamp, integrate
/// `position += velocity * dt_factor`, boundary policy. Neighbor reads use the
/// positions from the start of the frame.
pub fn advance<V: Vector>(
    agents: &mut [Agent<V>],
    bounds: &Bounds<V>,
    config: &FlockConfig,
    dt_factor: f32,
) {
    let positions: Vec<V> = match config.cohesion {
        Some(_) => agents.iter().map(|agent| agent.position).collect(),
        None => Vec::new(),
    };

    for (index, agent) in agents.iter_mut().enumerate() {
        if let Some(cohesion) = &config.cohesion {
            agent.velocity += cohesion_nudge(index, &positions, cohesion);
        }

        let mut step = agent.velocity * dt_factor;
        if let Some(limit) = config.speed_limit {
            agent.velocity = agent.velocity.limit(limit.max);
            step = agent.velocity * dt_factor;
            if limit.limit_scaled_step {
                step = step.limit(limit.max);
            }
        }

        agent.position += step;
        apply_boundary(agent, bounds, config.boundary);
    }
}

/// Owns one flock: its agents, the current bounds, the rules and the hover state.
///
/// The host drives it by calling [`Flock::tick`] once per frame; bounds and hover
/// changes land between ticks.
#[derive(Debug, Clone)]
pub struct Flock<V> {
    agents: Vec<Agent<V>>,
    bounds: Bounds<V>,
    config: FlockConfig,
    hovered: bool,
    frame: u64,
}

impl<V: Vector> Flock<V> {
    /// Populate `config.count` agents from the sampler.
    pub fn initialize<S: AgentSampler<V>>(
        config: FlockConfig,
        bounds: Bounds<V>,
        sampler: &mut S,
    ) -> Result<Self, FlockError> {
        config.validate()?;

        let agents = (0..config.count)
            .map(|_| {
                let position = sampler.position(&bounds);
                let velocity = sampler.velocity();
                Agent::new(position, velocity, config.agent_size)
            })
            .collect();

        log::debug!(
            "initialized {} agents ({:?}) in {:?}",
            config.count,
            config.boundary,
            bounds
        );

        Ok(Self {
            agents,
            bounds,
            config,
            hovered: false,
            frame: 0,
        })
    }

    /// Build a flock around explicit agents; `config.count` follows `agents.len()`.
    pub fn from_agents(
        mut config: FlockConfig,
        bounds: Bounds<V>,
        agents: Vec<Agent<V>>,
    ) -> Result<Self, FlockError> {
        config.count = agents.len();
        config.validate()?;
        Ok(Self {
            agents,
            bounds,
            config,
            hovered: false,
            frame: 0,
        })
    }

    pub fn tick(&mut self) {
        let dt_factor = self.dt_factor();
        advance(&mut self.agents, &self.bounds, &self.config, dt_factor);
        self.frame += 1;
    }

    /// Step scale for the next tick: the hover multiplier while hovered, else 1.0
    pub fn dt_factor(&self) -> f32 {
        if self.hovered {
            self.config.hover_multiplier
        } else {
            1.0
        }
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Replace the bounds. Agents are left untouched; an agent outside the new
    /// bounds is handled at its next boundary check.
    pub fn recompute_bounds(&mut self, bounds: Bounds<V>) {
        log::debug!("bounds changed from {:?} to {:?}", self.bounds, bounds);
        self.bounds = bounds;
    }

    pub fn agents(&self) -> &[Agent<V>] {
        &self.agents
    }

    pub fn bounds(&self) -> &Bounds<V> {
        &self.bounds
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Number of completed ticks
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            frame: self.frame,
            hovered: self.hovered,
            agents: self.agents.iter().map(Agent::snapshot).collect(),
        }
    }
}

impl Flock<Vector2D> {
    /// Bounds follow the pixel size of the canvas
    pub fn resize_surface(&mut self, size: SurfaceSize) -> Result<(), FlockError> {
        let bounds = Bounds::surface(size)?;
        self.recompute_bounds(bounds);
        Ok(())
    }
}

impl Flock<Vector3D> {
    /// Bounds follow the camera frustum at the new aspect ratio
    pub fn resize_camera(
        &mut self,
        camera: &CameraSettings,
        size: SurfaceSize,
    ) -> Result<(), FlockError> {
        let bounds = Bounds::from_camera(camera, size)?;
        self.recompute_bounds(bounds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeedLimit;
    use crate::sampling::UniformSampler;

    fn agent2(x: f32, y: f32, vx: f32, vy: f32) -> Agent<Vector2D> {
        Agent::new(Vector2D::new(x, y), Vector2D::new(vx, vy), 2.0)
    }

    fn surface(width: f32, height: f32) -> Bounds<Vector2D> {
        Bounds::surface(SurfaceSize::new(width, height)).unwrap()
    }

    fn still_config() -> FlockConfig {
        FlockConfig {
            cohesion: None,
            speed_limit: None,
            ..FlockConfig::canvas()
        }
    }

    #[test]
    fn test_initialize_fills_count() {
        let mut sampler = UniformSampler::seeded(1, Vector2D::new(1.0, 1.0));
        let flock = Flock::initialize(FlockConfig::canvas(), surface(800.0, 600.0), &mut sampler)
            .unwrap();
        assert_eq!(flock.agents().len(), 15);
        assert!(flock.agents().iter().all(|a| a.size == 2.0));
        assert_eq!(flock.frame(), 0);
    }

    #[test]
    fn test_initialize_rejects_zero_count() {
        let config = FlockConfig {
            count: 0,
            ..FlockConfig::canvas()
        };
        let mut sampler = UniformSampler::seeded(1, Vector2D::new(1.0, 1.0));
        let result = Flock::initialize(config, surface(10.0, 10.0), &mut sampler);
        assert_eq!(result.unwrap_err(), FlockError::InvalidCount(0));
    }

    #[test]
    fn test_from_agents_rejects_empty() {
        let result = Flock::from_agents(FlockConfig::canvas(), surface(10.0, 10.0), Vec::new());
        assert_eq!(result.unwrap_err(), FlockError::InvalidCount(0));
    }

    #[test]
    fn test_closure_sampler() {
        let mut sampler = (
            |bounds: &Bounds<Vector2D>| bounds.max * 0.5,
            || Vector2D::new(0.5, 0.0),
        );
        let config = FlockConfig {
            count: 3,
            ..still_config()
        };
        let flock = Flock::initialize(config, surface(100.0, 40.0), &mut sampler).unwrap();
        assert!(flock
            .agents()
            .iter()
            .all(|a| a.position == Vector2D::new(50.0, 20.0)));
    }

    #[test]
    fn test_cohesion_nudge_literal_case() {
        let cohesion = Cohesion {
            radius: 30.0,
            gain: 0.001,
        };
        let positions = [Vector2D::new(0.0, 0.0), Vector2D::new(10.0, 0.0)];
        let nudge = cohesion_nudge(0, &positions, &cohesion);
        assert!((nudge.x - 0.01).abs() < 1e-7);
        assert_eq!(nudge.y, 0.0);

        let back = cohesion_nudge(1, &positions, &cohesion);
        assert!((back.x + 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_no_cohesion_at_or_beyond_radius() {
        let cohesion = Cohesion {
            radius: 30.0,
            gain: 0.001,
        };
        let positions = [Vector2D::new(0.0, 0.0), Vector2D::new(30.0, 0.0)];
        assert_eq!(cohesion_nudge(0, &positions, &cohesion), Vector2D::zero());
    }

    #[test]
    fn test_cohesion_reads_start_of_frame_positions() {
        // Agent 0 moves first; agent 1 must still see it at x = 0
        let mut agents = vec![agent2(0.0, 50.0, 1.0, 0.0), agent2(10.0, 50.0, 0.0, 0.0)];
        let config = FlockConfig {
            speed_limit: None,
            ..FlockConfig::canvas()
        };
        advance(&mut agents, &surface(100.0, 100.0), &config, 1.0);
        assert!((agents[1].velocity.x + 0.01).abs() < 1e-6);
        assert!((agents[0].velocity.x - 1.01).abs() < 1e-6);
    }

    #[test]
    fn test_integrate_scales_by_dt_factor() {
        let mut agents = vec![agent2(10.0, 10.0, 1.0, -0.5)];
        advance(&mut agents, &surface(100.0, 100.0), &still_config(), 2.5);
        assert_eq!(agents[0].position, Vector2D::new(12.5, 8.75));
        assert_eq!(agents[0].velocity, Vector2D::new(1.0, -0.5));
    }

    #[test]
    fn test_bounce_literal_case() {
        let mut agent = agent2(-1.0, 50.0, -0.5, 0.0);
        apply_boundary(&mut agent, &surface(100.0, 100.0), BoundaryPolicy::Bounce);
        assert_eq!(agent.velocity.x, 0.5);
        assert_eq!(agent.position.x, -1.0);
    }

    #[test]
    fn test_bounce_flips_once_per_crossing() {
        let bounds = surface(100.0, 100.0);
        let mut agents = vec![agent2(99.8, 50.0, 0.5, 0.0)];
        advance(&mut agents, &bounds, &still_config(), 1.0);
        assert_eq!(agents[0].velocity.x, -0.5);
        // Still outside next frame but heading back in: no second flip
        let mut outside = agent2(100.1, 50.0, -0.5, 0.0);
        apply_boundary(&mut outside, &bounds, BoundaryPolicy::Bounce);
        assert_eq!(outside.velocity.x, -0.5);
    }

    #[test]
    fn test_wrap_literal_case() {
        let bounds = Bounds::symmetric(Vector3D::new(10.0, 10.0, 10.0)).unwrap();
        let mut agent = Agent::new(Vector3D::new(15.0, 0.0, -12.0), Vector3D::new(1.0, 0.0, -1.0), 1.0);
        apply_boundary(&mut agent, &bounds, BoundaryPolicy::Wrap);
        assert_eq!(agent.position, Vector3D::new(-10.0, 0.0, 10.0));
        assert_eq!(agent.velocity, Vector3D::new(1.0, 0.0, -1.0));
    }

    #[test]
    fn test_speed_clamp_preserves_direction() {
        let mut agents = vec![agent2(50.0, 50.0, 3.0, 4.0)];
        let config = FlockConfig {
            cohesion: None,
            ..FlockConfig::canvas()
        };
        advance(&mut agents, &surface(100.0, 100.0), &config, 1.0);
        let v = agents[0].velocity;
        assert!((v.magnitude() - 1.5).abs() < 1e-6);
        assert!((v.x - 0.9).abs() < 1e-6 && (v.y - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_step_limit() {
        let limit = SpeedLimit {
            max: 1.0,
            limit_scaled_step: true,
        };
        let config = FlockConfig {
            speed_limit: Some(limit),
            ..still_config()
        };
        let mut agents = vec![agent2(50.0, 50.0, 1.0, 0.0)];
        advance(&mut agents, &surface(100.0, 100.0), &config, 2.5);
        assert_eq!(agents[0].position.x, 51.0);

        let config = FlockConfig {
            speed_limit: Some(SpeedLimit {
                limit_scaled_step: false,
                ..limit
            }),
            ..config
        };
        let mut agents = vec![agent2(50.0, 50.0, 1.0, 0.0)];
        advance(&mut agents, &surface(100.0, 100.0), &config, 2.5);
        assert_eq!(agents[0].position.x, 52.5);
    }

    #[test]
    fn test_hover_selects_dt_factor() {
        let bounds = Bounds::symmetric(Vector3D::new(10.0, 10.0, 10.0)).unwrap();
        let agents = vec![Agent::new(Vector3D::zero(), Vector3D::new(0.2, 0.0, 0.0), 1.0)];
        let mut flock = Flock::from_agents(FlockConfig::button(), bounds, agents).unwrap();

        flock.tick();
        assert!((flock.agents()[0].position.x - 0.2).abs() < 1e-6);

        flock.set_hovered(true);
        assert_eq!(flock.dt_factor(), 2.5);
        flock.tick();
        assert!((flock.agents()[0].position.x - 0.7).abs() < 1e-6);
        assert_eq!(flock.frame(), 2);
    }

    #[test]
    fn test_recompute_bounds_keeps_agents() {
        let agents = vec![agent2(90.0, 90.0, 0.5, 0.5), agent2(10.0, 20.0, -0.1, 0.3)];
        let mut flock = Flock::from_agents(still_config(), surface(100.0, 100.0), agents).unwrap();
        let before = flock.agents().to_vec();

        flock.resize_surface(SurfaceSize::new(50.0, 50.0)).unwrap();
        assert_eq!(flock.agents(), &before[..]);
        assert_eq!(flock.bounds(), &surface(50.0, 50.0));

        // The agent now outside is only corrected at its next boundary check
        flock.tick();
        assert_eq!(flock.agents()[0].velocity, Vector2D::new(-0.5, -0.5));
    }

    #[test]
    fn test_bad_resize_keeps_old_bounds() {
        let agents = vec![agent2(10.0, 10.0, 0.0, 0.0)];
        let mut flock = Flock::from_agents(still_config(), surface(100.0, 100.0), agents).unwrap();
        assert!(flock.resize_surface(SurfaceSize::new(0.0, 50.0)).is_err());
        assert_eq!(flock.bounds(), &surface(100.0, 100.0));
    }

    #[test]
    fn test_snapshot_exports_components() {
        let agents = vec![agent2(1.0, 2.0, 0.5, -0.5)];
        let flock = Flock::from_agents(still_config(), surface(10.0, 10.0), agents).unwrap();
        let snapshot = flock.snapshot();
        assert_eq!(snapshot.frame, 0);
        assert_eq!(snapshot.agents[0].position, vec![1.0, 2.0]);
        assert_eq!(snapshot.agents[0].velocity, vec![0.5, -0.5]);
    }
}
