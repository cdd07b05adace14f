use boid_shared::{BoundaryMode, FlockSettings};

use crate::error::FlockError;
use crate::vector::Vector;

/// What happens when an agent leaves the bounds on some axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Negate the velocity component; the agent re-enters on its own
    Bounce,
    /// Teleport the coordinate to the opposite edge, velocity untouched
    Wrap,
}

impl From<BoundaryMode> for BoundaryPolicy {
    fn from(mode: BoundaryMode) -> Self {
        match mode {
            BoundaryMode::Bounce => BoundaryPolicy::Bounce,
            BoundaryMode::Wrap => BoundaryPolicy::Wrap,
        }
    }
}

/// Pull toward every neighbor closer than `radius`, scaled by `gain`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cohesion {
    pub radius: f32,
    pub gain: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLimit {
    pub max: f32,
    /// Also cap the hover-scaled step `velocity * dt_factor`
    pub limit_scaled_step: bool,
}

/// Runtime rules of one flock
#[derive(Debug, Clone, PartialEq)]
pub struct FlockConfig {
    pub count: usize,
    pub boundary: BoundaryPolicy,
    pub cohesion: Option<Cohesion>,
    pub speed_limit: Option<SpeedLimit>,
    /// `dt_factor` used while the hover source reports hovered
    pub hover_multiplier: f32,
    pub agent_size: f32,
}

impl FlockConfig {
    /// 15 bouncing agents with local cohesion and a 1.5 speed cap
    pub fn canvas() -> Self {
        Self {
            count: 15,
            boundary: BoundaryPolicy::Bounce,
            cohesion: Some(Cohesion {
                radius: 30.0,
                gain: 0.001,
            }),
            speed_limit: Some(SpeedLimit {
                max: 1.5,
                limit_scaled_step: false,
            }),
            hover_multiplier: 1.0,
            agent_size: 2.0,
        }
    }

    /// 30 wrapping agents that speed up 2.5x on hover
    pub fn button() -> Self {
        Self {
            count: 30,
            boundary: BoundaryPolicy::Wrap,
            cohesion: None,
            speed_limit: None,
            hover_multiplier: 2.5,
            agent_size: 1.0,
        }
    }

    pub fn from_settings(settings: &FlockSettings) -> Result<Self, FlockError> {
        let config = Self {
            count: agent_count(settings.count)?,
            boundary: settings.boundary.into(),
            cohesion: settings.cohesion.map(|c| Cohesion {
                radius: c.radius,
                gain: c.gain,
            }),
            speed_limit: settings.max_speed.map(|max| SpeedLimit {
                max,
                limit_scaled_step: settings.limit_scaled_step,
            }),
            hover_multiplier: settings.hover_multiplier,
            agent_size: settings.agent_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FlockError> {
        if self.count == 0 {
            return Err(FlockError::InvalidCount(0));
        }
        if !self.hover_multiplier.is_finite() || self.hover_multiplier <= 0.0 {
            return Err(FlockError::InvalidSetting("hover_multiplier"));
        }
        if !self.agent_size.is_finite() || self.agent_size < 0.0 {
            return Err(FlockError::InvalidSetting("agent_size"));
        }
        if let Some(cohesion) = self.cohesion {
            if !cohesion.radius.is_finite() || cohesion.radius < 0.0 {
                return Err(FlockError::InvalidSetting("cohesion.radius"));
            }
            if !cohesion.gain.is_finite() {
                return Err(FlockError::InvalidSetting("cohesion.gain"));
            }
        }
        if let Some(limit) = self.speed_limit {
            if !limit.max.is_finite() || limit.max <= 0.0 {
                return Err(FlockError::InvalidSetting("max_speed"));
            }
        }
        Ok(())
    }
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self::canvas()
    }
}

/// Convert a host-supplied count; zero and negatives are errors, not no-ops.
pub fn agent_count(requested: i64) -> Result<usize, FlockError> {
    if requested <= 0 {
        return Err(FlockError::InvalidCount(requested));
    }
    usize::try_from(requested).map_err(|_| FlockError::InvalidCount(requested))
}

/// Initial velocity half range from settings; needs one entry per axis
pub fn velocity_range<V: Vector>(settings: &FlockSettings) -> Result<V, FlockError> {
    if settings.velocity_range.len() != V::AXES {
        return Err(FlockError::InvalidSetting("velocity_range"));
    }
    let mut range = V::zero();
    for (axis, half) in settings.velocity_range.iter().enumerate() {
        if !half.is_finite() {
            return Err(FlockError::InvalidSetting("velocity_range"));
        }
        *range.axis_mut(axis) = half.abs();
    }
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{Vector2D, Vector3D};

    #[test]
    fn test_agent_count_rejects_zero_and_negative() {
        assert_eq!(agent_count(0), Err(FlockError::InvalidCount(0)));
        assert_eq!(agent_count(-4), Err(FlockError::InvalidCount(-4)));
        assert_eq!(agent_count(15), Ok(15));
    }

    #[test]
    fn test_presets_match_settings() {
        assert_eq!(
            FlockConfig::from_settings(&FlockSettings::canvas()).unwrap(),
            FlockConfig::canvas()
        );
        assert_eq!(
            FlockConfig::from_settings(&FlockSettings::button()).unwrap(),
            FlockConfig::button()
        );
    }

    #[test]
    fn test_bad_settings_are_rejected() {
        let mut settings = FlockSettings::canvas();
        settings.count = -1;
        assert_eq!(
            FlockConfig::from_settings(&settings),
            Err(FlockError::InvalidCount(-1))
        );

        let mut settings = FlockSettings::button();
        settings.hover_multiplier = 0.0;
        assert_eq!(
            FlockConfig::from_settings(&settings),
            Err(FlockError::InvalidSetting("hover_multiplier"))
        );

        let mut settings = FlockSettings::canvas();
        settings.max_speed = Some(-1.5);
        assert_eq!(
            FlockConfig::from_settings(&settings),
            Err(FlockError::InvalidSetting("max_speed"))
        );
    }

    #[test]
    fn test_velocity_range_needs_one_entry_per_axis() {
        let settings = FlockSettings::button();
        let range: Vector3D = velocity_range(&settings).unwrap();
        assert_eq!(range, Vector3D::new(0.15, 0.15, 0.05));
        assert_eq!(
            velocity_range::<Vector2D>(&settings),
            Err(FlockError::InvalidSetting("velocity_range"))
        );
    }
}
