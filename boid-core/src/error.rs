use core::fmt;

/// Rejected flock inputs
#[derive(Debug, Clone, PartialEq)]
pub enum FlockError {
    /// Agent count was zero or negative
    InvalidCount(i64),
    /// A bounds axis had a non-positive or non-finite extent
    InvalidBounds { axis: usize, extent: f32 },
    /// A setting was out of range; names the setting
    InvalidSetting(&'static str),
}

impl fmt::Display for FlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlockError::InvalidCount(count) => {
                write!(f, "agent count must be positive, got {count}")
            }
            FlockError::InvalidBounds { axis, extent } => {
                write!(f, "bounds axis {axis} must have a positive extent, got {extent}")
            }
            FlockError::InvalidSetting(name) => write!(f, "invalid setting `{name}`"),
        }
    }
}

impl std::error::Error for FlockError {}
