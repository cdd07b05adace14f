//! Orientation of agents for the renderers.
//!
//! The 3D convention matches a scene-graph `lookAt` on a non-camera object:
//! the local +Z axis points along the velocity and +Y stays as close to world
//! up as possible.

use crate::flock::Agent;
use crate::vector::{Vector, Vector2D, Vector3D};

/// Angle of the velocity in radians, for rotating a 2D sprite
pub fn heading(velocity: &Vector2D) -> f32 {
    velocity.y.atan2(velocity.x)
}

/// Orthonormal basis of an oriented agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub x: Vector3D,
    pub y: Vector3D,
    pub z: Vector3D,
}

impl Basis {
    pub fn identity() -> Self {
        Self {
            x: Vector3D::new(1.0, 0.0, 0.0),
            y: Vector3D::new(0.0, 1.0, 0.0),
            z: Vector3D::new(0.0, 0.0, 1.0),
        }
    }
}

/// Rotation that turns +Z toward `forward`; a zero velocity keeps the identity
pub fn look_rotation(forward: &Vector3D) -> Basis {
    let up = Vector3D::new(0.0, 1.0, 0.0);
    let mut z = forward.normalize();
    if z == Vector3D::zero() {
        return Basis::identity();
    }

    let mut x = up.cross(&z);
    if x.magnitude() == 0.0 {
        // Forward is parallel to up; nudge it off the pole
        z.z += 0.0001;
        z = z.normalize();
        x = up.cross(&z);
    }
    let x = x.normalize();
    let y = z.cross(&x);

    Basis { x, y, z }
}

/// Column-major 4x4 transform placing the agent at its position, facing its velocity
pub fn instance_matrix(agent: &Agent<Vector3D>) -> [f32; 16] {
    let Basis { x, y, z } = look_rotation(&agent.velocity);
    let p = agent.position;
    [
        x.x, x.y, x.z, 0.0, //
        y.x, y.y, y.z, 0.0, //
        z.x, z.y, z.z, 0.0, //
        p.x, p.y, p.z, 1.0,
    ]
}
