//! Read-only copies of simulation state for renderers.

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::Serialize;

use crate::geometry::Point;
use crate::material::Material;
use crate::structure::Structure;

/// State of one particle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParticleState {
    /// Particle index.
    pub id: NodeIndex,
    /// Current position.
    pub position: Point,
    /// Whether the particle is fixed.
    pub pinned: bool,
}

/// State of one member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemberState {
    /// Member index.
    pub id: MemberId,
    /// First endpoint.
    pub start: NodeIndex,
    /// Second endpoint.
    pub end: NodeIndex,
    /// Material tag.
    pub material: Material,
    /// Length measured during the latest evaluation.
    pub current_length: f64,
    /// Normalised deformation for display.
    pub stress: f64,
    /// Whether the member has broken.
    pub failed: bool,
}

/// Identifier of a member in snapshots and results.
pub type MemberId = EdgeIndex;

/// Everything a renderer needs to draw one step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    /// Steps completed when the snapshot was taken.
    pub step: usize,
    /// Every particle, in index order.
    pub particles: Vec<ParticleState>,
    /// Every member, in index order.
    pub members: Vec<MemberState>,
}

impl Snapshot {
    /// Copy the current state of `structure`.
    #[must_use]
    pub fn capture(structure: &Structure, step: usize) -> Self {
        let particles = structure
            .particles()
            .map(|(id, particle)| ParticleState {
                id,
                position: particle.position(),
                pinned: particle.is_pinned(),
            })
            .collect();
        let members = structure
            .members()
            .filter_map(|(id, member)| {
                let (start, end) = structure.member_endpoints(id)?;
                Some(MemberState {
                    id,
                    start,
                    end,
                    material: member.material(),
                    current_length: member.current_length(),
                    stress: member.stress(),
                    failed: member.is_failed(),
                })
            })
            .collect();
        Self {
            step,
            particles,
            members,
        }
    }
}
