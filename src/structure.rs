//! Particle and member storage for a structure under test.

use std::collections::HashMap;

use nalgebra::Vector2;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::errors::StructureError;
use crate::geometry::Point;
use crate::material::{Material, MaterialTable};

/// A point mass moved by Verlet integration.
#[derive(Clone, Debug)]
pub struct Particle {
    /// Current position.
    pub(crate) position: Vector2<f64>,
    /// Position one step ago; the difference to `position` is the velocity.
    pub(crate) previous: Vector2<f64>,
    /// Position at construction, restored on reset.
    pub(crate) rest: Vector2<f64>,
    /// Whether integration and relaxation leave this particle alone.
    pub(crate) pinned: bool,
    /// Pinned state at construction, restored on reset.
    pub(crate) anchored: bool,
    /// Mass scaling the gravity contribution.
    pub(crate) mass: f64,
}

impl Particle {
    /// Create a particle resting at `position`.
    fn new(position: Point, mass: f64) -> Self {
        let position = position.to_vector();
        Self {
            position,
            previous: position,
            rest: position,
            pinned: false,
            anchored: false,
            mass,
        }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position.into()
    }

    /// Position at construction.
    #[must_use]
    pub fn rest_position(&self) -> Point {
        self.rest.into()
    }

    /// Whether the particle is fixed in place.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Mass of the particle.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Distance travelled from the rest position.
    #[must_use]
    pub fn deflection(&self) -> f64 {
        (self.position - self.rest).norm()
    }
}

/// A stick holding two particles at a fixed distance until it breaks.
#[derive(Clone, Debug)]
pub struct Member {
    /// Length captured at construction.
    pub(crate) rest_length: f64,
    /// Material tag.
    pub(crate) material: Material,
    /// Deformation ratio above which the member breaks in tension.
    pub(crate) max_stretch: f64,
    /// Length measured during the latest evaluation.
    pub(crate) current_length: f64,
    /// Normalised deformation for display.
    pub(crate) stress: f64,
    /// Set once the member has broken; never cleared within a run.
    pub(crate) failed: bool,
}

impl Member {
    /// Create an intact member.
    fn new(rest_length: f64, material: Material, max_stretch: f64) -> Self {
        Self {
            rest_length,
            material,
            max_stretch,
            current_length: rest_length,
            stress: 0.0,
            failed: false,
        }
    }

    /// Length at construction.
    #[must_use]
    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    /// Length measured during the latest evaluation.
    #[must_use]
    pub fn current_length(&self) -> f64 {
        self.current_length
    }

    /// Material tag.
    #[must_use]
    pub fn material(&self) -> Material {
        self.material
    }

    /// Deformation ratio above which the member breaks in tension.
    #[must_use]
    pub fn max_stretch(&self) -> f64 {
        self.max_stretch
    }

    /// Normalised deformation for display.
    #[must_use]
    pub fn stress(&self) -> f64 {
        self.stress
    }

    /// Whether the member has broken.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Restore the pre-run state.
    fn restore(&mut self) {
        self.current_length = self.rest_length;
        self.stress = 0.0;
        self.failed = false;
    }
}

/// One member as supplied by the structure editor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
    /// Material of the member.
    #[serde(default)]
    pub material: Material,
}

/// Left and right anchors of a bridge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Left anchor location.
    pub left: Point,
    /// Right anchor location.
    pub right: Point,
}

/// Editor-facing description of a structure.
///
/// # Examples
/// ```
/// use trussim::StructureSpec;
///
/// let spec: StructureSpec = serde_json::from_str(
///     r#"{
///         "members": [
///             { "start": { "x": 0.0, "y": 0.0 }, "end": { "x": 10.0, "y": 0.0 }, "material": "wood" }
///         ],
///         "supports": [{ "x": 0.0, "y": 0.0 }]
///     }"#,
/// )
/// .expect("valid structure document");
/// assert_eq!(spec.members.len(), 1);
/// assert!(spec.span.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    /// Members in editor order.
    pub members: Vec<MemberSpec>,
    /// Locations whose particles start pinned.
    #[serde(default)]
    pub supports: Vec<Point>,
    /// Bridge anchors; enables the load-path check at run start.
    #[serde(default)]
    pub span: Option<Span>,
}

/// Particle and member graph mutated in place by a simulation run.
///
/// Particles are addressed by [`NodeIndex`] and members by [`EdgeIndex`].
/// Member endpoints closer than the merge tolerance share one particle.
#[derive(Clone, Debug)]
pub struct Structure {
    /// Particles as nodes, members as edges.
    graph: UnGraph<Particle, Member>,
    /// Particles bucketed by merge cell, built during construction.
    particle_index: HashMap<(i64, i64), Vec<NodeIndex>>,
    /// Distance under which endpoints are unified.
    merge_tolerance: f64,
    /// Mass given to new particles.
    particle_mass: f64,
    /// Thresholds used for new members.
    materials: MaterialTable,
    /// Bridge anchors, when this structure is a bridge.
    span: Option<(NodeIndex, NodeIndex)>,
}

impl Default for Structure {
    fn default() -> Self {
        Self::new()
    }
}

impl Structure {
    /// Create an empty structure using the default parameters.
    ///
    /// # Examples
    /// ```
    /// use trussim::Structure;
    ///
    /// let structure = Structure::new();
    /// assert_eq!(structure.particle_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&SimulationConfig::default())
    }

    /// Create an empty structure using the tolerance, mass and material
    /// thresholds from `config`.
    #[must_use]
    pub fn with_config(config: &SimulationConfig) -> Self {
        Self {
            graph: UnGraph::default(),
            particle_index: HashMap::new(),
            merge_tolerance: config.merge_tolerance,
            particle_mass: config.particle_mass,
            materials: config.materials,
            span: None,
        }
    }

    /// Build a structure from an editor description.
    ///
    /// Members are added first, in order, so particle indices follow member
    /// endpoints; supports and span anchors then pin existing particles or add
    /// new ones.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::DegenerateMember`] for a member whose endpoints
    /// coincide and [`StructureError::NonFiniteCoordinate`] for NaN or infinite
    /// coordinates.
    pub fn from_spec(spec: &StructureSpec, config: &SimulationConfig) -> Result<Self, StructureError> {
        let mut structure = Self::with_config(config);
        for member in &spec.members {
            structure.add_member(member.start, member.end, member.material)?;
        }
        for &support in &spec.supports {
            structure.add_support(support)?;
        }
        if let Some(span) = spec.span {
            structure.set_span(span.left, span.right)?;
        }
        Ok(structure)
    }

    /// Return the number of particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Connect two locations with a new member.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::DegenerateMember`] when both endpoints resolve
    /// to the same particle and [`StructureError::NonFiniteCoordinate`] for
    /// NaN or infinite coordinates.
    ///
    /// # Examples
    /// ```
    /// use trussim::{point, Material, Structure, StructureError};
    ///
    /// let mut structure = Structure::new();
    /// structure
    ///     .add_member(point(0.0, 0.0), point(10.0, 0.0), Material::Wood)
    ///     .expect("distinct endpoints");
    /// structure
    ///     .add_member(point(10.0, 0.0), point(5.0, 8.0), Material::Wood)
    ///     .expect("distinct endpoints");
    /// assert_eq!(structure.particle_count(), 3);
    ///
    /// let error = structure
    ///     .add_member(point(5.0, 8.0), point(5.0, 8.0), Material::Wood)
    ///     .expect_err("zero length rejected");
    /// assert!(matches!(error, StructureError::DegenerateMember { member: 2, .. }));
    /// ```
    pub fn add_member(
        &mut self,
        start: Point,
        end: Point,
        material: Material,
    ) -> Result<EdgeIndex, StructureError> {
        Self::check_finite(start)?;
        Self::check_finite(end)?;
        let rest_length = start.distance(end);
        let same_particle = matches!(
            (self.find_particle(start), self.find_particle(end)),
            (Some(a), Some(b)) if a == b
        );
        if rest_length <= self.merge_tolerance || same_particle {
            return Err(StructureError::DegenerateMember {
                member: self.member_count(),
                point: start,
            });
        }
        let a = self.particle_at(start);
        let b = self.particle_at(end);
        let member = Member::new(rest_length, material, self.materials.max_stretch(material));
        Ok(self.graph.add_edge(a, b, member))
    }

    /// Pin the particle at `at`, adding one if no member reaches it.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NonFiniteCoordinate`] for NaN or infinite
    /// coordinates.
    pub fn add_support(&mut self, at: Point) -> Result<NodeIndex, StructureError> {
        Self::check_finite(at)?;
        let node = self.particle_at(at);
        let particle = &mut self.graph[node];
        particle.pinned = true;
        particle.anchored = true;
        Ok(node)
    }

    /// Mark this structure as a bridge between two pinned anchors.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NonFiniteCoordinate`] for NaN or infinite
    /// coordinates.
    pub fn set_span(&mut self, left: Point, right: Point) -> Result<(NodeIndex, NodeIndex), StructureError> {
        let left = self.add_support(left)?;
        let right = self.add_support(right)?;
        self.span = Some((left, right));
        Ok((left, right))
    }

    /// Bridge anchors, when set.
    #[must_use]
    pub fn span(&self) -> Option<(NodeIndex, NodeIndex)> {
        self.span
    }

    /// Find the particle whose rest position lies within the merge tolerance
    /// of `at`, preferring the closest one.
    #[must_use]
    pub fn find_particle(&self, at: Point) -> Option<NodeIndex> {
        let (x, y) = at.merge_key(self.merge_tolerance);
        let mut nearest: Option<(NodeIndex, f64)> = None;
        // A point within tolerance is at most one cell away on each axis.
        for dx in -1..=1_i64 {
            for dy in -1..=1_i64 {
                let cell = (x.saturating_add(dx), y.saturating_add(dy));
                let Some(nodes) = self.particle_index.get(&cell) else {
                    continue;
                };
                for &node in nodes {
                    let distance = Point::from(self.graph[node].rest).distance(at);
                    let closer = nearest.map_or(true, |(_, best)| distance < best);
                    if distance <= self.merge_tolerance && closer {
                        nearest = Some((node, distance));
                    }
                }
            }
        }
        nearest.map(|(node, _)| node)
    }

    /// Borrow a particle.
    #[must_use]
    pub fn particle(&self, node: NodeIndex) -> Option<&Particle> {
        self.graph.node_weight(node)
    }

    /// Borrow a member.
    #[must_use]
    pub fn member(&self, edge: EdgeIndex) -> Option<&Member> {
        self.graph.edge_weight(edge)
    }

    /// Particles joined by a member.
    #[must_use]
    pub fn member_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// Iterate over every particle with its index.
    pub fn particles(&self) -> impl Iterator<Item = (NodeIndex, &Particle)> + '_ {
        self.graph
            .node_indices()
            .map(move |node| (node, &self.graph[node]))
    }

    /// Iterate over every member with its index.
    pub fn members(&self) -> impl Iterator<Item = (EdgeIndex, &Member)> + '_ {
        self.graph
            .edge_indices()
            .map(move |edge| (edge, &self.graph[edge]))
    }

    /// Indices of members that have broken.
    #[must_use]
    pub fn failed_members(&self) -> Vec<EdgeIndex> {
        self.members()
            .filter(|(_, member)| member.failed)
            .map(|(edge, _)| edge)
            .collect()
    }

    /// Fraction of members that have broken; zero for an empty structure.
    #[must_use]
    pub fn failed_fraction(&self) -> f64 {
        if self.member_count() == 0 {
            return 0.0;
        }
        self.failed_members().len() as f64 / self.member_count() as f64
    }

    /// Largest distance any particle has moved from its rest position.
    #[must_use]
    pub fn max_deflection(&self) -> f64 {
        self.graph
            .node_weights()
            .map(Particle::deflection)
            .fold(0.0, f64::max)
    }

    /// Vertical extent of the rest geometry.
    #[must_use]
    pub fn height(&self) -> f64 {
        let mut ys = self.graph.node_weights().map(|particle| particle.rest.y);
        let Some(first) = ys.next() else {
            return 0.0;
        };
        let (top, bottom) = ys.fold((first, first), |(top, bottom), y| (top.min(y), bottom.max(y)));
        bottom - top
    }

    /// Restore rest positions, initial pins and intact members.
    pub fn restore(&mut self) {
        for particle in self.graph.node_weights_mut() {
            particle.position = particle.rest;
            particle.previous = particle.rest;
            particle.pinned = particle.anchored;
        }
        for member in self.graph.edge_weights_mut() {
            member.restore();
        }
    }

    /// Borrow the underlying graph.
    pub(crate) fn graph(&self) -> &UnGraph<Particle, Member> {
        &self.graph
    }

    /// Mutably borrow the underlying graph.
    pub(crate) fn graph_mut(&mut self) -> &mut UnGraph<Particle, Member> {
        &mut self.graph
    }

    /// Look up or create the particle at `at`.
    fn particle_at(&mut self, at: Point) -> NodeIndex {
        if let Some(node) = self.find_particle(at) {
            return node;
        }
        let node = self.graph.add_node(Particle::new(at, self.particle_mass));
        self.particle_index
            .entry(at.merge_key(self.merge_tolerance))
            .or_default()
            .push(node);
        node
    }

    /// Reject NaN or infinite coordinates.
    fn check_finite(at: Point) -> Result<(), StructureError> {
        if at.is_finite() {
            Ok(())
        } else {
            Err(StructureError::NonFiniteCoordinate { point: at })
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    #[test]
    fn shared_endpoints_share_a_particle() {
        let mut structure = Structure::new();
        let ab = structure
            .add_member(point(0.0, 0.0), point(30.0, 40.0), Material::Steel)
            .expect("member added");
        let bc = structure
            .add_member(point(30.0, 40.0), point(60.0, 0.0), Material::Wood)
            .expect("member added");

        assert_eq!(structure.particle_count(), 3);
        assert_eq!(structure.member_count(), 2);
        let (_, b) = structure.member_endpoints(ab).expect("endpoints");
        let (b2, _) = structure.member_endpoints(bc).expect("endpoints");
        assert_eq!(b, b2);
        assert_relative_eq!(structure.member(ab).expect("member").rest_length(), 50.0);
    }

    #[test]
    fn endpoints_straddling_a_cell_boundary_merge() {
        let mut structure = Structure::new();
        structure
            .add_member(point(0.0, 0.0), point(99.999_999_999_9, 0.0), Material::Steel)
            .expect("member added");
        structure
            .add_member(point(100.000_000_000_1, 0.0), point(200.0, 0.0), Material::Steel)
            .expect("member added");

        assert_eq!(structure.particle_count(), 3);
        let left = structure.find_particle(point(99.999_999_999_9, 0.0));
        let right = structure.find_particle(point(100.000_000_000_1, 0.0));
        assert!(left.is_some());
        assert_eq!(left, right);
    }

    #[test]
    fn endpoints_just_beyond_tolerance_stay_apart() {
        let mut structure = Structure::new();
        structure
            .add_member(point(0.0, 0.0), point(10.0, 0.0), Material::Steel)
            .expect("member added");
        structure
            .add_member(point(10.0, 2.0e-6), point(20.0, 0.0), Material::Steel)
            .expect("member added");
        assert_eq!(structure.particle_count(), 4);
    }

    #[test]
    fn members_take_thresholds_from_their_material() {
        let mut structure = Structure::new();
        let wood = structure
            .add_member(point(0.0, 0.0), point(1.0, 0.0), Material::Wood)
            .expect("member added");
        let titanium = structure
            .add_member(point(0.0, 0.0), point(0.0, 1.0), Material::Titanium)
            .expect("member added");
        assert_eq!(structure.member(wood).expect("member").max_stretch(), 1.05);
        assert_eq!(structure.member(titanium).expect("member").max_stretch(), 1.12);
    }

    #[test]
    fn coincident_endpoints_are_rejected() {
        let mut structure = Structure::new();
        let error = structure
            .add_member(point(5.0, 5.0), point(5.0, 5.0 + 1.0e-9), Material::Steel)
            .expect_err("degenerate member rejected");
        assert_eq!(
            error,
            StructureError::DegenerateMember {
                member: 0,
                point: point(5.0, 5.0)
            }
        );
        assert_eq!(structure.particle_count(), 0);
    }

    #[test]
    fn non_finite_endpoints_are_rejected() {
        let mut structure = Structure::new();
        let error = structure
            .add_member(point(f64::NAN, 0.0), point(1.0, 0.0), Material::Steel)
            .expect_err("NaN rejected");
        assert!(matches!(error, StructureError::NonFiniteCoordinate { .. }));
    }

    #[test]
    fn supports_pin_existing_particles() {
        let mut structure = Structure::new();
        structure
            .add_member(point(0.0, 0.0), point(10.0, 0.0), Material::Steel)
            .expect("member added");
        let support = structure.add_support(point(0.0, 0.0)).expect("support added");

        assert_eq!(structure.particle_count(), 2);
        assert!(structure.particle(support).expect("particle").is_pinned());
        let free = structure.find_particle(point(10.0, 0.0)).expect("particle");
        assert!(!structure.particle(free).expect("particle").is_pinned());
    }

    #[test]
    fn span_anchors_exist_without_members() {
        let mut structure = Structure::new();
        let (left, right) = structure
            .set_span(point(100.0, 500.0), point(700.0, 500.0))
            .expect("span set");
        assert_ne!(left, right);
        assert_eq!(structure.span(), Some((left, right)));
        assert_eq!(structure.member_count(), 0);
    }

    #[test]
    fn from_spec_builds_members_then_supports() {
        let spec = StructureSpec {
            members: vec![
                MemberSpec {
                    start: point(0.0, 100.0),
                    end: point(50.0, 0.0),
                    material: Material::Wood,
                },
                MemberSpec {
                    start: point(50.0, 0.0),
                    end: point(100.0, 100.0),
                    material: Material::Wood,
                },
            ],
            supports: vec![point(0.0, 100.0), point(100.0, 100.0)],
            span: None,
        };
        let structure = Structure::from_spec(&spec, &SimulationConfig::default()).expect("valid spec");
        assert_eq!(structure.particle_count(), 3);
        assert_eq!(structure.member_count(), 2);
        assert_relative_eq!(structure.height(), 100.0);
        let pinned = structure.particles().filter(|(_, p)| p.is_pinned()).count();
        assert_eq!(pinned, 2);
    }

    #[test]
    fn restore_resets_positions_pins_and_members() {
        let mut structure = Structure::new();
        let edge = structure
            .add_member(point(0.0, 0.0), point(10.0, 0.0), Material::Steel)
            .expect("member added");
        let free = structure.find_particle(point(10.0, 0.0)).expect("particle");

        {
            let graph = structure.graph_mut();
            graph[free].position = Vector2::new(20.0, 5.0);
            graph[free].pinned = true;
            graph[edge].failed = true;
            graph[edge].stress = 2.0;
        }
        assert!(structure.max_deflection() > 0.0);
        assert_eq!(structure.failed_fraction(), 1.0);

        structure.restore();
        let particle = structure.particle(free).expect("particle");
        assert_eq!(particle.position(), point(10.0, 0.0));
        assert!(!particle.is_pinned());
        let member = structure.member(edge).expect("member");
        assert!(!member.is_failed());
        assert_eq!(member.stress(), 0.0);
        assert_eq!(structure.max_deflection(), 0.0);
    }
}
