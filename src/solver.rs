//! Verlet integration and stick-constraint relaxation.
//!
//! Each step integrates every free particle, clamps it into the domain and
//! then runs a fixed number of relaxation passes over the intact members.
//! Members are evaluated for failure before each correction, so a member
//! breaks as soon as any pass sees it outside its allowed band.

use nalgebra::Vector2;
use petgraph::graph::EdgeIndex;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::failure;
use crate::structure::{Particle, Structure};

/// Advance every free particle by one step.
///
/// `forces` is indexed by particle index; missing entries count as zero.
/// Particles reaching the floor are pinned from then on.
pub fn integrate(structure: &mut Structure, forces: &[Vector2<f64>], config: &SimulationConfig) {
    let graph = structure.graph_mut();
    for node in graph.node_indices() {
        let force = forces.get(node.index()).copied().unwrap_or_else(Vector2::zeros);
        let particle = &mut graph[node];
        if particle.pinned {
            continue;
        }

        let velocity = (particle.position - particle.previous) * config.damping;
        particle.previous = particle.position;
        particle.position += velocity;
        particle.position.y += config.gravity * particle.mass;
        particle.position += force;
        confine(particle, config);
    }
}

/// Clamp a free particle into the domain, pinning it once it reaches the floor.
fn confine(particle: &mut Particle, config: &SimulationConfig) {
    particle.position.x = particle.position.x.clamp(0.0, config.width);
    particle.position.y = particle.position.y.clamp(0.0, config.height);
    if particle.position.y >= config.height {
        particle.pinned = true;
        particle.previous = particle.position;
    }
}

/// Run the configured number of relaxation passes over the intact members.
///
/// Returns the members that broke during these passes, in the order they
/// broke.
pub fn relax(structure: &mut Structure, config: &SimulationConfig) -> Vec<EdgeIndex> {
    let mut newly_failed = Vec::new();
    let graph = structure.graph_mut();
    let edges: Vec<EdgeIndex> = graph.edge_indices().collect();

    for _ in 0..config.constraint_iterations {
        for &edge in &edges {
            if graph[edge].failed {
                continue;
            }
            let Some((a, b)) = graph.edge_endpoints(edge) else {
                continue;
            };
            let delta = graph[b].position - graph[a].position;
            let distance = delta.norm().max(config.min_distance);

            let member = &mut graph[edge];
            let verdict = failure::evaluate(
                distance,
                member.rest_length,
                member.max_stretch,
                config.stress_scale,
            );
            member.current_length = distance;
            member.stress = verdict.stress;
            if verdict.failed {
                member.failed = true;
                debug!(member = edge.index(), ratio = verdict.ratio, "member failed");
                newly_failed.push(edge);
                continue;
            }

            // Half of the length error goes to each free endpoint.
            let correction = delta * ((distance - member.rest_length) / distance * 0.5);
            if !graph[a].pinned {
                graph[a].position += correction;
            }
            if !graph[b].pinned {
                graph[b].position -= correction;
            }
        }
    }
    newly_failed
}

/// Refresh the measured length of broken members so renderers can draw them.
fn measure_failed(structure: &mut Structure) {
    let graph = structure.graph_mut();
    for edge in graph.edge_indices() {
        if !graph[edge].failed {
            continue;
        }
        if let Some((a, b)) = graph.edge_endpoints(edge) {
            let length = (graph[b].position - graph[a].position).norm();
            graph[edge].current_length = length;
        }
    }
}

/// Integrate, relax and return the members that broke during this step.
///
/// Relaxation can carry particles past the domain edge, so free particles are
/// confined again before the step ends.
pub fn step(structure: &mut Structure, forces: &[Vector2<f64>], config: &SimulationConfig) -> Vec<EdgeIndex> {
    integrate(structure, forces, config);
    let newly_failed = relax(structure, config);
    for particle in structure.graph_mut().node_weights_mut() {
        if !particle.pinned {
            confine(particle, config);
        }
    }
    measure_failed(structure);
    newly_failed
}
