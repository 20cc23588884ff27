//! Graph queries over the member adjacency.
//!
//! Both queries look at topology only. Broken members still count, since the
//! questions are asked of the structure as it was designed.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;

use crate::structure::Structure;

/// Count the distinct 3-cycles in the member graph.
///
/// Duplicate members between the same pair of particles contribute one edge.
///
/// # Examples
/// ```
/// use trussim::{point, topology, Material, Structure};
///
/// let mut structure = Structure::new();
/// let (a, b, c) = (point(0.0, 0.0), point(10.0, 0.0), point(5.0, 8.0));
/// structure.add_member(a, b, Material::Steel).expect("valid member");
/// structure.add_member(b, c, Material::Steel).expect("valid member");
/// assert_eq!(topology::triangle_count(&structure), 0);
///
/// structure.add_member(c, a, Material::Steel).expect("valid member");
/// assert_eq!(topology::triangle_count(&structure), 1);
/// ```
#[must_use]
pub fn triangle_count(structure: &Structure) -> usize {
    let mut adjacency: BTreeMap<NodeIndex, BTreeSet<NodeIndex>> = BTreeMap::new();
    for (edge, _) in structure.members() {
        if let Some((a, b)) = structure.member_endpoints(edge) {
            adjacency.entry(a).or_default().insert(b);
            adjacency.entry(b).or_default().insert(a);
        }
    }

    let mut triangles = HashSet::new();
    for (&v1, first) in &adjacency {
        for &v2 in first {
            for &v3 in &adjacency[&v2] {
                if v3 != v1 && adjacency[&v3].contains(&v1) {
                    let mut key = [v1, v2, v3];
                    key.sort();
                    triangles.insert(key);
                }
            }
        }
    }
    triangles.len()
}

/// Whether a chain of members connects `from` to `to`, found breadth first.
#[must_use]
pub fn has_load_path(structure: &Structure, from: NodeIndex, to: NodeIndex) -> bool {
    let graph = structure.graph();
    if graph.node_weight(from).is_none() || graph.node_weight(to).is_none() {
        return false;
    }
    let mut search = Bfs::new(graph, from);
    while let Some(node) = search.next(graph) {
        if node == to {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point;
    use crate::material::Material;

    #[test]
    fn closed_cycle_counts_once() {
        let mut structure = Structure::new();
        let (a, b, c) = (point(0.0, 0.0), point(10.0, 0.0), point(5.0, 8.0));
        structure.add_member(a, b, Material::Steel).expect("member added");
        structure.add_member(b, c, Material::Steel).expect("member added");
        structure.add_member(c, a, Material::Steel).expect("member added");
        assert_eq!(triangle_count(&structure), 1);

        // A doubled member does not create another triangle.
        structure.add_member(b, a, Material::Wood).expect("member added");
        assert_eq!(triangle_count(&structure), 1);
    }

    #[test]
    fn braced_square_has_four_triangles() {
        let mut structure = Structure::new();
        let corners = [
            point(0.0, 0.0),
            point(10.0, 0.0),
            point(10.0, 10.0),
            point(0.0, 10.0),
        ];
        for (start, end) in corners.iter().zip(corners.iter().cycle().skip(1)) {
            structure.add_member(*start, *end, Material::Steel).expect("member added");
        }
        assert_eq!(triangle_count(&structure), 0);

        structure
            .add_member(corners[0], corners[2], Material::Steel)
            .expect("member added");
        assert_eq!(triangle_count(&structure), 2);

        // Crossing diagonals share no particle at their crossing point.
        structure
            .add_member(corners[1], corners[3], Material::Steel)
            .expect("member added");
        assert_eq!(triangle_count(&structure), 4);
    }

    #[test]
    fn load_path_follows_members() {
        let mut structure = Structure::new();
        structure
            .add_member(point(100.0, 500.0), point(300.0, 450.0), Material::Steel)
            .expect("member added");
        structure
            .add_member(point(300.0, 450.0), point(500.0, 500.0), Material::Steel)
            .expect("member added");
        let (left, right) = structure
            .set_span(point(100.0, 500.0), point(700.0, 500.0))
            .expect("span set");
        assert!(!has_load_path(&structure, left, right));

        structure
            .add_member(point(500.0, 500.0), point(700.0, 500.0), Material::Steel)
            .expect("member added");
        assert!(has_load_path(&structure, left, right));
    }

    #[test]
    fn unknown_particles_have_no_path() {
        let structure = Structure::new();
        assert!(!has_load_path(&structure, NodeIndex::new(0), NodeIndex::new(1)));
    }
}
