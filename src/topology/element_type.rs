//! Element topology tags and mesh locations.

use crate::mesh_error::MeshError;
use std::fmt;

/// Supported element topologies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ElementType {
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 2D polygon with `n >= 5` vertices.
    Polygon(u8),
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

impl ElementType {
    /// Integer code used by the native library for tetrahedra.
    pub const TETRA_CODE: i32 = 10;
    /// Integer code used by the native library for hexahedra.
    pub const HEX_CODE: i32 = 12;
    /// Smallest node count of a [`ElementType::Polygon`]; fewer nodes are
    /// triangles or quads.
    pub const MIN_POLYGON_NODES: usize = 5;

    /// Polygon with `n` nodes, or `None` when `n` is below
    /// [`Self::MIN_POLYGON_NODES`].
    pub fn polygon(n: u8) -> Option<Self> {
        (n as usize >= Self::MIN_POLYGON_NODES).then_some(ElementType::Polygon(n))
    }

    /// Returns the topological dimension of the element.
    pub fn dimension(self) -> usize {
        match self {
            ElementType::Triangle | ElementType::Quadrilateral | ElementType::Polygon(_) => 2,
            ElementType::Tetrahedron | ElementType::Hexahedron => 3,
        }
    }

    /// Number of node ids in this element's connectivity run.
    pub fn arity(self) -> usize {
        match self {
            ElementType::Triangle => 3,
            ElementType::Quadrilateral | ElementType::Tetrahedron => 4,
            ElementType::Polygon(n) => n as usize,
            ElementType::Hexahedron => 8,
        }
    }

    /// Native integer code: 2D types are coded by node count.
    pub fn code(self) -> i32 {
        match self {
            ElementType::Tetrahedron => Self::TETRA_CODE,
            ElementType::Hexahedron => Self::HEX_CODE,
            other => other.arity() as i32,
        }
    }

    /// Decode a native element code for a mesh of the given parametric dimension.
    pub fn from_code(code: i32, parametric_dim: usize) -> Result<Self, MeshError> {
        let ty = match (parametric_dim, code) {
            (2, 3) => ElementType::Triangle,
            (2, 4) => ElementType::Quadrilateral,
            (2, n) if (Self::MIN_POLYGON_NODES as i32..=u8::MAX as i32).contains(&n) => {
                ElementType::Polygon(n as u8)
            }
            (3, Self::TETRA_CODE) => ElementType::Tetrahedron,
            (3, Self::HEX_CODE) => ElementType::Hexahedron,
            _ => {
                return Err(MeshError::Configuration(format!(
                    "element code {code} is not valid for parametric dimension {parametric_dim}"
                )));
            }
        };
        Ok(ty)
    }
}

/// Placement of coordinates and field values on a mesh.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize,
)]
pub enum MeshLocation {
    Node,
    Element,
}

impl MeshLocation {
    /// Both locations, in coordinate-store index order.
    pub const ALL: [MeshLocation; 2] = [MeshLocation::Node, MeshLocation::Element];

    /// Position of this location in `[location][dimension]` indexing.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            MeshLocation::Node => 0,
            MeshLocation::Element => 1,
        }
    }
}

impl fmt::Display for MeshLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshLocation::Node => f.write_str("node"),
            MeshLocation::Element => f.write_str("element"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_per_dimension() {
        for ty in [
            ElementType::Triangle,
            ElementType::Quadrilateral,
            ElementType::Polygon(6),
        ] {
            assert_eq!(ElementType::from_code(ty.code(), 2).unwrap(), ty);
        }
        for ty in [ElementType::Tetrahedron, ElementType::Hexahedron] {
            assert_eq!(ElementType::from_code(ty.code(), 3).unwrap(), ty);
        }
    }

    #[test]
    fn code_four_depends_on_dimension() {
        assert_eq!(
            ElementType::from_code(4, 2).unwrap(),
            ElementType::Quadrilateral
        );
        assert!(ElementType::from_code(4, 3).is_err());
        assert!(ElementType::from_code(12, 2).is_ok_and(|t| t == ElementType::Polygon(12)));
    }

    #[test]
    fn polygon_constructor_rejects_small_counts() {
        assert_eq!(ElementType::polygon(4), None);
        assert_eq!(ElementType::polygon(0), None);
        assert_eq!(ElementType::polygon(5), Some(ElementType::Polygon(5)));
    }

    #[test]
    fn arity_and_dimension() {
        assert_eq!(ElementType::Hexahedron.arity(), 8);
        assert_eq!(ElementType::Hexahedron.dimension(), 3);
        assert_eq!(ElementType::Polygon(7).arity(), 7);
        assert_eq!(ElementType::Polygon(7).dimension(), 2);
    }
}
