//! Gmsh `.msh` importer.
//!
//! # Supported format
//! - ASCII `.msh` version **2.2**.
//! - Element types: 2 (triangle), 3 (quad), 4 (tet), 5 (hex).
//!
//! # Limitations
//! - Binary files and `.msh` v4.x are not supported.
//! - Only elements of the highest dimension present are kept; lower-dimensional
//!   entities (boundary lines, faces, points) and prisms/pyramids are skipped
//!   with an import notice.
//! - Element tags are ignored.
//! - All nodes are owned by partition 0.

use crate::io::{ImportedMesh, MeshImporter, unsupported_format};
use crate::mesh::options::{FileFormat, ImportOptions};
use crate::mesh_error::{Advisory, MeshError};
use crate::topology::element_type::ElementType;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::SplitWhitespace;

/// Gmsh `.msh` reader for ASCII v2.2 meshes.
#[derive(Debug, Default, Clone)]
pub struct GmshReader;

/// Raw element record before dimension filtering.
struct RawElement {
    id: i64,
    kind: Option<ElementType>,
    gmsh_type: u32,
    nodes: Vec<i64>,
}

impl GmshReader {
    fn parse_version(line: &str) -> Result<&str, MeshError> {
        let mut parts = line.split_whitespace();
        let version = parts
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing mesh format version".into()))?;
        let file_type = parts
            .next()
            .ok_or_else(|| MeshError::MeshIoParse("missing mesh format type".into()))?;
        if file_type != "0" {
            return Err(MeshError::MeshIoParse(
                "binary .msh files are not supported".into(),
            ));
        }
        Ok(version)
    }

    fn element_node_count(elem_type: u32) -> Option<usize> {
        match elem_type {
            1 => Some(2),  // line
            2 => Some(3),  // triangle
            3 => Some(4),  // quad
            4 => Some(4),  // tet
            5 => Some(8),  // hex
            6 => Some(6),  // prism
            7 => Some(5),  // pyramid
            15 => Some(1), // point
            _ => None,
        }
    }

    fn element_type(elem_type: u32) -> Option<ElementType> {
        match elem_type {
            2 => Some(ElementType::Triangle),
            3 => Some(ElementType::Quadrilateral),
            4 => Some(ElementType::Tetrahedron),
            5 => Some(ElementType::Hexahedron),
            _ => None,
        }
    }

    fn parse_id(raw: &str, what: &str) -> Result<i64, MeshError> {
        raw.parse::<i64>()
            .map_err(|_| MeshError::MeshIoParse(format!("invalid {what} id: {raw}")))
    }

    fn parse_coord(raw: &str) -> Result<f64, MeshError> {
        raw.parse::<f64>()
            .map_err(|_| MeshError::MeshIoParse(format!("invalid coordinate: {raw}")))
    }

    fn parse_count(line: Option<&str>, what: &str) -> Result<usize, MeshError> {
        let line = line.ok_or_else(|| MeshError::MeshIoParse(format!("missing {what} count")))?;
        line.trim()
            .parse::<usize>()
            .map_err(|_| MeshError::MeshIoParse(format!("invalid {what} count: {line}")))
    }

    fn expect_end(line: Option<&str>, marker: &str) -> Result<(), MeshError> {
        match line {
            Some(l) if l.trim() == marker => Ok(()),
            _ => Err(MeshError::MeshIoParse(format!("missing {marker}"))),
        }
    }

    fn parse_element(line: &str) -> Result<RawElement, MeshError> {
        let mut parts = line.split_whitespace();
        let id = Self::parse_id(next_field(&mut parts, "id")?, "element")?;
        let gmsh_type = next_field(&mut parts, "type")?
            .parse::<u32>()
            .map_err(|_| MeshError::MeshIoParse("invalid element type".into()))?;
        let node_count = Self::element_node_count(gmsh_type).ok_or_else(|| {
            MeshError::MeshIoParse(format!("unsupported element type: {gmsh_type}"))
        })?;
        let num_tags = next_field(&mut parts, "tag count")?
            .parse::<usize>()
            .map_err(|_| MeshError::MeshIoParse("invalid element tag count".into()))?;
        for _ in 0..num_tags {
            next_field(&mut parts, "tag")?;
        }
        let nodes = (0..node_count)
            .map(|_| Self::parse_id(next_field(&mut parts, "node id")?, "node"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawElement {
            id,
            kind: Self::element_type(gmsh_type),
            gmsh_type,
            nodes,
        })
    }

    /// Parse mesh arrays from a reader.
    pub fn read<R: Read>(&self, mut reader: R) -> Result<ImportedMesh, MeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut lines = contents.lines();

        let mut version: Option<String> = None;
        let mut nodes: Vec<(i64, [f64; 3])> = Vec::new();
        let mut elements: Vec<RawElement> = Vec::new();

        while let Some(line) = lines.next() {
            match line.trim() {
                "$MeshFormat" => {
                    let format_line = lines
                        .next()
                        .ok_or_else(|| MeshError::MeshIoParse("missing MeshFormat".into()))?;
                    version = Some(Self::parse_version(format_line)?.to_string());
                    Self::expect_end(lines.next(), "$EndMeshFormat")?;
                }
                "$Nodes" => {
                    let node_count = Self::parse_count(lines.next(), "node")?;
                    for _ in 0..node_count {
                        let node_line = lines.next().ok_or_else(|| {
                            MeshError::MeshIoParse("unexpected end of node list".into())
                        })?;
                        let parts: Vec<&str> = node_line.split_whitespace().collect();
                        let [id, x, y, z] = parts[..] else {
                            return Err(MeshError::MeshIoParse(format!(
                                "malformed node line: {node_line}"
                            )));
                        };
                        nodes.push((
                            Self::parse_id(id, "node")?,
                            [
                                Self::parse_coord(x)?,
                                Self::parse_coord(y)?,
                                Self::parse_coord(z)?,
                            ],
                        ));
                    }
                    Self::expect_end(lines.next(), "$EndNodes")?;
                }
                "$Elements" => {
                    let elem_count = Self::parse_count(lines.next(), "element")?;
                    for _ in 0..elem_count {
                        let elem_line = lines.next().ok_or_else(|| {
                            MeshError::MeshIoParse("unexpected end of element list".into())
                        })?;
                        elements.push(Self::parse_element(elem_line)?);
                    }
                    Self::expect_end(lines.next(), "$EndElements")?;
                }
                _ => {
                    // ignore other sections
                }
            }
        }

        let version = version.unwrap_or_else(|| "2.2".to_string());
        if version != "2.2" {
            return Err(MeshError::MeshIoParse(format!(
                "unsupported gmsh version: {version}"
            )));
        }

        Ok(Self::assemble(nodes, elements))
    }

    fn assemble(nodes: Vec<(i64, [f64; 3])>, elements: Vec<RawElement>) -> ImportedMesh {
        let parametric_dim = elements
            .iter()
            .filter_map(|e| e.kind.map(|k| k.dimension()))
            .max();
        let flat = nodes.iter().all(|(_, xyz)| xyz[2] == 0.0);
        let spatial_dim = if flat && parametric_dim != Some(3) { 2 } else { 3 };

        let mut mesh = ImportedMesh {
            spatial_dim,
            node_owners: vec![0; nodes.len()],
            ..ImportedMesh::default()
        };
        for (id, xyz) in &nodes {
            mesh.node_ids.push(*id);
            mesh.node_coords.extend_from_slice(&xyz[..spatial_dim]);
        }

        let mut skipped = 0usize;
        for elem in elements {
            match elem.kind {
                Some(kind) if Some(kind.dimension()) == parametric_dim => {
                    mesh.element_ids.push(elem.id);
                    mesh.element_types.push(kind);
                    mesh.connectivity.extend(elem.nodes);
                }
                _ => {
                    log::trace!("skipping gmsh element {} of type {}", elem.id, elem.gmsh_type);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            mesh.advisories.push(Advisory::ImportNotice(format!(
                "skipped {skipped} gmsh elements below the mesh dimension or of unsupported type"
            )));
        }
        mesh
    }
}

fn next_field<'a>(parts: &mut SplitWhitespace<'a>, what: &str) -> Result<&'a str, MeshError> {
    parts
        .next()
        .ok_or_else(|| MeshError::MeshIoParse(format!("missing element {what}")))
}

impl MeshImporter for GmshReader {
    fn supports(&self, format: FileFormat) -> bool {
        format == FileFormat::Gmsh
    }

    fn import_mesh(
        &self,
        path: &Path,
        format: FileFormat,
        options: &ImportOptions,
    ) -> Result<ImportedMesh, MeshError> {
        if !self.supports(format) {
            return Err(unsupported_format(format));
        }
        let file = File::open(path)?;
        let mut mesh = self.read(BufReader::new(file))?;
        mesh.advisories
            .extend(options.non_default().into_iter().map(|option| Advisory::IgnoredOption {
                option,
                reason: "is not supported for Gmsh files",
            }));
        Ok(mesh)
    }
}
