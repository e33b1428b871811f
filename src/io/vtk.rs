//! Legacy VTK (`.vtk`) diagnostic writer for committed meshes.
//!
//! Writes an ASCII `UNSTRUCTURED_GRID` with the node coordinates, element
//! connectivity and types, plus `FIELD` arrays carrying the node/element ids
//! and, when present, element mask and area.

use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::element_type::ElementType;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const FIELD_NODE_IDS: &str = "node_ids";
const FIELD_ELEMENT_IDS: &str = "element_ids";
const FIELD_ELEMENT_MASK: &str = "element_mask";
const FIELD_ELEMENT_AREA: &str = "element_area";

#[derive(Debug, Default, Clone)]
pub struct VtkWriter;

impl VtkWriter {
    fn vtk_cell_type(ty: ElementType) -> i32 {
        match ty {
            ElementType::Triangle => 5,
            ElementType::Quadrilateral => 9,
            ElementType::Polygon(_) => 7,
            ElementType::Tetrahedron => 10,
            ElementType::Hexahedron => 12,
        }
    }

    fn write_field_array<W: Write>(
        writer: &mut W,
        name: &str,
        data_type: &str,
        values: &[String],
    ) -> Result<(), MeshError> {
        writeln!(writer, "{name} 1 {} {data_type}", values.len())?;
        let mut line_len = 0usize;
        for value in values {
            if line_len + value.len() + 1 > 70 {
                writeln!(writer)?;
                line_len = 0;
            }
            if line_len > 0 {
                write!(writer, " ")?;
                line_len += 1;
            }
            write!(writer, "{value}")?;
            line_len += value.len();
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Write `mesh` to `writer`.
    pub fn write<W: Write>(&self, mut writer: W, mesh: &Mesh) -> Result<(), MeshError> {
        let nodes = mesh.nodes()?;
        let elements = mesh.elements()?;

        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "regrid-mesh")?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
        writeln!(writer, "POINTS {} double", nodes.len())?;
        for idx in 0..nodes.len() {
            let point = nodes.point(idx).unwrap_or_default();
            let mut xyz = [0.0f64; 3];
            for (slot, value) in xyz.iter_mut().zip(point) {
                *slot = *value;
            }
            writeln!(writer, "{} {} {}", xyz[0], xyz[1], xyz[2])?;
        }

        let total_size: usize = elements.types().iter().map(|t| t.arity() + 1).sum();
        writeln!(writer, "CELLS {} {total_size}", elements.len())?;
        for idx in 0..elements.len() {
            // resolved indices are gone after free_memory; fall back to ids
            let local: Vec<usize> = match elements.resolved().and_then(|r| r.element_nodes(idx)) {
                Some(run) => run.to_vec(),
                None => elements
                    .element_connectivity(idx)
                    .unwrap_or_default()
                    .iter()
                    .map(|&node| {
                        nodes.local_index(node).ok_or(MeshError::DanglingReference {
                            element: elements.ids()[idx],
                            node,
                        })
                    })
                    .collect::<Result<_, _>>()?,
            };
            write!(writer, "{}", local.len())?;
            for node in local {
                write!(writer, " {node}")?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "CELL_TYPES {}", elements.len())?;
        for ty in elements.types() {
            writeln!(writer, "{}", Self::vtk_cell_type(*ty))?;
        }

        writeln!(writer, "POINT_DATA {}", nodes.len())?;
        writeln!(writer, "FIELD FieldData 1")?;
        let node_ids: Vec<String> = nodes.ids().iter().map(|id| id.to_string()).collect();
        Self::write_field_array(&mut writer, FIELD_NODE_IDS, "long", &node_ids)?;

        let mut cell_fields: Vec<(&str, &str, Vec<String>)> = vec![(
            FIELD_ELEMENT_IDS,
            "long",
            elements.ids().iter().map(|id| id.to_string()).collect(),
        )];
        if let Some(mask) = elements.mask() {
            cell_fields.push((
                FIELD_ELEMENT_MASK,
                "int",
                mask.iter().map(|m| m.to_string()).collect(),
            ));
        }
        if let Some(area) = elements.area() {
            cell_fields.push((
                FIELD_ELEMENT_AREA,
                "double",
                area.iter().map(|a| a.to_string()).collect(),
            ));
        }
        writeln!(writer, "CELL_DATA {}", elements.len())?;
        writeln!(writer, "FIELD FieldData {}", cell_fields.len())?;
        for (name, data_type, values) in &cell_fields {
            Self::write_field_array(&mut writer, name, data_type, values)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write `mesh` to `path` with a `.vtk` extension appended; returns the
    /// path written.
    pub fn write_file(&self, path: &Path, mesh: &Mesh) -> Result<PathBuf, MeshError> {
        let mut target = path.as_os_str().to_owned();
        target.push(".vtk");
        let target = PathBuf::from(target);
        let file = File::create(&target)?;
        self.write(BufWriter::new(file), mesh)?;
        log::debug!("wrote mesh diagnostics to {}", target.display());
        Ok(target)
    }
}
