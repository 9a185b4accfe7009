//! Slice triangulation export. The mesh is written in the z = 0 plane.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::warn;

use crate::error::{Result, SliceError};
use crate::slice::{Slice, SliceMesh};

/// Writes the mesh as an OFF file.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_off<W: Write>(mesh: &SliceMesh, mut out: W) -> Result<()> {
    writeln!(out, "OFF")?;
    writeln!(out, "{} {} 0", mesh.vertices.len(), mesh.triangles.len())?;
    for v in &mesh.vertices {
        writeln!(out, "{} {} 0", v.x, v.y)?;
    }
    for [a, b, c] in &mesh.triangles {
        writeln!(out, "3 {a} {b} {c}")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes the mesh as an ASCII STL file.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_stl<W: Write>(mesh: &SliceMesh, mut out: W) -> Result<()> {
    writeln!(out, "solid slice")?;
    for i in 0..mesh.num_triangles() {
        writeln!(out, "  facet normal 0 0 1")?;
        writeln!(out, "    outer loop")?;
        for p in mesh.triangle(i) {
            writeln!(out, "      vertex {} {} 0", p.x, p.y)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid slice")?;
    out.flush()?;
    Ok(())
}

impl Slice {
    /// Saves the triangulation; the format follows the extension (`off` or
    /// `stl`). Returns `false`, with a warning, if there is nothing to save.
    ///
    /// # Errors
    ///
    /// Returns an error for any other extension or if writing fails.
    pub fn save(&self, path: &Path) -> Result<bool> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let writer: fn(&SliceMesh, BufWriter<File>) -> Result<()> = match extension.as_deref() {
            Some("off") => write_off,
            Some("stl") => write_stl,
            _ => {
                return Err(SliceError::InvalidParameters(format!(
                    "unsupported slice format: {}",
                    path.display()
                ))
                .into());
            }
        };
        let Some(mesh) = self.mesh().filter(|m| !m.is_empty()) else {
            warn!(path = %path.display(), "bad slice, nothing to save");
            return Ok(false);
        };
        writer(mesh, BufWriter::new(File::create(path)?))?;
        Ok(true)
    }
}
