//! MEDIT `.mesh` volume listings.
//!
//! Only in-complex cells and the vertices they use are written. Tetrahedra
//! carry their subdomain as reference; tagged facets are written as
//! `Triangles` whose reference numbers a patch, starting at 1 in sorted patch
//! order. The reader rebuilds facet tags from the tetrahedron references and
//! ignores the triangle section.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::complex::{MeshComplex, PatchIndex, SubdomainIndex, VertexId};
use crate::error::{ComplexError, Result};
use crate::math::Point3;

/// Writes the complex in MEDIT format.
///
/// Returns the patch table: reference `k` in the `Triangles` section stands
/// for `table[k - 1]`.
///
/// # Errors
///
/// Returns an error if writing fails or a cell references a missing vertex.
pub fn write_medit<W: Write>(complex: &MeshComplex, mut out: W) -> Result<Vec<PatchIndex>> {
    let mut numbering: HashMap<VertexId, usize> = HashMap::new();
    let mut points: Vec<Point3> = Vec::new();
    let mut tets: Vec<([usize; 4], SubdomainIndex)> = Vec::new();
    for (_, cell) in complex.cells_in_complex() {
        let mut tet = [0usize; 4];
        for (slot, &v) in tet.iter_mut().zip(&cell.vertices) {
            *slot = match numbering.get(&v) {
                Some(&n) => n,
                None => {
                    points.push(complex.vertex(v)?.point);
                    numbering.insert(v, points.len());
                    points.len()
                }
            };
        }
        tets.push((tet, cell.subdomain));
    }

    let table: Vec<PatchIndex> = complex
        .facets_in_complex()
        .map(|(_, p)| *p)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let patch_ref: HashMap<PatchIndex, usize> =
        table.iter().enumerate().map(|(i, p)| (*p, i + 1)).collect();

    let mut triangles: Vec<([usize; 3], usize)> = Vec::new();
    for (key, patch) in complex.facets_in_complex() {
        let mut tri = [0usize; 3];
        for (slot, v) in tri.iter_mut().zip(key.vertices()) {
            *slot = *numbering.get(&v).ok_or_else(|| {
                ComplexError::Invalid("tagged facet outside the complex".into())
            })?;
        }
        triangles.push((tri, patch_ref.get(patch).copied().unwrap_or(0)));
    }
    triangles.sort_unstable();

    writeln!(out, "MeshVersionFormatted 1")?;
    writeln!(out, "Dimension 3")?;
    writeln!(out, "Vertices")?;
    writeln!(out, "{}", points.len())?;
    for p in &points {
        writeln!(out, "{} {} {} 0", p.x, p.y, p.z)?;
    }
    writeln!(out, "Triangles")?;
    writeln!(out, "{}", triangles.len())?;
    for ([a, b, c], r) in &triangles {
        writeln!(out, "{a} {b} {c} {r}")?;
    }
    writeln!(out, "Tetrahedra")?;
    writeln!(out, "{}", tets.len())?;
    for ([a, b, c, d], r) in &tets {
        writeln!(out, "{a} {b} {c} {d} {r}")?;
    }
    writeln!(out, "End")?;
    out.flush()?;

    debug!(
        vertices = points.len(),
        triangles = triangles.len(),
        tetrahedra = tets.len(),
        patches = table.len(),
        "complex written"
    );
    Ok(table)
}

/// Saves the complex to a `.mesh` file. See [`write_medit`].
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_medit(complex: &MeshComplex, path: &Path) -> Result<Vec<PatchIndex>> {
    let file = File::create(path)?;
    write_medit(complex, BufWriter::new(file))
}

/// Whitespace-separated tokens tagged with their 1-based line number.
struct Tokens {
    items: Vec<(usize, String)>,
    pos: usize,
    last_line: usize,
}

impl Tokens {
    fn read<R: BufRead>(input: R) -> Result<Self> {
        let mut items = Vec::new();
        let mut last_line = 0;
        for (n, line) in input.lines().enumerate() {
            let line = line?;
            last_line = n + 1;
            let content = line.split('#').next().unwrap_or_default();
            items.extend(content.split_whitespace().map(|t| (n + 1, t.to_owned())));
        }
        Ok(Self {
            items,
            pos: 0,
            last_line,
        })
    }

    fn next(&mut self) -> Option<(usize, &str)> {
        let (line, token) = self.items.get(self.pos)?;
        self.pos += 1;
        Some((*line, token.as_str()))
    }

    fn error(line: usize, message: impl Into<String>) -> ComplexError {
        ComplexError::Parse {
            line,
            message: message.into(),
        }
    }

    fn parse<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let eof = self.last_line;
        let (line, token) = self
            .next()
            .ok_or_else(|| Self::error(eof, format!("unexpected end of file, expected {what}")))?;
        token
            .parse()
            .map_err(|_| Self::error(line, format!("expected {what}, found `{token}`")).into())
    }

    fn index(&mut self, count: usize) -> Result<usize> {
        let line = self.items.get(self.pos).map_or(self.last_line, |(l, _)| *l);
        let i: usize = self.parse("vertex index")?;
        if i == 0 || i > count {
            return Err(Self::error(line, format!("vertex index {i} out of 1..={count}")).into());
        }
        Ok(i - 1)
    }
}

/// Reads a complex from MEDIT format.
///
/// # Errors
///
/// Returns [`ComplexError::Parse`] on malformed input and the usual
/// construction errors if the tetrahedra do not form a valid complex.
pub fn read_medit<R: BufRead>(input: R) -> Result<MeshComplex> {
    let mut tokens = Tokens::read(input)?;
    let mut points: Vec<Point3> = Vec::new();
    let mut tets: Vec<[usize; 4]> = Vec::new();
    let mut refs: Vec<SubdomainIndex> = Vec::new();

    while let Some((line, keyword)) = tokens.next() {
        let keyword = keyword.to_owned();
        match keyword.as_str() {
            "MeshVersionFormatted" => {
                let _: u32 = tokens.parse("format version")?;
            }
            "Dimension" => {
                let dim: u32 = tokens.parse("dimension")?;
                if dim != 3 {
                    return Err(Tokens::error(line, format!("unsupported dimension {dim}")).into());
                }
            }
            "Vertices" => {
                let n: usize = tokens.parse("vertex count")?;
                points.reserve(n);
                for _ in 0..n {
                    let x = tokens.parse("coordinate")?;
                    let y = tokens.parse("coordinate")?;
                    let z = tokens.parse("coordinate")?;
                    let _: i64 = tokens.parse("vertex reference")?;
                    points.push(Point3::new(x, y, z));
                }
            }
            "Edges" | "Triangles" => {
                let arity = if keyword == "Edges" { 2 } else { 3 };
                let n: usize = tokens.parse("element count")?;
                for _ in 0..n {
                    for _ in 0..arity {
                        tokens.index(points.len())?;
                    }
                    let _: i64 = tokens.parse("element reference")?;
                }
            }
            "Tetrahedra" => {
                let n: usize = tokens.parse("tetrahedron count")?;
                tets.reserve(n);
                refs.reserve(n);
                for _ in 0..n {
                    let mut tet = [0usize; 4];
                    for slot in &mut tet {
                        *slot = tokens.index(points.len())?;
                    }
                    tets.push(tet);
                    refs.push(tokens.parse("subdomain reference")?);
                }
            }
            "End" => break,
            other => {
                return Err(Tokens::error(line, format!("unsupported section `{other}`")).into());
            }
        }
    }

    debug!(
        vertices = points.len(),
        tetrahedra = tets.len(),
        "complex read"
    );
    MeshComplex::from_tetrahedra(&points, &tets, &refs)
}

/// Loads a complex from a `.mesh` file. See [`read_medit`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_medit(path: &Path) -> Result<MeshComplex> {
    let file = File::open(path)?;
    read_medit(BufReader::new(file))
}
