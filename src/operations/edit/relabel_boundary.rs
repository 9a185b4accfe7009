use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::complex::{CellId, MeshComplex, SubdomainIndex, OUTSIDE};
use crate::error::{OperationError, Result};

/// Relabels the cells lying just outside a subdomain.
///
/// Every labeled neighbor of a cell tagged `boundary` that is not itself
/// tagged `boundary` receives `new_label`. The pass is not transitive: the
/// set of `boundary` cells is fixed before any relabeling. Facet tags around
/// relabeled cells are rebuilt afterwards.
pub struct RelabelBoundary {
    boundary: SubdomainIndex,
    new_label: SubdomainIndex,
}

impl RelabelBoundary {
    /// Creates a new `RelabelBoundary` operation.
    #[must_use]
    pub fn new(boundary: SubdomainIndex, new_label: SubdomainIndex) -> Self {
        Self {
            boundary,
            new_label,
        }
    }

    /// Executes the relabeling, returning the number of relabeled cells.
    ///
    /// # Errors
    ///
    /// Returns an error if either label is the reserved outside label.
    #[instrument(skip_all, fields(boundary = self.boundary, new_label = self.new_label))]
    pub fn execute(&self, complex: &mut MeshComplex) -> Result<usize> {
        if self.boundary == OUTSIDE || self.new_label == OUTSIDE {
            return Err(OperationError::InvalidInput(
                "subdomain 0 is reserved for the outside and cannot be relabeled".into(),
            )
            .into());
        }

        let boundary_cells: Vec<CellId> = complex
            .cells_in_complex()
            .filter(|(_, c)| c.subdomain == self.boundary)
            .map(|(id, _)| id)
            .collect();

        let mut relabeled: BTreeSet<CellId> = BTreeSet::new();
        for cell in boundary_cells {
            for index in 0..4 {
                let Some(neighbor) = complex.neighbor(cell, index) else {
                    continue;
                };
                let label = complex.subdomain_index(neighbor);
                if label != self.boundary && label != OUTSIDE {
                    complex.set_subdomain_index(neighbor, self.new_label)?;
                    relabeled.insert(neighbor);
                }
            }
        }

        for &cell in &relabeled {
            complex.refresh_facet_tags(cell)?;
        }

        debug!(
            boundary = self.boundary,
            new_label = self.new_label,
            relabeled = relabeled.len(),
            "boundary cells relabeled"
        );
        Ok(relabeled.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::complex::fixtures::cube_row;
    use crate::complex::{Facet, PatchIndex};

    #[test]
    fn neighbors_of_boundary_get_new_label() {
        let mut complex = cube_row(&[1, 2, 3]);
        let count = RelabelBoundary::new(2, 9).execute(&mut complex).unwrap();
        // One cell on each side touches cube 2 through a face triangle.
        assert_eq!(count, 4);
        assert_eq!(complex.subdomains(), BTreeSet::from([1, 2, 3, 9]));
        complex.check_facet_tags().unwrap();

        for (id, cell) in complex.cells_in_complex().filter(|(_, c)| c.subdomain == 9) {
            let touches_two = (0..4).any(|i| complex.neighbor_subdomain(id, i) == 2);
            assert!(touches_two);
            for i in 0..4 {
                if complex.neighbor_subdomain(id, i) == 2 {
                    assert_eq!(
                        complex.facet_patch(Facet::new(id, i)),
                        Some(PatchIndex::new(2, cell.subdomain))
                    );
                }
            }
        }
    }

    #[test]
    fn relabel_is_not_transitive() {
        let mut complex = cube_row(&[1, 2]);
        // Growing subdomain 2 into its neighbors must not cascade further
        // into cube 1 within the same pass.
        let count = RelabelBoundary::new(2, 2).execute(&mut complex).unwrap();
        assert_eq!(count, 2);
        let remaining = complex
            .cells_in_complex()
            .filter(|(_, c)| c.subdomain == 1)
            .count();
        assert_eq!(remaining, 4);
        complex.check_facet_tags().unwrap();
    }

    #[test]
    fn outside_neighbors_are_skipped() {
        let mut complex = cube_row(&[0, 4, 0]);
        let count = RelabelBoundary::new(4, 5).execute(&mut complex).unwrap();
        assert_eq!(count, 0);
        assert_eq!(complex.subdomains(), BTreeSet::from([4]));
    }

    #[test]
    fn reserved_label_is_rejected() {
        let mut complex = cube_row(&[1, 2]);
        assert!(RelabelBoundary::new(1, 0).execute(&mut complex).is_err());
        assert!(RelabelBoundary::new(0, 3).execute(&mut complex).is_err());
    }
}
