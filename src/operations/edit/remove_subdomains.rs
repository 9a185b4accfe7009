use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument, warn};

use crate::complex::{CellId, Facet, FacetKey, MeshComplex, PatchIndex, SubdomainIndex, OUTSIDE};
use crate::error::{OperationError, Result};

use super::{EditParams, PruneIsolatedVertices};

/// A facet of a retained cell that borders a cell about to be removed,
/// captured before any removal so the removed handle is never read again.
#[derive(Debug, Clone, Copy)]
struct Rebind {
    cell: CellId,
    index: usize,
    neighbor_subdomain: SubdomainIndex,
}

/// Removes every cell labeled with one of the given subdomains.
///
/// Facets that separated a retained cell from a removed one become boundary
/// facets tagged `(retained, 0)`; facets between two removed cells are
/// dropped. Isolated vertices are pruned afterwards.
pub struct RemoveSubdomains {
    ids: BTreeSet<SubdomainIndex>,
    params: EditParams,
}

impl RemoveSubdomains {
    /// Creates a new `RemoveSubdomains` operation.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = SubdomainIndex>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            params: EditParams::default(),
        }
    }

    /// Overrides the edit parameters.
    #[must_use]
    pub fn with_params(mut self, params: EditParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the removal, returning the number of cells removed.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the complex untouched, if the ids contain
    /// the reserved outside label or the complex violates the facet-tag
    /// invariant.
    #[instrument(skip_all, fields(ids = ?self.ids))]
    pub fn execute(&self, complex: &mut MeshComplex) -> Result<usize> {
        if self.ids.is_empty() {
            return Ok(0);
        }
        if self.ids.contains(&OUTSIDE) {
            return Err(OperationError::InvalidInput(
                "subdomain 0 is reserved for the outside and cannot be removed".into(),
            )
            .into());
        }
        complex.check_facet_tags()?;

        let rebinds = self.snapshot(complex);
        let doomed: Vec<CellId> = complex
            .cells_in_complex()
            .filter(|(_, c)| self.ids.contains(&c.subdomain))
            .map(|(id, _)| id)
            .collect();

        for &cell in &doomed {
            for index in 0..4 {
                complex.remove_facet_from_complex(Facet::new(cell, index))?;
            }
            complex.remove_from_complex(cell)?;
        }

        for rebind in rebinds.values() {
            let retained = complex.subdomain_index(rebind.cell);
            let other = if self.ids.contains(&rebind.neighbor_subdomain) {
                OUTSIDE
            } else {
                rebind.neighbor_subdomain
            };
            complex.add_facet_to_complex(
                Facet::new(rebind.cell, rebind.index),
                PatchIndex::new(retained, other),
            )?;
        }

        let pruned = PruneIsolatedVertices::new(true)
            .with_params(self.params)
            .execute_until_stable(complex)?;
        if pruned > self.params.vertex_loss_warning {
            warn!(
                pruned,
                "substantial vertex loss after subdomain removal; the mesh may be ill-posed"
            );
        }

        debug!(
            removed = doomed.len(),
            rebound = rebinds.len(),
            pruned,
            "subdomain cells removed"
        );
        Ok(doomed.len())
    }

    /// Records every (retained cell, facet, neighbor label) triple that
    /// borders a cell scheduled for removal. A facet claimed twice keeps the
    /// lowest neighbor label.
    fn snapshot(&self, complex: &MeshComplex) -> BTreeMap<FacetKey, Rebind> {
        let mut rebinds = BTreeMap::new();
        for (id, cell) in complex.cells_in_complex() {
            if self.ids.contains(&cell.subdomain) {
                continue;
            }
            for index in 0..4 {
                let neighbor_subdomain = complex.neighbor_subdomain(id, index);
                if !self.ids.contains(&neighbor_subdomain) {
                    continue;
                }
                let entry = Rebind {
                    cell: id,
                    index,
                    neighbor_subdomain,
                };
                match rebinds.entry(cell.facet_key(index)) {
                    Entry::Vacant(slot) => {
                        slot.insert(entry);
                    }
                    Entry::Occupied(mut slot) => {
                        if neighbor_subdomain < slot.get().neighbor_subdomain {
                            slot.insert(entry);
                        }
                    }
                }
            }
        }
        rebinds
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::complex::fixtures::cube_row;

    fn labels(complex: &MeshComplex) -> Vec<SubdomainIndex> {
        let mut v: Vec<_> = complex.cells_in_complex().map(|(_, c)| c.subdomain).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn empty_set_changes_nothing() {
        let mut complex = cube_row(&[1, 2, 3]);
        let before = labels(&complex);
        let removed = RemoveSubdomains::new([]).execute(&mut complex).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(complex.num_cells(), 18);
        assert_eq!(complex.num_vertices(), 16);
        assert_eq!(labels(&complex), before);
        assert_eq!(complex.num_facets_in_complex(), 32);
    }

    #[test]
    fn removing_middle_subdomain_rebinds_neighbors() {
        let mut complex = cube_row(&[1, 2, 3]);
        let bordering: Vec<(CellId, usize, SubdomainIndex)> = complex
            .cells_in_complex()
            .filter(|(_, c)| c.subdomain != 2)
            .flat_map(|(id, c)| {
                let complex = &complex;
                (0..4)
                    .filter(move |&i| complex.neighbor_subdomain(id, i) == 2)
                    .map(move |i| (id, i, c.subdomain))
            })
            .collect();
        assert_eq!(bordering.len(), 4);

        let removed = RemoveSubdomains::new([2]).execute(&mut complex).unwrap();
        assert_eq!(removed, 6);
        assert!(complex.cells_in_complex().all(|(_, c)| c.subdomain != 2));
        for (cell, index, own) in bordering {
            assert_eq!(
                complex.facet_patch(Facet::new(cell, index)),
                Some(PatchIndex::new(own, 0))
            );
        }
        complex.check_facet_tags().unwrap();
    }

    #[test]
    fn removing_adjacent_subdomains_drops_shared_facets() {
        let mut complex = cube_row(&[1, 2, 3]);
        let removed = RemoveSubdomains::new([2, 3]).execute(&mut complex).unwrap();
        assert_eq!(removed, 12);
        assert_eq!(complex.subdomains(), BTreeSet::from([1]));
        assert!(complex
            .facets_in_complex()
            .all(|(_, p)| *p == PatchIndex::new(1, 0)));
        assert_eq!(complex.num_facets_in_complex(), 12);
        complex.check_facet_tags().unwrap();
    }

    #[test]
    fn removal_prunes_unreferenced_vertices() {
        let mut complex = cube_row(&[1, 2, 3]);
        RemoveSubdomains::new([3]).execute(&mut complex).unwrap();
        assert_eq!(complex.num_vertices(), 12);
        assert_eq!(PruneIsolatedVertices::new(false).execute(&mut complex).unwrap(), 0);
    }

    #[test]
    fn reserved_label_is_rejected_without_mutation() {
        let mut complex = cube_row(&[1, 2]);
        assert!(RemoveSubdomains::new([0, 2]).execute(&mut complex).is_err());
        assert_eq!(complex.num_cells_in_complex(), 12);
        assert_eq!(complex.num_vertices(), 12);
    }

    #[test]
    fn inconsistent_complex_is_rejected_without_mutation() {
        let mut complex = cube_row(&[1, 2]);
        let (id, _) = complex
            .cells_in_complex()
            .find(|(_, c)| c.subdomain == 1)
            .unwrap();
        complex.set_subdomain_index(id, 7).unwrap();
        assert!(RemoveSubdomains::new([2]).execute(&mut complex).is_err());
        assert_eq!(complex.num_cells_in_complex(), 12);
    }

    #[test]
    fn removing_absent_subdomain_is_noop() {
        let mut complex = cube_row(&[1, 2]);
        assert_eq!(RemoveSubdomains::new([9]).execute(&mut complex).unwrap(), 0);
        assert_eq!(complex.num_cells_in_complex(), 12);
        complex.check_facet_tags().unwrap();
    }
}
