use std::collections::HashSet;

use tracing::{debug, warn};

use crate::complex::{MeshComplex, VertexId};
use crate::error::Result;

use super::EditParams;

/// Removes vertices that no cell of the complex uses.
///
/// Vertices are marked referenced when incident to at least one cell in the
/// complex; the rest are removed from the triangulation together with the
/// outside cells that still use them.
pub struct PruneIsolatedVertices {
    remove_domain: bool,
    params: EditParams,
}

impl PruneIsolatedVertices {
    /// Creates a new `PruneIsolatedVertices` operation.
    ///
    /// `remove_domain` marks a prune that follows a subdomain removal; the
    /// caller reports vertex loss itself, so no warning is emitted here.
    #[must_use]
    pub fn new(remove_domain: bool) -> Self {
        Self {
            remove_domain,
            params: EditParams::default(),
        }
    }

    /// Overrides the edit parameters.
    #[must_use]
    pub fn with_params(mut self, params: EditParams) -> Self {
        self.params = params;
        self
    }

    /// Runs one pruning pass, returning the number of vertices removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangulation rejects a removal.
    pub fn execute(&self, complex: &mut MeshComplex) -> Result<usize> {
        let referenced: HashSet<VertexId> = complex
            .cells_in_complex()
            .flat_map(|(_, c)| c.vertices)
            .collect();
        let isolated: HashSet<VertexId> = complex
            .finite_vertices()
            .map(|(id, _)| id)
            .filter(|id| !referenced.contains(id))
            .collect();

        let removed = complex.remove_vertices(&isolated)?;
        complex.rescan();

        debug!(removed, "isolated vertices removed");
        if removed > self.params.vertex_loss_warning && !self.remove_domain {
            warn!(
                removed,
                "substantial number of isolated vertices removed; the mesh may be ill-posed, \
                 try remeshing or a finer resolution"
            );
        }
        Ok(removed)
    }

    /// Repeats [`execute`](Self::execute) until a pass removes nothing and
    /// returns the total count.
    ///
    /// # Errors
    ///
    /// Returns an error if any pass fails.
    pub fn execute_until_stable(&self, complex: &mut MeshComplex) -> Result<usize> {
        let mut total = 0;
        loop {
            let removed = self.execute(complex)?;
            if removed == 0 {
                return Ok(total);
            }
            total += removed;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::complex::fixtures::cube_row;

    #[test]
    fn nothing_to_prune_in_full_complex() {
        let mut complex = cube_row(&[1, 2]);
        assert_eq!(PruneIsolatedVertices::new(false).execute(&mut complex).unwrap(), 0);
        assert_eq!(complex.num_vertices(), 12);
    }

    #[test]
    fn prunes_vertices_of_outside_cells() {
        let mut complex = cube_row(&[1, 0, 0]);
        let removed = PruneIsolatedVertices::new(false)
            .execute(&mut complex)
            .unwrap();
        assert_eq!(removed, 8);
        assert_eq!(complex.num_vertices(), 8);
        assert_eq!(complex.num_cells_in_complex(), 6);
        complex.check_facet_tags().unwrap();
    }

    #[test]
    fn second_pass_is_idempotent() {
        let mut complex = cube_row(&[0, 3, 0, 0]);
        let prune = PruneIsolatedVertices::new(true);
        assert!(prune.execute(&mut complex).unwrap() > 0);
        assert_eq!(prune.execute(&mut complex).unwrap(), 0);
    }

    #[test]
    fn until_stable_reaches_fixed_point() {
        let mut complex = cube_row(&[0, 0, 5]);
        let prune = PruneIsolatedVertices::new(false);
        let total = prune.execute_until_stable(&mut complex).unwrap();
        assert_eq!(total, 8);
        assert_eq!(prune.execute(&mut complex).unwrap(), 0);
    }
}
