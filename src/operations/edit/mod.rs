mod prune_isolated;
mod relabel_boundary;
mod remove_subdomains;

pub use prune_isolated::PruneIsolatedVertices;
pub use relabel_boundary::RelabelBoundary;
pub use remove_subdomains::RemoveSubdomains;

use crate::complex::{MeshComplex, SubdomainIndex};
use crate::error::Result;

/// Parameters shared by the complex editing operations.
#[derive(Debug, Clone, Copy)]
pub struct EditParams {
    /// Number of pruned vertices above which a quality warning is emitted.
    pub vertex_loss_warning: usize,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            vertex_loss_warning: 10,
        }
    }
}

/// Exclusive editing session over a [`MeshComplex`].
///
/// Thin front over the individual edit operations; every call takes the
/// complex mutably for its whole duration.
pub struct ComplexEditor<'a> {
    complex: &'a mut MeshComplex,
    params: EditParams,
}

impl<'a> ComplexEditor<'a> {
    /// Starts an editing session with default parameters.
    pub fn new(complex: &'a mut MeshComplex) -> Self {
        Self {
            complex,
            params: EditParams::default(),
        }
    }

    /// Overrides the edit parameters.
    #[must_use]
    pub fn with_params(mut self, params: EditParams) -> Self {
        self.params = params;
        self
    }

    /// Read access to the complex being edited.
    #[must_use]
    pub fn complex(&self) -> &MeshComplex {
        self.complex
    }

    /// Removes every cell labeled with one of `ids`. See [`RemoveSubdomains`].
    ///
    /// # Errors
    ///
    /// Returns an error, without mutating, if the input or the complex is
    /// invalid.
    pub fn remove_subdomains(&mut self, ids: &[SubdomainIndex]) -> Result<usize> {
        RemoveSubdomains::new(ids.iter().copied())
            .with_params(self.params)
            .execute(self.complex)
    }

    /// Removes a single subdomain.
    ///
    /// # Errors
    ///
    /// See [`remove_subdomains`](Self::remove_subdomains).
    pub fn remove_subdomain(&mut self, id: SubdomainIndex) -> Result<usize> {
        self.remove_subdomains(&[id])
    }

    /// Relabels the labeled neighbors of `boundary` cells. See
    /// [`RelabelBoundary`].
    ///
    /// # Errors
    ///
    /// Returns an error if either label is the reserved outside label.
    pub fn relabel_boundary(
        &mut self,
        boundary: SubdomainIndex,
        new_label: SubdomainIndex,
    ) -> Result<usize> {
        RelabelBoundary::new(boundary, new_label).execute(self.complex)
    }

    /// Runs one isolated-vertex pruning pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangulation rejects a removal.
    pub fn prune_isolated_vertices(&mut self, remove_domain: bool) -> Result<usize> {
        PruneIsolatedVertices::new(remove_domain)
            .with_params(self.params)
            .execute(self.complex)
    }

    /// Prunes until a pass removes nothing; returns the total.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangulation rejects a removal.
    pub fn prune_until_stable(&mut self) -> Result<usize> {
        PruneIsolatedVertices::new(false)
            .with_params(self.params)
            .execute_until_stable(self.complex)
    }
}
