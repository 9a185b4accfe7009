use crate::complex::{MeshComplex, SubdomainIndex};
use crate::error::Result;
use crate::slice::{Slice, SliceParams};

use super::{Boundary, BoundarySurface, CutPlane};

/// Cuts a complex and assembles the per-subdomain traces into one slice.
///
/// Interfaces between two labeled subdomains are traced once for each
/// side, so the slice carries them twice.
pub struct MeshSlice {
    cut: CutPlane,
    params: SliceParams,
}

impl MeshSlice {
    /// Creates a new `MeshSlice` operation with default slice parameters.
    #[must_use]
    pub fn new(cut: CutPlane) -> Self {
        Self {
            cut,
            params: SliceParams::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: SliceParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the cut and assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if the cut fails.
    pub fn execute(&self, complex: &MeshComplex) -> Result<Slice> {
        let groups = self.cut.execute(complex)?;
        Ok(Slice::from_subdomain_segments(&groups, self.params))
    }
}

impl MeshComplex {
    /// Slices the complex with `cut`. See [`MeshSlice`].
    ///
    /// # Errors
    ///
    /// Returns an error if the cut fails.
    pub fn slice(&self, cut: &CutPlane, params: SliceParams) -> Result<Slice> {
        MeshSlice::new(cut.clone()).with_params(params).execute(self)
    }

    /// Triangle soup of the facets bounding `subdomain`. See [`Boundary`].
    ///
    /// # Errors
    ///
    /// Returns an error if `subdomain` is the outside label.
    pub fn boundary(&self, subdomain: SubdomainIndex) -> Result<BoundarySurface> {
        Boundary::new(subdomain).execute(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::complex::fixtures::cube_row;

    #[test]
    fn sliced_row_holds_one_loop_per_side() {
        let complex = cube_row(&[1, 2]);
        let cut = CutPlane::new(0.0, 0.0, 1.0, -0.5).unwrap();
        let slice = MeshSlice::new(cut).execute(&complex).unwrap();
        assert_eq!(slice.num_constraints(), 2);
        assert!(slice.constraints().iter().all(|l| l.len() == 8));
        // Eight points per loop is below the default outer threshold.
        assert!(!slice.check_validity());
    }

    #[test]
    fn complex_slice_uses_given_params() {
        let complex = cube_row(&[1, 2, 3]);
        let cut = CutPlane::new(0.0, 1.0, 0.0, -0.5).unwrap();
        let params = SliceParams::default().with_min_outer_vertices(4);
        let slice = complex.slice(&cut, params).unwrap();
        assert_eq!(slice.num_constraints(), 3);
        assert!(slice.check_validity());
        assert_eq!(complex.boundary(2).unwrap().faces.len(), 12);
    }
}
