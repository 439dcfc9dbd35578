use crate::math::Real;

/// Receives the progress of a convex decomposition.
///
/// `phase` names the current step of the algorithm and `fraction` is the progress within
/// the merge loop, in `[0, 1]`.
pub trait ProgressReporter {
    /// Reports the current phase and progress.
    fn report(&mut self, phase: &str, fraction: Real);
}

/// A [`ProgressReporter`] that ignores every report.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    #[inline]
    fn report(&mut self, _: &str, _: Real) {}
}

impl<F: FnMut(&str, Real)> ProgressReporter for F {
    #[inline]
    fn report(&mut self, phase: &str, fraction: Real) {
        self(phase, fraction)
    }
}

pub(crate) const PHASE_COPY_MESH: &str = "Making a copy of the input mesh";
pub(crate) const PHASE_CONNECTIVITY: &str = "Creating Connectivity Graph";
pub(crate) const PHASE_INITIAL_COSTS: &str = "Submit Initial Edge Costs";
pub(crate) const PHASE_COLLAPSE: &str = "Collapse Clusters";
pub(crate) const PHASE_PARTITION: &str = "Creating Partition Mesh";
