//! Evaluation of batches of independent triangle concavity measurements.

use crate::math::{Real, Vector};
use crate::shape::Triangle;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A triangle whose concavity must be measured, with the unit normal of the face it
/// belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleTask {
    /// The triangle.
    pub triangle: Triangle,
    /// The unit normal of the face containing the triangle.
    pub normal: Vector<Real>,
}

/// The result of a batch submitted to a [`TaskRunner`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[must_use]
pub struct BatchHandle {
    max: Real,
    evaluated: usize,
}

impl BatchHandle {
    /// A handle for a batch whose reduction is already known.
    pub fn ready(max: Real, evaluated: usize) -> Self {
        BatchHandle { max, evaluated }
    }

    /// The number of tasks that were actually evaluated.
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Waits for the batch and returns the maximum of the evaluated values.
    ///
    /// Returns 0 for an empty batch.
    pub fn join(self) -> Real {
        self.max
    }
}

/// Evaluates batches of [`TriangleTask`]s and reduces them to their maximum value.
///
/// All the tasks of a batch are independent and `eval` has no side effect, so they can be
/// evaluated in any order, possibly concurrently. Once the running maximum exceeds `limit`
/// the remaining tasks may be skipped: the reduced value is then only known to be larger
/// than `limit`.
pub trait TaskRunner: Sync {
    /// Evaluates `eval` on every task of `tasks`.
    fn run(
        &self,
        tasks: &[TriangleTask],
        limit: Real,
        eval: &(dyn Fn(&TriangleTask) -> Real + Sync),
    ) -> BatchHandle;
}

/// Evaluates the tasks one after the other on the calling thread.
#[derive(Copy, Clone, Debug, Default)]
pub struct SerialRunner;

impl TaskRunner for SerialRunner {
    fn run(
        &self,
        tasks: &[TriangleTask],
        limit: Real,
        eval: &(dyn Fn(&TriangleTask) -> Real + Sync),
    ) -> BatchHandle {
        let mut max: Real = 0.0;
        let mut evaluated = 0;

        for task in tasks {
            max = max.max(eval(task));
            evaluated += 1;

            if max > limit {
                break;
            }
        }

        BatchHandle::ready(max, evaluated)
    }
}

/// Evaluates the tasks on the rayon thread pool.
///
/// Every task is evaluated: the batch is reduced with a parallel `max` and never exits
/// early.
#[cfg(feature = "parallel")]
#[derive(Copy, Clone, Debug, Default)]
pub struct RayonRunner;

#[cfg(feature = "parallel")]
impl TaskRunner for RayonRunner {
    fn run(
        &self,
        tasks: &[TriangleTask],
        _limit: Real,
        eval: &(dyn Fn(&TriangleTask) -> Real + Sync),
    ) -> BatchHandle {
        let max = tasks.par_iter().map(eval).reduce(|| 0.0, Real::max);
        BatchHandle::ready(max, tasks.len())
    }
}

#[cfg(test)]
mod test {
    use super::{SerialRunner, TaskRunner, TriangleTask};
    use crate::math::{Point, Vector};
    use crate::shape::Triangle;

    fn tasks(n: usize) -> Vec<TriangleTask> {
        (0..n)
            .map(|i| TriangleTask {
                triangle: Triangle::new(
                    Point::new(i as f64, 0.0, 0.0),
                    Point::new(i as f64 + 1.0, 0.0, 0.0),
                    Point::new(i as f64, 1.0, 0.0),
                ),
                normal: Vector::z(),
            })
            .collect()
    }

    #[test]
    fn serial_runner_early_out() {
        let tasks = tasks(10);
        let eval = |task: &TriangleTask| task.triangle.a.x;

        let full = SerialRunner.run(&tasks, f64::MAX, &eval);
        assert_eq!(full.evaluated(), 10);
        assert_eq!(full.join(), 9.0);

        let partial = SerialRunner.run(&tasks, 3.5, &eval);
        assert_eq!(partial.evaluated(), 5);
        assert_eq!(partial.join(), 4.0);

        assert_eq!(SerialRunner.run(&[], 0.0, &eval).join(), 0.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn rayon_runner_matches_serial() {
        use super::RayonRunner;

        let tasks = tasks(1000);
        let eval = |task: &TriangleTask| (task.triangle.a.x * 0.37).sin();
        let serial = SerialRunner.run(&tasks, f64::MAX, &eval).join();
        let parallel = RayonRunner.run(&tasks, f64::MAX, &eval).join();
        assert_eq!(serial, parallel);
    }
}
