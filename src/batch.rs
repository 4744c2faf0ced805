use crate::vm::{VirtualMachine, VmError};
use log::debug;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

/// Evaluates every program on its own machine, in parallel.
///
/// # Arguments
/// * `programs` - flat programs to evaluate
/// * `capacity` - stack capacity given to each machine
///
/// # Returns
/// One result per program, in input order.
pub fn evaluate_all<P>(programs: &[P], capacity: usize) -> Vec<Result<i64, VmError>>
where
    P: AsRef<[i64]> + Sync,
{
    debug!(
        "Evaluating {} programs (stack capacity {})",
        programs.len(),
        capacity
    );
    programs
        .par_iter()
        .map_init(
            || VirtualMachine::with_capacity(capacity),
            |vm, program| vm.evaluate(program.as_ref()),
        )
        .collect()
}
