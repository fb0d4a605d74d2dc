use crate::args::PositiveUsize;

/// Shape of one run; fixed for its whole duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub worker_count: PositiveUsize,
    /// Executions per virtual user; anything below 1 means one pass over the items.
    pub iterations: i32,
    pub randomize_order: bool,
}

impl ExecutionConfig {
    /// Number of executions each virtual user performs.
    #[must_use]
    pub fn executions_per_user(&self, item_count: usize) -> usize {
        match usize::try_from(self.iterations) {
            Ok(iterations) if iterations >= 1 => iterations,
            Ok(_) | Err(_) => item_count,
        }
    }
}
