mod barrier;
mod indices;
mod pending;
mod registry;
mod scheduler;
mod submit;

pub use barrier::Barrier;
pub use indices::build_indices;
pub use indices::BranchIndex;
pub use indices::Indices;
pub use indices::L10nIndex;
pub use registry::Registry;
pub use scheduler::Event;
pub use scheduler::Scheduler;
pub use scheduler::SchedulerConfig;
pub use scheduler::SchedulerHandle;
pub use submit::build_compare_job;
pub use submit::SubmitError;
