pub mod job_queue;

pub use job_queue::{JobHandle, JobQueue};
