//! Colas de trabajo asíncronas

pub mod email_queue;

pub use email_queue::{BudgetNotice, CarNotice, EmailJob, JobQueue, LogOnlyQueue, RedisJobQueue};
