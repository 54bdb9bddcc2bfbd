// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ck-core: Core library for the checkin questionnaire scheduler
//!
//! This crate provides:
//! - The domain model (users, packages, question templates, scheduled instances)
//! - The pure occurrence generator for recurring questions
//! - Payload rendering for outbound questions and reminders
//! - Gateway and template-source traits for the persistence seam
//! - Durable operation types consumed by the storage engine

pub mod catalog;
pub mod clock;
pub mod config;
pub mod gateway;
pub mod id;
pub mod model;
pub mod operation;
pub mod render;
pub mod schedule;

// Re-exports
pub use catalog::{Catalog, CatalogError};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, DispatchConfig};
pub use gateway::{DueItem, Gateway, GatewayError, MarkOutcome, RecordOutcome, TemplateSource};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use model::{
    Answer, Enrollment, EnrollmentId, InstanceId, Package, PackageId, QuestionId, QuestionKind,
    QuestionTemplate, ScheduledInstance, User, UserId,
};
pub use operation::Operation;
pub use render::Payload;
pub use schedule::{generate, occurrence_count, ScheduleError};
