#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod week_summary;

pub use goals_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, SummaryError};
pub use week_summary::WeekSummaryService;
