#![forbid(unsafe_code)]

pub mod app_services;
pub mod badges;
pub mod catalog_service;
pub mod error;
pub mod notify;
pub mod progress_service;
pub mod stats;

pub use quiz_core::Clock;

pub use app_services::{AppServices, SharedStorage};
pub use badges::{BadgeContext, BadgeRule, default_rules, evaluate};
pub use catalog_service::CatalogService;
pub use error::{AppServicesError, CatalogError, ProgressServiceError};
pub use notify::{BadgeNotifier, BroadcastNotifier, NullNotifier};
pub use progress_service::{
    ProgressOverview, ProgressService, SaveOutcome, ThemeProgress,
};
pub use stats::{StatsConfig, ThemeStat, VisualizationData, visualization_data};
