//! Configuration module for youlearn.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AcquisitionSettings, ConcurrencySettings, CredentialSettings, FrontendSettings,
    GeneralSettings, JobSettings, ProxySettings, RetrySettings, Settings, SummarySettings,
    TranscriptSettings,
};
