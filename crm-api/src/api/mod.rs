//! HTTP API handlers for crm-api

pub mod activities;
pub mod agents;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod health;
pub mod research;

pub use activities::{create_activity, list_activities};
pub use agents::{analyze_parallels, personalize_outreach};
pub use contacts::{create_contact, get_contact, list_contacts, update_contact};
pub use dashboard::dashboard_stats;
pub use deals::{create_deal, list_deals};
pub use health::health_routes;
pub use research::{list_research, submit_research};
