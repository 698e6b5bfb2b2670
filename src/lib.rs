pub mod api;
pub mod card;
pub mod config;
pub mod disclosure;
pub mod emotion;
pub mod error;
pub mod geo;
pub mod logging;
pub mod recommend;
pub mod view;
