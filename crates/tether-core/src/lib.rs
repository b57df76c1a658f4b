//! Client-side state core: caches, workspaces and live updates, behind
//! port traits so it runs unchanged in the browser and in native tests.

pub mod app_state;
pub mod cache;
pub mod event_bus;
pub mod ports;
pub mod records;
pub mod remote;
pub mod store;
pub mod subscriber;
pub mod workspace;
