pub mod calendar;
pub mod classify;
pub mod oracle;
pub mod pending_store;
pub mod slot_search;
pub mod summary;
pub mod timezone;
