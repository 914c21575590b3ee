// HTTP handlers, one module per resource
pub mod account;
pub mod datasets;
pub mod jobs;
pub mod trusted_datasites;
