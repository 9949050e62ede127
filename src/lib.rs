// Library for tests to access modules

pub mod aggregation;
pub mod config;
pub mod docker_repo;
pub mod events;
pub mod history_repo;
pub mod models;
pub mod poller;
pub mod ports;
pub mod report_jobs;
pub mod routes;
pub mod scheduler;
pub mod tracker;
pub mod version;
