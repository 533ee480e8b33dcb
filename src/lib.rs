//! Image composition gateway
//!
//! Accepts a synchronous request for an image-composition job, submits it to
//! the external image microservice, polls the job until it finishes and
//! answers with one consolidated outcome.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
