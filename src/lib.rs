// src/lib.rs

//! Reddit → YouTube playlist synchronizer library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
