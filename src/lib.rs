// src/lib.rs

//! Real-estate listing pipeline: crawl, normalize, load.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
