pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extractors;
pub mod fulfillment;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod programs;
pub mod supabase;
pub mod util;
