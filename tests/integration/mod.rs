//! Integration tests for the provider/loader config store

mod monitor;
mod pipeline;
mod round_trip;
mod scan_store;
mod test_utils;
