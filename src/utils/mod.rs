//! Utility modules for the search router

pub mod http;
