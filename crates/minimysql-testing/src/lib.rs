//! # minimysql-testing
//!
//! Test infrastructure for MySQL driver development.
//!
//! Provides a mock MySQL server speaking enough of the wire protocol to
//! exercise the client's connect, authentication, and query paths without
//! a real database instance.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod mock_server;

pub use mock_server::{AuthFlow, MockColumn, MockMysqlServer, MockResponse, MockServerBuilder};
