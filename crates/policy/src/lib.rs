//! Policy rule engine for an IoT gateway.
//!
//! Validates, ranks and compiles message-routing rules between heterogeneous
//! endpoint nodes (CAN, Modbus, HTTP server, file input/output, ROS topics).
//! The engine never executes messages itself: it produces a canonical JSON
//! policy document for an external execution runtime and signals that
//! runtime through a narrow control trait.

pub mod compiler;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod protocol;
pub mod ranking;
pub mod runtime;
pub mod store;
pub mod validation;

pub use engine::{PolicyEngine, SaveReport};
pub use error::{PolicyError, Result};
