//! Model Context Protocol (MCP) server implementation.
//!
//! Exposes the extraction pipeline to AI coding agents as tool calls over
//! stdio.
//!
//! ## Module Structure
//!
//! - `server`: Tool router and server entry point
//! - `types`: Tool parameter and result types

mod server;
pub mod types;

pub use server::{KeysmithMcpServer, run_server};
