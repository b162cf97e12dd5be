//! Core library for kofta
//!
//! This crate is the **Functional Core** of the kofta application, following
//! the Functional Core - Imperative Shell pattern used across the workspace.
//!
//! - **`kofta_core`** (this crate): pure types and transformations, zero I/O
//! - **`kofta`**: the gateway server, the interactive client and every
//!   collaborator that talks to the network, the compiler or the database
//!
//! Nothing here opens a socket or touches the filesystem, so every rule of the
//! application (request validation, prompt text, the client session state
//! machine, response parsing) is tested with plain fixture data.
//!
//! # Module Organization
//!
//! - [`template`]: the built-in template catalogue
//! - [`prompt`]: request validation and prompt construction
//! - [`gemini`]: Gemini `generateContent` wire types and text extraction
//! - [`session`]: the client session state machine
//! - [`command`]: parsing client input into commands
//! - [`deploy`]: deployment records and compiler output handling
//! - [`rpc`]: Ethereum JSON-RPC envelopes
//!
//! # Example Usage
//!
//! ```rust
//! use kofta_core::prompt::{ContractRequest, GenerationRequest};
//! use kofta_core::session::Session;
//!
//! let request: ContractRequest = GenerationRequest::new("ERC20 Token").unwrap().into();
//! let mut session = Session::new();
//!
//! session.begin_generation(&request).unwrap();
//! assert!(session.is_loading());
//!
//! session
//!     .finish_generation(Ok("pragma solidity ^0.8.0; contract ERC20 {}".to_string()))
//!     .unwrap();
//! assert!(!session.is_loading());
//! assert_eq!(session.xp(), 100);
//! ```

pub mod command;
pub mod deploy;
pub mod gemini;
pub mod prompt;
pub mod rpc;
pub mod session;
pub mod template;
