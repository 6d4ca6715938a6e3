//! Core library for patentdraft
//!
//! This crate implements the **Functional Core** of the patentdraft application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`patentdraft_core`** (this crate): configuration records, prompt text,
//!   wire types, and naming rules, with zero I/O
//! - **`patentdraft`**: file access, the HTTP client, the background generation
//!   task, and the command-line shell
//!
//! Everything here can be tested with fixture data. The only place the core
//! learns about the outside world is [`naming::resolve_with`], which takes the
//! existence check as a closure so the shell decides what "exists" means.
//!
//! # Module Organization
//!
//! - [`config`]: the configuration record, its defaults, deep merge, and validation
//! - [`prompt`]: the seven-section disclosure instruction
//! - [`completion`]: chat-completion request/response shapes and status classification
//! - [`naming`]: output file naming and collision resolution
//! - [`request`]: generation requests, outcomes, and task states
//! - [`error`]: the error taxonomy shared by core and shell
//!
//! # Example Usage
//!
//! ```rust
//! use patentdraft_core::completion::build_chat_request;
//! use patentdraft_core::config::parse_config;
//! use patentdraft_core::prompt::compose;
//!
//! let config = parse_config(r#"{"openai_config": {"api_key": "sk-test"}}"#).unwrap();
//! assert!(config.validate().is_ok());
//!
//! let prompt = compose("智能灌溉系统", "基于土壤湿度传感器自动调节水阀");
//! let request = build_chat_request(&prompt, &config);
//! assert_eq!(request.messages[0].content, prompt);
//! ```

pub mod completion;
pub mod config;
pub mod error;
pub mod naming;
pub mod prompt;
pub mod request;
