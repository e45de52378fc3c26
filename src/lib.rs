//! # Tavola
//!
//! A hybrid local-first retrieval engine for restaurant knowledge.
//!
//! Tavola ingests a directory of plain-text documents (menus, opening
//! hours, contact details, house policies), chunks and embeds them into a
//! persistent vector index, and answers natural-language questions by
//! combining local semantic search with an optional Brave web search.
//! Results are exposed as MCP-style HTTP tools for consumption by a chat
//! model or calling agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────┐
//! │  Scanner  │──▶│   Pipeline    │──▶│  SQLite   │
//! │ data/*.txt│   │ Chunk+Embed  │   │ vectors  │
//! └───────────┘   └──────────────┘   └────┬─────┘
//!                                         │
//!                    ┌────────────────────┤
//!                    ▼                    ▼
//!               ┌──────────┐        ┌──────────┐
//!               │   CLI    │        │   HTTP   │
//!               │ (tavola) │        │  (tools) │
//!               └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tavola ingest                 # rebuild the vector index from data/
//! tavola search "menu today"    # query from the command line
//! tavola serve                  # rebuild, then serve the tool API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`scan`] | Data-directory document scanner |
//! | [`categorize`] | Filename-based category inference |
//! | [`chunk`] | Text chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Persistent vector index |
//! | [`ingest`] | Startup rebuild pipeline |
//! | [`websearch`] | Brave web search client |
//! | [`retrieve`] | Hybrid local + web retrieval |
//! | [`server`] | MCP-style HTTP tool server |
//! | [`db`] | Database connection |
//! | [`error`] | Failure taxonomy |

pub mod categorize;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod models;
pub mod retrieve;
pub mod scan;
pub mod server;
pub mod websearch;
