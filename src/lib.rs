//! # Kaori
//!
//! A weighted field-embedding search and recommendation engine for a
//! perfume catalog.
//!
//! Kaori turns structured catalog documents (`label: value` text blocks)
//! into single semantic vectors by embedding each field separately and
//! combining them under a tunable per-field weight table, then ranks the
//! catalog against a query vector with cosine similarity and hard
//! categorical filters (target demographic, seasons). A note-level
//! comparison between an entry and its nearest neighbors feeds the
//! downstream recommendation-text generator.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌────────────┐   ┌─────────────┐
//! │ Catalog  │──▶│ Field      │──▶│ Weighted   │──▶│ VectorIndex │
//! │ (JSON)   │   │ Parser     │   │ Composer   │   │ (once-built)│
//! └──────────┘   └────────────┘   └─────┬──────┘   └──────┬──────┘
//!                                       │                 │
//!                          query ───────┘        ┌────────┴────────┐
//!                                                ▼                 ▼
//!                                          ┌──────────┐     ┌──────────┐
//!                                          │   CLI    │     │   HTTP   │
//!                                          │ (kaori)  │     │  (axum)  │
//!                                          └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kaori catalog prepare data/raw_perfumes.json   # build the processed catalog
//! kaori search "爽やかな柑橘系" --sex レディース --season 夏
//! kaori similar shiro-savon                      # nearest neighbors
//! kaori notes shiro-savon                        # note overlap vs neighbors
//! kaori serve                                    # start the JSON API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration (provider, weights, limits) |
//! | [`models`] | Catalog and search data types |
//! | [`fields`] | Structured-text field parser |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`compose`] | Weighted field-embedding composer |
//! | [`catalog`] | Catalog loading and preparation |
//! | [`index`] | Vector index and ranking engine |
//! | [`notes`] | Note-level neighbor comparison |
//! | [`reason`] | Rule-based recommendation reasons |
//! | [`search`] | CLI entry points |
//! | [`server`] | JSON HTTP API |

pub mod catalog;
pub mod compose;
pub mod config;
pub mod embedding;
pub mod fields;
pub mod index;
pub mod models;
pub mod notes;
pub mod reason;
pub mod search;
pub mod server;
