//! # xbserver - Serveur HTTP du service DLNA
//!
//! Encapsule un `axum::Router` partagé auquel chaque composant ajoute ses
//! routes avant le démarrage, et initialise le système de logs.
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use xbserver::ServerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("XBVR", "127.0.0.1", 9999).build();
//!     server
//!         .add_router("/", Router::new().route("/ping", get(|| async { "pong" })))
//!         .await;
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, init_logging};
pub use server::{Server, ServerBuilder, ServerInfo};
