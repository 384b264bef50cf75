//! Session-catalog retrieval for the re:Invent attendee portal.
//!
//! The crate logs into the portal with a username and password, fetches the
//! session catalog and the user's favorites, and merges them into one record
//! set sorted by title.
//!
//! ```no_run
//! # async fn demo() -> reinvent::Result<()> {
//! use reinvent::{Credentials, PortalConfig, RunOptions};
//!
//! let config = PortalConfig::default();
//! let credentials = Credentials::new("user@example.com", "hunter2");
//! let output = reinvent::run(&config, &credentials, RunOptions::default()).await?;
//! reinvent::write_json(std::path::Path::new("sessions.json"), &output.merged.catalog)?;
//! # Ok(())
//! # }
//! ```
//!
//! Stages are usable on their own: [`SessionBootstrapper`] for the login
//! handshake, [`DataFetcher`] for authenticated reads, [`merge()`] for the
//! offline join.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod fetch;
mod http;
pub mod identity;
pub mod merge;
pub mod pipeline;
pub mod redact;
pub mod redirect;
pub mod srp;

pub use bootstrap::{AuthenticatedSession, AuthorizeGrant, SessionBootstrapper, Step, parse_authorize_redirect};
pub use config::{IdentityConfig, PortalConfig, RequestProfile};
pub use error::{Error, Result};
pub use fetch::DataFetcher;
pub use identity::{CredentialExchange, Credentials, TokenSet};
pub use merge::{MergeOutcome, MergedCatalog, SessionRecord, merge};
pub use pipeline::{RunOptions, RunOutput, run, write_json};
pub use redact::Redactor;
pub use redirect::{RedirectHop, RedirectWalker, resolve_location};
pub use reinvent_protocol as protocol;
