//! Market data pages: fetch with fallback, then filter, sort and paginate.
//!
//! Each domain ([`schema::crypto`], [`schema::stock`], [`schema::forex`],
//! [`schema::news`]) implements [`record::Record`] and [`schema::Source`];
//! everything else is shared.

pub mod api;
pub mod bookmarks;
pub mod client_ext;
pub mod config;
pub mod debounce;
pub mod fs;
pub mod page;
pub mod pipeline;
pub mod presenter;
pub mod query;
pub mod record;
pub mod schema;
pub mod time;

pub use api::{DataMode, FetchError, Transport};
pub use config::Config;
pub use page::{Action, Page};
pub use query::{QueryState, Selection};
pub use record::Record;
pub use schema::{Loaded, Source};
