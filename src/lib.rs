// Client Roster - Core Library
// Feed ingestion, decoding, joining and listing for the bank client roster.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod error;
pub mod locale;         // Currency/date parsing shared by every view
pub mod decoder;        // Raw rows → typed entities
pub mod entities;       // Client, Account, Agency
pub mod feed;           // CSV feeds over HTTP
pub mod joiner;         // Client ↔ accounts ↔ agency
pub mod listing;        // Search, ordering, pagination, session state
pub mod lifecycle;      // View liveness, one-time resource loading
pub mod directory;      // Consumer-facing operations
pub mod config;

// Re-export commonly used types
pub use error::{FeedError, FeedResult};
pub use locale::{
    parse_currency, parse_integer, parse_date, format_money, format_brl, format_date,
    or_unavailable, unknown_date, RawAmount, UNAVAILABLE,
};
pub use decoder::{
    FeedKind, FeedRecord, RawRow, RawFeed,
    decode_feed, check_schema, dedupe_headers,
};
pub use entities::{
    Client, IdentityDocument,
    Account, AccountType,
    Agency,
};
pub use feed::{FeedFetcher, FeedLoader, HttpFetcher, MemoryFetcher, parse_feed_text};
pub use joiner::{
    ClientKey, ClientDetail,
    find_client, accounts_of, agency_of, resolve_detail,
};
pub use listing::{
    ListingEngine, ListingState, ClientPage, EmptyState,
    SessionStore, MemorySessionStore, JsonFileSessionStore,
    PAGE_SIZE,
};
pub use lifecycle::{
    ViewScope, LiveToken, ViewSlot, LoadState, load_until_closed,
    ResourceLoader, ResourceState,
};
pub use directory::{ClientDirectory, FeedBatch, DashboardSummary, list_loaded};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
