//! The URIs of the app's pages and API endpoints.

/// The home page, which shows the ledger and the form for adding transactions.
pub const ROOT: &str = "/";
/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
