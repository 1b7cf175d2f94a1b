//! Shared primitive types used across the analysis.

/// The canonical analysis run identifier.
pub type RunId = String;

/// Identifies a paying user in the transaction export.
pub type UserId = String;

/// Subscription product identifier, e.g. `tenwords_1w_9.99_offer`.
pub type ProductId = String;

/// 1-based position of a transaction in a user's chronological history.
pub type TransactionNumber = u32;
