//! Imputation of missing cells.
//!
//! Only last-observation-carried-forward is offered: a filled value never
//! depends on rows that come after it.

mod forward_fill;

pub use forward_fill::ForwardFillImputer;
