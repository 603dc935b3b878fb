//! # Tally Engine
//!
//! The inventory reconciliation engine for Tally.
//!
//! This crate owns the rules that turn stock movements into item quantities.
//! It is storage-agnostic: a storage layer locks an item, hands the current
//! quantity to the engine, and persists the [`Transition`] it gets back inside
//! the same unit of work.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of databases, network, or clocks
//! - **Never negative**: Every computed quantity is clamped at zero
//! - **Testable**: Pure logic plus an in-memory [`Ledger`] reference model
//!
//! ## Core Concepts
//!
//! ### Items
//!
//! An [`Item`] is a stock-keeping unit with a current quantity and an optional
//! low-stock minimum.
//!
//! ### Movements
//!
//! A [`Movement`] records one change of quantity:
//! - [`MovementKind::Inbound`] - adds its magnitude
//! - [`MovementKind::Outbound`] - removes its magnitude
//! - [`MovementKind::Absolute`] - resets the quantity to its magnitude
//!
//! Inbound and outbound movements can later be corrected or reversed; the
//! engine re-derives the quantity from the difference. Absolute movements
//! are final.
//!
//! ### Threshold crossing
//!
//! [`Transition::crosses_minimum`] decides whether an operation must raise a
//! low-stock notification: the quantity changed and landed at or below the
//! item's minimum.
//!
//! ## Quick Start
//!
//! ```rust
//! use tally_engine::{Ledger, MovementKind, MovementRequest, NewItem};
//!
//! let mut ledger = Ledger::new();
//! ledger
//!     .register(
//!         "item_1",
//!         NewItem { name: "Bolts".into(), unit: "pcs".into(), minimum: Some(5) },
//!         1706745600000,
//!     )
//!     .unwrap();
//!
//! ledger
//!     .apply("item_1", "mv_1", MovementRequest::new(MovementKind::Absolute, 10), 1706745600000)
//!     .unwrap();
//!
//! let outcome = ledger
//!     .apply("item_1", "mv_2", MovementRequest::new(MovementKind::Outbound, 6), 1706745601000)
//!     .unwrap();
//!
//! assert_eq!(outcome.item.quantity, 4);
//! assert!(outcome.crossed_minimum());
//! ```

pub mod error;
pub mod item;
pub mod ledger;
pub mod movement;
pub mod reconcile;

// Re-export main types at crate root
pub use error::{Error, ErrorKind};
pub use item::{Item, NewItem};
pub use ledger::Ledger;
pub use movement::{Correction, Movement, MovementKind, MovementRequest};
pub use reconcile::{clamp, plan_apply, plan_correct, plan_reverse, Outcome, Transition};

/// Type aliases for clarity
pub type ItemId = String;
pub type MovementId = String;
pub type Quantity = i64;
pub type Timestamp = u64;
