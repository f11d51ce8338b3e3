//! ftrl: FTRL-Proximal online learning over hashed features.
//!
//! An online learning engine fitting binomial, multinomial and regression
//! targets incrementally over one or more passes of a columnar view, using
//! the hashing trick to map arbitrary-width categorical/numeric/string
//! features into a fixed-size weight table. Supports validation-driven
//! early stopping, feature interactions and feature-importance accounting.
//!
//! # Key Types
//!
//! - [`Ftrl`] / [`FtrlBuilder`] - the model, with fit/predict/reset
//! - [`FtrlParams`] / [`ValidationParams`] - configuration
//! - [`Frame`] / [`Column`] / [`DataView`] - columnar data access
//! - [`Snapshot`] - persisted model state
//!
//! # Training
//!
//! ```
//! use ftrl::{Column, Frame, Ftrl};
//!
//! let x = Frame::new(vec![
//!     Column::from_strs("word", vec!["cucumber", "sky", "day"]),
//! ])?;
//! let y = Frame::single(Column::from_strs("color", vec!["green", "blue", "green"]));
//!
//! let mut model = Ftrl::builder().alpha(0.2).nbins(1 << 10).build()?;
//! model.fit(&x, &y)?;
//!
//! // One probability column per label, `_negative` first, rows sum to 1.
//! let probs = model.predict(&x)?;
//! assert_eq!(probs.n_cols(), model.labels().unwrap().len());
//! # Ok::<(), ftrl::FtrlError>(())
//! ```
//!
//! # Persistence
//!
//! A trained model round-trips through [`Ftrl::to_bytes`] /
//! [`Ftrl::from_bytes`]; the restored instance continues incremental `fit`
//! and serves `predict` bit-identically.

pub mod data;
pub mod error;
pub mod hash;
pub mod io;
pub mod model;
pub mod parallel;

mod inference;
mod training;

// High-level model types
pub use model::{Ftrl, FtrlBuilder, FtrlParams, Interaction, TargetFamily, ValidationParams};

// Data types (for preparing training data)
pub use data::{Column, ColumnKind, DataView, Frame, FrameSlice, Value};

// Errors and persistence
pub use error::FtrlError;
pub use io::Snapshot;

// Shared utilities
pub use parallel::Parallelism;
