//! Model state and the public facade.
//!
//! - [`Ftrl`] / [`FtrlBuilder`]: the user-facing model
//! - [`FtrlParams`] / [`ValidationParams`] / [`Interaction`]: configuration
//! - [`WeightStore`]: `(z, n)` accumulators with the FTRL-Proximal update
//! - [`LabelRegistry`]: insertion-ordered multinomial labels
//! - [`ImportanceTracker`]: running feature-importance means
//! - [`Scalar`]: the `f32`/`f64` storage-precision abstraction

mod ftrl;
pub mod importance;
pub mod labels;
pub mod params;
pub mod scalar;
pub mod state;
pub mod store;

pub use ftrl::{Ftrl, FtrlBuilder};
pub use importance::ImportanceTracker;
pub use labels::{LabelRegistry, NEGATIVE_LABEL};
pub use params::{FtrlParams, Interaction, ValidationParams};
pub use scalar::Scalar;
pub use state::TargetFamily;
pub use store::WeightStore;
