//! `tgn-model` — the pure-math half of the TGn MIMO channel model.
//!
//! Nothing in this crate knows about nodes, links, or threads.  It turns a
//! published profile letter plus two antenna arrays into correlation factors,
//! turns white noise into Doppler-shaped fading, and turns per-tap matrices
//! into per-subcarrier matrices.
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`profile`]     | `ModelLetter`, `ChannelProfile`, `TapProfile`, `ClusterDescriptor` |
//! | [`laplacian`]   | Angular spread → truncated-Laplacian scale lookup          |
//! | [`bessel`]      | `J_n(x)` sequences by backward recurrence                  |
//! | [`array`]       | `UniformLinearArray`, LOS steering vectors                 |
//! | [`correlation`] | Angular correlation, Toeplitz, Kronecker, Cholesky         |
//! | [`filter`]      | Bell IIR fading filter                                     |
//! | [`assembler`]   | Tap matrices → subcarrier matrices                         |
//! | [`matrix`]      | `ComplexMatrix`, a small dense row-major container         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on `ModelLetter` and `UniformLinearArray`. |

pub mod array;
pub mod assembler;
pub mod bessel;
pub mod correlation;
pub mod error;
pub mod filter;
pub mod laplacian;
pub mod matrix;
pub mod profile;


pub use num_complex::Complex64;

pub use array::UniformLinearArray;
pub use assembler::{SubcarrierLayout, assemble_subcarrier_matrices};
pub use correlation::{cholesky_factor, correlation_factor, spatial_correlation};
pub use error::{ModelError, ModelResult};
pub use filter::{FadingFilterState, NORMALIZED_DOPPLER_SPREAD, WARMUP_SAMPLES};
pub use matrix::ComplexMatrix;
pub use profile::{ChannelProfile, ClusterDescriptor, ModelLetter, TapProfile};
