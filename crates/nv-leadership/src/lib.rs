//! ES/NQ leadership: short-horizon z-momentum, relative volatility, rolling
//! correlation, and the VIX-regime-gated veto/bonus applied at execution
//! time (spec §4.4).

pub mod engine;
pub mod gate;
pub mod window;

pub use engine::LeadershipEngine;
pub use gate::{gate_for_es, LeadershipGate};
