//! Data processing modules.

pub mod aggregate;
pub mod cleaning;
pub mod fitting;

// Re-export key types for convenience
pub use aggregate::{aggregate_by_gain, GainStat};
pub use cleaning::{mask_bad_combos, mask_overflow};
pub use fitting::{fit_ir_groups, fit_line, fit_vis_groups, IrGroupFit, LineFit, VisGroupFit};
