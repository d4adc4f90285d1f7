pub mod cost_attribution;
pub mod debt_graph;
pub mod debt_matrix;
pub mod settlement_context;
pub mod usage_summary;

pub use cost_attribution::{CostAttribution, CostAttributionCalculator, CostAttributionError};
pub use debt_graph::DebtGraphSimplifier;
pub use debt_matrix::{DebtMatrix, DebtMatrixBuilder};
pub use settlement_context::{RoundingMode, SettlementContext, UnsupportedScale};
pub use usage_summary::{MemberUsage, UsageSummary};
