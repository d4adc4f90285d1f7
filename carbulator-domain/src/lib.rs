#![warn(clippy::uninlined_format_args)]

pub mod model;
pub mod services;

pub use model::{
    CommunityId, Debt, DebtId, Distance, FuelPurchase, FuelPurchaseId, MemberBalances, MemberId,
    Money, Payoff, PayoffId, Trip, TripId,
};
pub use services::{
    CostAttribution, CostAttributionCalculator, CostAttributionError, DebtGraphSimplifier,
    DebtMatrix, DebtMatrixBuilder, MemberUsage, RoundingMode, SettlementContext, UnsupportedScale,
    UsageSummary,
};
