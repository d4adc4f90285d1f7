use crate::{error::StoreError, model::NewDebt};
use carbulator_domain::{
    CommunityId, Debt, DebtId, FuelPurchase, FuelPurchaseId, MemberId, Payoff, PayoffId, Trip,
    TripId,
};

/// Data layer consumed by the payoff service.
///
/// `begin` opens a unit of work scoped to one community. Implementations
/// must guarantee that at most one transaction per community is live at a
/// time and that nothing written through it is visible before `commit`.
pub trait PayoffStore: Send + Sync {
    type Transaction<'a>: PayoffTransaction
    where
        Self: 'a;

    fn begin(&self, community_id: CommunityId) -> Result<Self::Transaction<'_>, StoreError>;

    fn community_of_debt(&self, debt_id: DebtId) -> Result<Option<CommunityId>, StoreError>;

    fn payoffs_by_community(&self, community_id: CommunityId) -> Result<Vec<Payoff>, StoreError>;

    fn payoff_by_id(&self, payoff_id: PayoffId) -> Result<Option<Payoff>, StoreError>;

    fn unsettled_debts_by_community(
        &self,
        community_id: CommunityId,
    ) -> Result<Vec<Debt>, StoreError>;

    fn unsettled_debts_by_member(&self, member_id: MemberId) -> Result<Vec<Debt>, StoreError>;
}

/// Unit of work over one community.
///
/// Dropping a transaction without calling `commit` discards every write.
pub trait PayoffTransaction {
    fn has_running_trip(&self) -> Result<bool, StoreError>;

    fn list_unpaid_finished_trips(&self) -> Result<Vec<Trip>, StoreError>;

    fn list_unpaid_fuel_purchases(&self) -> Result<Vec<FuelPurchase>, StoreError>;

    fn list_unsettled_debts(&self) -> Result<Vec<Debt>, StoreError>;

    fn list_unsettled_debts_by_payoff(&self, payoff_id: PayoffId) -> Result<Vec<Debt>, StoreError>;

    fn find_debt(&self, debt_id: DebtId) -> Result<Option<Debt>, StoreError>;

    fn create_payoff(&mut self) -> Result<Payoff, StoreError>;

    fn create_debt(&mut self, debt: NewDebt) -> Result<Debt, StoreError>;

    fn mark_trip_paid(&mut self, trip_id: TripId, payoff_id: PayoffId) -> Result<(), StoreError>;

    fn mark_fuel_purchase_paid(
        &mut self,
        fuel_purchase_id: FuelPurchaseId,
        payoff_id: PayoffId,
    ) -> Result<(), StoreError>;

    fn mark_payoff_settled(&mut self, payoff_id: PayoffId) -> Result<(), StoreError> {
        self.set_payoff_settled(payoff_id, true)
    }

    fn set_payoff_settled(&mut self, payoff_id: PayoffId, settled: bool)
    -> Result<(), StoreError>;

    fn set_debt_settled(&mut self, debt_id: DebtId, settled: bool) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}
