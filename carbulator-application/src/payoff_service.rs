use crate::{
    error::PayoffError,
    model::NewDebt,
    ports::{PayoffStore, PayoffTransaction},
};
use carbulator_domain::{
    CommunityId, CostAttributionCalculator, CostAttributionError, Debt, DebtGraphSimplifier,
    DebtId, DebtMatrix, DebtMatrixBuilder, FuelPurchase, MemberId, Payoff, PayoffId,
    SettlementContext, Trip, UsageSummary,
};

/// Settlement entry point for one data store.
pub struct PayoffService<S> {
    store: S,
    context: SettlementContext,
}

impl<S> PayoffService<S>
where
    S: PayoffStore,
{
    pub fn new(store: S, context: SettlementContext) -> Self {
        Self { store, context }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn context(&self) -> SettlementContext {
        self.context
    }

    /// Settle every unpaid trip and fuel purchase of a community.
    ///
    /// Runs inside a single store transaction: either the payoff, all of its
    /// debts and every paid-flag flip become visible together, or nothing does.
    pub fn create_payoff(&self, community_id: CommunityId) -> Result<Payoff, PayoffError> {
        let mut tx = self.store.begin(community_id)?;

        if tx.has_running_trip()? {
            tracing::warn!(
                reject_reason = "running_trip",
                community_id = community_id.0,
                "Payoff rejected"
            );
            return Err(PayoffError::RunningTrip(community_id));
        }

        let trips = tx.list_unpaid_finished_trips()?;
        let fuel_purchases = tx.list_unpaid_fuel_purchases()?;
        if trips.is_empty() && fuel_purchases.is_empty() {
            tracing::warn!(
                reject_reason = "nothing_to_settle",
                community_id = community_id.0,
                "Payoff rejected"
            );
            return Err(PayoffError::NothingToSettle(community_id));
        }
        let unsettled_debts = tx.list_unsettled_debts()?;

        let matrix = self
            .settlement_matrix(&trips, &fuel_purchases, &unsettled_debts)
            .map_err(|err| PayoffError::from_attribution(community_id, err))?;

        let mut payoff = tx.create_payoff()?;
        for (debtor, creditor, amount) in matrix.entries() {
            let debt = tx.create_debt(NewDebt {
                payoff_id: payoff.id,
                community_id,
                debtor,
                creditor,
                amount,
            })?;
            payoff.debts.push(debt);
        }

        if payoff.debts.is_empty() {
            tx.mark_payoff_settled(payoff.id)?;
            payoff.is_settled = true;
        }

        for mut trip in trips {
            tx.mark_trip_paid(trip.id, payoff.id)?;
            trip.is_open = false;
            trip.payoff_id = Some(payoff.id);
            payoff.trips.push(trip);
        }
        for mut purchase in fuel_purchases {
            tx.mark_fuel_purchase_paid(purchase.id, payoff.id)?;
            purchase.is_open = false;
            purchase.payoff_id = Some(payoff.id);
            payoff.fuel_purchases.push(purchase);
        }

        tx.commit()?;

        tracing::info!(
            community_id = community_id.0,
            payoff_id = payoff.id.0,
            debt_count = payoff.debts.len(),
            trip_count = payoff.trips.len(),
            fuel_purchase_count = payoff.fuel_purchases.len(),
            unsettled_debt_count = unsettled_debts.len(),
            is_settled = payoff.is_settled,
            "Payoff created"
        );

        Ok(payoff)
    }

    /// Attribution, matrix construction and cycle cancellation, without side effects.
    pub fn settlement_matrix(
        &self,
        trips: &[Trip],
        fuel_purchases: &[FuelPurchase],
        unsettled_debts: &[Debt],
    ) -> Result<DebtMatrix, CostAttributionError> {
        let attribution = CostAttributionCalculator.attribute(trips, fuel_purchases)?;
        let matrix = DebtMatrixBuilder::new(self.context).build(
            &attribution,
            fuel_purchases,
            unsettled_debts,
        );
        Ok(DebtGraphSimplifier.simplify(matrix))
    }

    /// Mark a debt as paid; its payoff is settled once no open debt remains.
    pub fn settle_debt(
        &self,
        debt_id: DebtId,
        acting_member: MemberId,
    ) -> Result<Debt, PayoffError> {
        self.update_debt(debt_id, acting_member, true)
    }

    /// Reopen a debt; its payoff is no longer settled.
    pub fn unsettle_debt(
        &self,
        debt_id: DebtId,
        acting_member: MemberId,
    ) -> Result<Debt, PayoffError> {
        self.update_debt(debt_id, acting_member, false)
    }

    pub fn payoffs(&self, community_id: CommunityId) -> Result<Vec<Payoff>, PayoffError> {
        Ok(self.store.payoffs_by_community(community_id)?)
    }

    pub fn payoff(&self, payoff_id: PayoffId) -> Result<Payoff, PayoffError> {
        self.store
            .payoff_by_id(payoff_id)?
            .ok_or(PayoffError::PayoffNotFound(payoff_id))
    }

    pub fn unsettled_debts(&self, community_id: CommunityId) -> Result<Vec<Debt>, PayoffError> {
        Ok(self.store.unsettled_debts_by_community(community_id)?)
    }

    pub fn unsettled_debts_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<Debt>, PayoffError> {
        Ok(self.store.unsettled_debts_by_member(member_id)?)
    }

    /// Usage since the last payoff: unpaid finished trips and unpaid fuel purchases.
    pub fn current_usage(&self, community_id: CommunityId) -> Result<UsageSummary, PayoffError> {
        let tx = self.store.begin(community_id)?;
        let trips = tx.list_unpaid_finished_trips()?;
        let fuel_purchases = tx.list_unpaid_fuel_purchases()?;
        Ok(UsageSummary::from_records(&trips, &fuel_purchases))
    }

    fn update_debt(
        &self,
        debt_id: DebtId,
        acting_member: MemberId,
        settled: bool,
    ) -> Result<Debt, PayoffError> {
        let community_id = self
            .store
            .community_of_debt(debt_id)?
            .ok_or(PayoffError::DebtNotFound(debt_id))?;
        let mut tx = self.store.begin(community_id)?;

        let mut debt = tx
            .find_debt(debt_id)?
            .ok_or(PayoffError::DebtNotFound(debt_id))?;
        if !debt.involves(acting_member) {
            return Err(PayoffError::NotDebtParty {
                debt: debt_id,
                member: acting_member,
            });
        }

        tx.set_debt_settled(debt_id, settled)?;
        debt.is_settled = settled;

        let payoff_settled = if settled {
            tx.list_unsettled_debts_by_payoff(debt.payoff_id)?.is_empty()
        } else {
            false
        };
        tx.set_payoff_settled(debt.payoff_id, payoff_settled)?;

        tx.commit()?;

        tracing::debug!(
            debt_id = debt_id.0,
            payoff_id = debt.payoff_id.0,
            member_id = acting_member.0,
            settled,
            payoff_settled,
            "Debt state changed"
        );

        Ok(debt)
    }
}
