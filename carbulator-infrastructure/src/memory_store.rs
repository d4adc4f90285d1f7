use carbulator_application::{NewDebt, PayoffStore, PayoffTransaction, StoreError};
use carbulator_domain::{
    CommunityId, Debt, DebtId, FuelPurchase, FuelPurchaseId, MemberId, Payoff, PayoffId, Trip,
    TripId,
};
use dashmap::{
    DashMap,
    mapref::{
        entry::{Entry, VacantEntry},
        one::RefMut,
    },
};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug)]
struct PayoffRecord {
    id: PayoffId,
    community_id: CommunityId,
    is_settled: bool,
}

/// Everything stored for one community. Transactions work on a clone of it.
#[derive(Clone, Debug, Default)]
struct CommunityLedger {
    trips: IndexMap<TripId, Trip>,
    fuel_purchases: IndexMap<FuelPurchaseId, FuelPurchase>,
    debts: IndexMap<DebtId, Debt>,
    payoffs: IndexMap<PayoffId, PayoffRecord>,
}

impl CommunityLedger {
    fn payoff(&self, payoff_id: PayoffId) -> Option<Payoff> {
        let record = self.payoffs.get(&payoff_id)?;
        let mut payoff = Payoff::new(record.id, record.community_id);
        payoff.is_settled = record.is_settled;
        payoff.debts = self
            .debts
            .values()
            .filter(|debt| debt.payoff_id == payoff_id)
            .cloned()
            .collect();
        payoff.trips = self
            .trips
            .values()
            .filter(|trip| trip.payoff_id == Some(payoff_id))
            .cloned()
            .collect();
        payoff.fuel_purchases = self
            .fuel_purchases
            .values()
            .filter(|purchase| purchase.payoff_id == Some(payoff_id))
            .cloned()
            .collect();
        Some(payoff)
    }

    fn is_empty(&self) -> bool {
        self.trips.is_empty()
            && self.fuel_purchases.is_empty()
            && self.debts.is_empty()
            && self.payoffs.is_empty()
    }

    fn unsettled_debts(&self) -> impl Iterator<Item = &Debt> + '_ {
        self.debts.values().filter(|debt| !debt.is_settled)
    }

    fn insert_debt(&mut self, id: DebtId, debt: NewDebt) -> Result<Debt, StoreError> {
        if !self.payoffs.contains_key(&debt.payoff_id) {
            return Err(StoreError::UnknownPayoff(debt.payoff_id));
        }
        let debt = Debt {
            id,
            debtor: debt.debtor,
            creditor: debt.creditor,
            amount: debt.amount,
            is_settled: false,
            payoff_id: debt.payoff_id,
            community_id: debt.community_id,
        };
        self.debts.insert(id, debt.clone());
        Ok(debt)
    }
}

/// Monotonic id source. Ids handed to rolled back transactions are not reused.
#[derive(Debug)]
struct Sequence(AtomicU64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Process-local `PayoffStore`.
///
/// Each community's ledger lives in its own map entry. A transaction holds the
/// entry's write guard from `begin` until it is committed or dropped, which
/// serializes payoff operations per community while leaving other
/// communities untouched.
///
/// Queries on the store itself wait for a running transaction of the same
/// shard; do not call them while holding a transaction on the same thread.
#[derive(Debug)]
pub struct InMemoryPayoffStore {
    ledgers: DashMap<CommunityId, CommunityLedger>,
    debt_communities: DashMap<DebtId, CommunityId>,
    payoff_communities: DashMap<PayoffId, CommunityId>,
    debt_ids: Sequence,
    payoff_ids: Sequence,
}

impl Default for InMemoryPayoffStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPayoffStore {
    pub fn new() -> Self {
        Self {
            ledgers: DashMap::new(),
            debt_communities: DashMap::new(),
            payoff_communities: DashMap::new(),
            debt_ids: Sequence::new(),
            payoff_ids: Sequence::new(),
        }
    }

    /// Insert or replace a trip as recorded by the trip log.
    pub fn record_trip(&self, trip: Trip) {
        let mut ledger = self.ledgers.entry(trip.community_id).or_default();
        ledger.trips.insert(trip.id, trip);
    }

    pub fn record_fuel_purchase(&self, purchase: FuelPurchase) {
        let mut ledger = self.ledgers.entry(purchase.community_id).or_default();
        ledger.fuel_purchases.insert(purchase.id, purchase);
    }

    /// Create an empty, unsettled payoff outside of any settlement run.
    pub fn record_payoff(&self, community_id: CommunityId) -> Payoff {
        let id = PayoffId(self.payoff_ids.next());
        let mut ledger = self.ledgers.entry(community_id).or_default();
        ledger.payoffs.insert(
            id,
            PayoffRecord {
                id,
                community_id,
                is_settled: false,
            },
        );
        self.payoff_communities.insert(id, community_id);
        Payoff::new(id, community_id)
    }

    pub fn record_debt(&self, debt: NewDebt) -> Result<Debt, StoreError> {
        let id = DebtId(self.debt_ids.next());
        let mut ledger = self.ledgers.entry(debt.community_id).or_default();
        let debt = ledger.insert_debt(id, debt)?;
        self.debt_communities.insert(id, debt.community_id);
        Ok(debt)
    }

    pub fn trips(&self, community_id: CommunityId) -> Vec<Trip> {
        self.ledgers
            .get(&community_id)
            .map(|ledger| ledger.trips.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn fuel_purchases(&self, community_id: CommunityId) -> Vec<FuelPurchase> {
        self.ledgers
            .get(&community_id)
            .map(|ledger| ledger.fuel_purchases.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn debts(&self, community_id: CommunityId) -> Vec<Debt> {
        self.ledgers
            .get(&community_id)
            .map(|ledger| ledger.debts.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl PayoffStore for InMemoryPayoffStore {
    type Transaction<'a> = InMemoryTransaction<'a>;

    fn begin(&self, community_id: CommunityId) -> Result<Self::Transaction<'_>, StoreError> {
        let (committed, staged) = match self.ledgers.entry(community_id) {
            Entry::Occupied(entry) => {
                let committed = entry.into_ref();
                let staged = committed.value().clone();
                (LedgerGuard::Occupied(committed), staged)
            }
            Entry::Vacant(entry) => (LedgerGuard::Vacant(entry), CommunityLedger::default()),
        };
        Ok(InMemoryTransaction {
            store: self,
            community_id,
            committed,
            staged,
        })
    }

    fn community_of_debt(&self, debt_id: DebtId) -> Result<Option<CommunityId>, StoreError> {
        Ok(self
            .debt_communities
            .get(&debt_id)
            .map(|entry| *entry.value()))
    }

    fn payoffs_by_community(&self, community_id: CommunityId) -> Result<Vec<Payoff>, StoreError> {
        Ok(self
            .ledgers
            .get(&community_id)
            .map(|ledger| {
                ledger
                    .payoffs
                    .keys()
                    .filter_map(|id| ledger.payoff(*id))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn payoff_by_id(&self, payoff_id: PayoffId) -> Result<Option<Payoff>, StoreError> {
        let Some(community_id) = self
            .payoff_communities
            .get(&payoff_id)
            .map(|entry| *entry.value())
        else {
            return Ok(None);
        };
        Ok(self
            .ledgers
            .get(&community_id)
            .and_then(|ledger| ledger.payoff(payoff_id)))
    }

    fn unsettled_debts_by_community(
        &self,
        community_id: CommunityId,
    ) -> Result<Vec<Debt>, StoreError> {
        Ok(self
            .ledgers
            .get(&community_id)
            .map(|ledger| ledger.unsettled_debts().cloned().collect())
            .unwrap_or_default())
    }

    fn unsettled_debts_by_member(&self, member_id: MemberId) -> Result<Vec<Debt>, StoreError> {
        let mut debts: Vec<Debt> = self
            .ledgers
            .iter()
            .flat_map(|ledger| {
                ledger
                    .unsettled_debts()
                    .filter(|debt| debt.involves(member_id))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        debts.sort_by_key(|debt| debt.id);
        Ok(debts)
    }
}

/// Write access to a community slot. A vacant slot stays vacant unless a
/// commit has something to store.
enum LedgerGuard<'a> {
    Occupied(RefMut<'a, CommunityId, CommunityLedger>),
    Vacant(VacantEntry<'a, CommunityId, CommunityLedger>),
}

impl LedgerGuard<'_> {
    fn ledger(&self) -> Option<&CommunityLedger> {
        match self {
            LedgerGuard::Occupied(committed) => Some(committed.value()),
            LedgerGuard::Vacant(_) => None,
        }
    }
}

/// Exclusive unit of work over one community ledger.
///
/// Reads see the transaction's own writes. Dropping it releases the
/// community without publishing anything.
pub struct InMemoryTransaction<'a> {
    store: &'a InMemoryPayoffStore,
    community_id: CommunityId,
    committed: LedgerGuard<'a>,
    staged: CommunityLedger,
}

impl PayoffTransaction for InMemoryTransaction<'_> {
    fn has_running_trip(&self) -> Result<bool, StoreError> {
        Ok(self.staged.trips.values().any(Trip::is_running))
    }

    fn list_unpaid_finished_trips(&self) -> Result<Vec<Trip>, StoreError> {
        Ok(self
            .staged
            .trips
            .values()
            .filter(|trip| trip.is_finished() && trip.is_unpaid())
            .cloned()
            .collect())
    }

    fn list_unpaid_fuel_purchases(&self) -> Result<Vec<FuelPurchase>, StoreError> {
        Ok(self
            .staged
            .fuel_purchases
            .values()
            .filter(|purchase| purchase.is_unpaid())
            .cloned()
            .collect())
    }

    fn list_unsettled_debts(&self) -> Result<Vec<Debt>, StoreError> {
        Ok(self.staged.unsettled_debts().cloned().collect())
    }

    fn list_unsettled_debts_by_payoff(&self, payoff_id: PayoffId) -> Result<Vec<Debt>, StoreError> {
        Ok(self
            .staged
            .unsettled_debts()
            .filter(|debt| debt.payoff_id == payoff_id)
            .cloned()
            .collect())
    }

    fn find_debt(&self, debt_id: DebtId) -> Result<Option<Debt>, StoreError> {
        Ok(self.staged.debts.get(&debt_id).cloned())
    }

    fn create_payoff(&mut self) -> Result<Payoff, StoreError> {
        let id = PayoffId(self.store.payoff_ids.next());
        self.staged.payoffs.insert(
            id,
            PayoffRecord {
                id,
                community_id: self.community_id,
                is_settled: false,
            },
        );
        Ok(Payoff::new(id, self.community_id))
    }

    fn create_debt(&mut self, debt: NewDebt) -> Result<Debt, StoreError> {
        let id = DebtId(self.store.debt_ids.next());
        self.staged.insert_debt(id, debt)
    }

    fn mark_trip_paid(&mut self, trip_id: TripId, payoff_id: PayoffId) -> Result<(), StoreError> {
        if !self.staged.payoffs.contains_key(&payoff_id) {
            return Err(StoreError::UnknownPayoff(payoff_id));
        }
        let trip = self
            .staged
            .trips
            .get_mut(&trip_id)
            .ok_or(StoreError::UnknownTrip(trip_id))?;
        trip.is_open = false;
        trip.payoff_id = Some(payoff_id);
        Ok(())
    }

    fn mark_fuel_purchase_paid(
        &mut self,
        fuel_purchase_id: FuelPurchaseId,
        payoff_id: PayoffId,
    ) -> Result<(), StoreError> {
        if !self.staged.payoffs.contains_key(&payoff_id) {
            return Err(StoreError::UnknownPayoff(payoff_id));
        }
        let purchase = self
            .staged
            .fuel_purchases
            .get_mut(&fuel_purchase_id)
            .ok_or(StoreError::UnknownFuelPurchase(fuel_purchase_id))?;
        purchase.is_open = false;
        purchase.payoff_id = Some(payoff_id);
        Ok(())
    }

    fn set_payoff_settled(&mut self, payoff_id: PayoffId, settled: bool) -> Result<(), StoreError> {
        let payoff = self
            .staged
            .payoffs
            .get_mut(&payoff_id)
            .ok_or(StoreError::UnknownPayoff(payoff_id))?;
        payoff.is_settled = settled;
        Ok(())
    }

    fn set_debt_settled(&mut self, debt_id: DebtId, settled: bool) -> Result<(), StoreError> {
        let debt = self
            .staged
            .debts
            .get_mut(&debt_id)
            .ok_or(StoreError::UnknownDebt(debt_id))?;
        debt.is_settled = settled;
        Ok(())
    }

    fn commit(self) -> Result<(), StoreError> {
        let Self {
            store,
            community_id,
            committed,
            staged,
        } = self;

        let previous = committed.ledger();
        let new_debts: Vec<DebtId> = staged
            .debts
            .keys()
            .filter(|id| previous.is_none_or(|ledger| !ledger.debts.contains_key(*id)))
            .copied()
            .collect();
        let new_payoffs: Vec<PayoffId> = staged
            .payoffs
            .keys()
            .filter(|id| previous.is_none_or(|ledger| !ledger.payoffs.contains_key(*id)))
            .copied()
            .collect();

        match committed {
            LedgerGuard::Occupied(mut committed) => *committed = staged,
            LedgerGuard::Vacant(slot) => {
                if !staged.is_empty() {
                    slot.insert(staged);
                }
            }
        }
        for id in &new_debts {
            store.debt_communities.insert(*id, community_id);
        }
        for id in &new_payoffs {
            store.payoff_communities.insert(*id, community_id);
        }

        tracing::trace!(
            community_id = community_id.0,
            new_debts = new_debts.len(),
            new_payoffs = new_payoffs.len(),
            "Transaction committed"
        );
        Ok(())
    }
}
