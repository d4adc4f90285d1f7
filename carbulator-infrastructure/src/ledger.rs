use carbulator_application::{NewDebt, StoreError};
use carbulator_domain::{
    CommunityId, Distance, FuelPurchase, FuelPurchaseId, MemberId, Money, PayoffId, Trip, TripId,
};
use carbulator_parser::{Entry, EntryWithLine, ParseError, parse_ledger};

use crate::memory_store::InMemoryPayoffStore;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Debt at line {line} must be owed to someone else and be greater than zero.")]
    InvalidDebt { line: usize },
    #[error("Amount at line {line} exceeds {max}.")]
    AmountOutOfRange { line: usize, max: Money },
    #[error("Odometer reading at line {line} exceeds {max}.")]
    OdometerOutOfRange { line: usize, max: Distance },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Largest fuel cost or debt amount a ledger may carry (ten digits, two of
/// them decimals).
fn max_amount() -> Money {
    Money::new(9_999_999_999, 2)
}

/// Largest odometer reading a ledger may carry (ten digits, one of them a
/// decimal).
fn max_odometer() -> Distance {
    Distance::new(9_999_999_999, 1)
}

/// What `import_ledger` added to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerImport {
    pub trips: usize,
    pub fuel_purchases: usize,
    pub debts: usize,
    /// Payoff that carries the imported debts, if there were any.
    pub carried_payoff: Option<PayoffId>,
}

/// Parse a ledger file and record its contents for one community.
///
/// Debts listed in the file are attached to a single unsettled payoff so
/// they take part in the next settlement like any other open debt.
pub fn import_ledger(
    store: &InMemoryPayoffStore,
    community_id: CommunityId,
    content: &str,
) -> Result<LedgerImport, LedgerImportError> {
    let ledger = parse_ledger(content)?;

    for entry in &ledger.entries {
        validate(entry)?;
    }

    let mut summary = LedgerImport::default();
    for entry in &ledger.entries {
        match &entry.entry {
            Entry::Trip(trip) => {
                store.record_trip(Trip {
                    id: TripId(trip.id),
                    community_id,
                    owner: MemberId(trip.owner),
                    passengers: trip.passengers.iter().copied().map(MemberId).collect(),
                    start_distance: Distance::from_decimal(trip.start_km),
                    end_distance: trip.end_km.map(Distance::from_decimal),
                    is_open: true,
                    payoff_id: None,
                });
                summary.trips += 1;
            }
            Entry::Fuel(fuel) => {
                store.record_fuel_purchase(FuelPurchase {
                    id: FuelPurchaseId(fuel.id),
                    community_id,
                    owner: MemberId(fuel.owner),
                    cost: Money::from_decimal(fuel.cost),
                    is_open: true,
                    payoff_id: None,
                });
                summary.fuel_purchases += 1;
            }
            Entry::Debt(debt) => {
                let payoff_id = *summary
                    .carried_payoff
                    .get_or_insert_with(|| store.record_payoff(community_id).id);
                store.record_debt(NewDebt {
                    payoff_id,
                    community_id,
                    debtor: MemberId(debt.debtor),
                    creditor: MemberId(debt.creditor),
                    amount: Money::from_decimal(debt.amount),
                })?;
                summary.debts += 1;
            }
        }
    }

    tracing::debug!(
        community_id = community_id.0,
        trips = summary.trips,
        fuel_purchases = summary.fuel_purchases,
        debts = summary.debts,
        "Ledger imported"
    );

    Ok(summary)
}

fn validate(entry: &EntryWithLine) -> Result<(), LedgerImportError> {
    let line = entry.line;
    let amount_in_range = |amount| {
        if Money::from_decimal(amount) > max_amount() {
            Err(LedgerImportError::AmountOutOfRange {
                line,
                max: max_amount(),
            })
        } else {
            Ok(())
        }
    };

    match &entry.entry {
        Entry::Trip(trip) => {
            let highest = trip.end_km.map_or(trip.start_km, |end| end.max(trip.start_km));
            if Distance::from_decimal(highest) > max_odometer() {
                return Err(LedgerImportError::OdometerOutOfRange {
                    line,
                    max: max_odometer(),
                });
            }
            Ok(())
        }
        Entry::Fuel(fuel) => amount_in_range(fuel.cost),
        Entry::Debt(debt) => {
            if debt.debtor == debt.creditor || debt.amount.is_zero() {
                return Err(LedgerImportError::InvalidDebt { line });
            }
            amount_in_range(debt.amount)
        }
    }
}
