use carbulator_domain::{
    CommunityId, CostAttributionError, DebtId, FuelPurchaseId, MemberId, PayoffId, TripId,
};
use thiserror::Error;

/// How a caller should surface a failed operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The request cannot be fulfilled in the current state; nothing changed.
    Rejected,
    NotFound,
    /// The data layer failed; the operation was rolled back.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("trip {0} does not exist")]
    UnknownTrip(TripId),
    #[error("fuel purchase {0} does not exist")]
    UnknownFuelPurchase(FuelPurchaseId),
    #[error("debt {0} does not exist")]
    UnknownDebt(DebtId),
    #[error("payoff {0} does not exist")]
    UnknownPayoff(PayoffId),
    #[error("data store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoffError {
    #[error("community {0} has a trip in progress")]
    RunningTrip(CommunityId),
    #[error("community {0} has no new trips or fuel purchases to settle")]
    NothingToSettle(CommunityId),
    #[error("community {0} has fuel costs but no driven distance to attribute them to")]
    ZeroTotalDistance(CommunityId),
    #[error("trip {trip} in community {community} ends before it starts")]
    InvalidOdometer { community: CommunityId, trip: TripId },
    #[error("debt {0} does not exist")]
    DebtNotFound(DebtId),
    #[error("payoff {0} does not exist")]
    PayoffNotFound(PayoffId),
    #[error("member {member} is neither debtor nor creditor of debt {debt}")]
    NotDebtParty { debt: DebtId, member: MemberId },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PayoffError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PayoffError::RunningTrip(_)
            | PayoffError::NothingToSettle(_)
            | PayoffError::ZeroTotalDistance(_)
            | PayoffError::InvalidOdometer { .. }
            | PayoffError::NotDebtParty { .. } => FailureKind::Rejected,
            PayoffError::DebtNotFound(_) | PayoffError::PayoffNotFound(_) => FailureKind::NotFound,
            PayoffError::Store(_) => FailureKind::Internal,
        }
    }

    pub(crate) fn from_attribution(community: CommunityId, err: CostAttributionError) -> Self {
        match err {
            CostAttributionError::ZeroTotalDistance => PayoffError::ZeroTotalDistance(community),
            CostAttributionError::InvalidOdometer { trip } => {
                PayoffError::InvalidOdometer { community, trip }
            }
        }
    }
}
