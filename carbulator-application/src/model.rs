use carbulator_domain::{CommunityId, MemberId, Money, PayoffId};

/// Debt row to be persisted by a `PayoffTransaction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewDebt {
    pub payoff_id: PayoffId,
    pub community_id: CommunityId,
    pub debtor: MemberId,
    pub creditor: MemberId,
    pub amount: Money,
}
