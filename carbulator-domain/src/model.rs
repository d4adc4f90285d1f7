use rust_decimal::Decimal;
use std::{
    collections::BTreeMap,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommunityId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TripId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuelPurchaseId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DebtId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayoffId(pub u64);

macro_rules! display_id {
    ($($id:ty),* $(,)?) => {
        $(
            impl fmt::Display for $id {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

display_id!(MemberId, CommunityId, TripId, FuelPurchaseId, DebtId, PayoffId);

/// Net position per member (positive: is owed money, negative: owes money).
pub type MemberBalances = BTreeMap<MemberId, Money>;

/// Monetary amount with exact decimal arithmetic.
///
/// Amounts are never rounded implicitly; see `SettlementContext::round`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Odometer reading or driven distance in kilometres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance(Decimal);

impl Distance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Equal share of this distance for `parts` participants.
    pub fn split(self, parts: usize) -> Self {
        if parts == 0 {
            return Self::ZERO;
        }
        Self(self.0 / Decimal::from(parts))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} km", self.0)
    }
}

impl Add for Distance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Distance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Distance {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Distance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub community_id: CommunityId,
    pub owner: MemberId,
    pub passengers: Vec<MemberId>,
    pub start_distance: Distance,
    pub end_distance: Option<Distance>,
    pub is_open: bool,
    pub payoff_id: Option<PayoffId>,
}

impl Trip {
    pub fn is_finished(&self) -> bool {
        self.end_distance.is_some()
    }

    pub fn is_running(&self) -> bool {
        !self.is_finished()
    }

    pub fn is_unpaid(&self) -> bool {
        self.is_open
    }

    /// Driven distance, `None` while the trip is still running.
    pub fn distance(&self) -> Option<Distance> {
        self.end_distance.map(|end| end - self.start_distance)
    }

    /// Owner followed by passengers, each member listed once.
    pub fn participants(&self) -> Vec<MemberId> {
        let mut participants = Vec::with_capacity(self.passengers.len() + 1);
        participants.push(self.owner);
        for passenger in &self.passengers {
            if !participants.contains(passenger) {
                participants.push(*passenger);
            }
        }
        participants
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FuelPurchase {
    pub id: FuelPurchaseId,
    pub community_id: CommunityId,
    pub owner: MemberId,
    pub cost: Money,
    pub is_open: bool,
    pub payoff_id: Option<PayoffId>,
}

impl FuelPurchase {
    pub fn is_unpaid(&self) -> bool {
        self.is_open
    }
}

/// Directed claim: `debtor` owes `creditor` the `amount`.
#[derive(Clone, Debug, PartialEq)]
pub struct Debt {
    pub id: DebtId,
    pub debtor: MemberId,
    pub creditor: MemberId,
    pub amount: Money,
    pub is_settled: bool,
    pub payoff_id: PayoffId,
    pub community_id: CommunityId,
}

impl Debt {
    pub fn involves(&self, member: MemberId) -> bool {
        self.debtor == member || self.creditor == member
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Payoff {
    pub id: PayoffId,
    pub community_id: CommunityId,
    pub is_settled: bool,
    pub debts: Vec<Debt>,
    pub trips: Vec<Trip>,
    pub fuel_purchases: Vec<FuelPurchase>,
}

impl Payoff {
    pub fn new(id: PayoffId, community_id: CommunityId) -> Self {
        Self {
            id,
            community_id,
            is_settled: false,
            debts: Vec::new(),
            trips: Vec::new(),
            fuel_purchases: Vec::new(),
        }
    }
}
