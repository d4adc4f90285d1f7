use crate::{
    model::{Debt, FuelPurchase, MemberBalances, MemberId, Money},
    services::{CostAttribution, SettlementContext},
};
use fxhash::FxHashMap;
use indexmap::IndexSet;

/// Dense `n × n` matrix of pairwise amounts, `cell(debtor, creditor)`.
///
/// Rows and columns share one member index assigned at construction; a
/// nonzero cell is an edge `debtor -> creditor` of the debt graph.
#[derive(Clone, Debug, PartialEq)]
pub struct DebtMatrix {
    members: Vec<MemberId>,
    index: FxHashMap<MemberId, usize>,
    cells: Vec<Money>,
}

impl DebtMatrix {
    /// Empty matrix over `members`; repeated ids keep their first index.
    pub fn new<I>(members: I) -> Self
    where
        I: IntoIterator<Item = MemberId>,
    {
        let members: Vec<MemberId> = members
            .into_iter()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let index = members
            .iter()
            .enumerate()
            .map(|(idx, member)| (*member, idx))
            .collect();
        let cells = vec![Money::ZERO; members.len() * members.len()];
        Self {
            members,
            index,
            cells,
        }
    }

    /// Matrix over `members` holding the given `(debtor, creditor, amount)` entries.
    ///
    /// Entries for unknown members are ignored; repeated pairs add up.
    pub fn from_entries<I, E>(members: I, entries: E) -> Self
    where
        I: IntoIterator<Item = MemberId>,
        E: IntoIterator<Item = (MemberId, MemberId, Money)>,
    {
        let mut matrix = Self::new(members);
        for (debtor, creditor, amount) in entries {
            if let (Some(row), Some(col)) = (matrix.index_of(debtor), matrix.index_of(creditor)) {
                matrix.add(row, col, amount);
            }
        }
        matrix
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    pub fn member_at(&self, idx: usize) -> MemberId {
        self.members[idx]
    }

    pub fn index_of(&self, member: MemberId) -> Option<usize> {
        self.index.get(&member).copied()
    }

    pub fn get(&self, debtor: usize, creditor: usize) -> Money {
        self.cells[self.offset(debtor, creditor)]
    }

    /// Amount `debtor` owes `creditor`, zero for unknown members.
    pub fn amount(&self, debtor: MemberId, creditor: MemberId) -> Money {
        match (self.index_of(debtor), self.index_of(creditor)) {
            (Some(row), Some(col)) => self.get(row, col),
            _ => Money::ZERO,
        }
    }

    pub fn set(&mut self, debtor: usize, creditor: usize, amount: Money) {
        let offset = self.offset(debtor, creditor);
        self.cells[offset] = amount;
    }

    pub fn add(&mut self, debtor: usize, creditor: usize, amount: Money) {
        let offset = self.offset(debtor, creditor);
        self.cells[offset] += amount;
    }

    pub fn is_zero(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_zero())
    }

    pub fn edge_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_zero()).count()
    }

    /// Creditor indices `debtor` has a nonzero edge to, ascending.
    pub fn successors(&self, debtor: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.size()).filter(move |&creditor| !self.get(debtor, creditor).is_zero())
    }

    /// Nonzero `(debtor, creditor, amount)` entries in row-major order.
    pub fn entries(&self) -> impl Iterator<Item = (MemberId, MemberId, Money)> + '_ {
        let size = self.size();
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, amount)| !amount.is_zero())
            .map(move |(offset, amount)| {
                (
                    self.members[offset / size],
                    self.members[offset % size],
                    *amount,
                )
            })
    }

    /// Per member: total owed to them minus total they owe.
    pub fn net_balances(&self) -> MemberBalances {
        let mut balances: MemberBalances = self
            .members
            .iter()
            .map(|member| (*member, Money::ZERO))
            .collect();
        for (debtor, creditor, amount) in self.entries() {
            if let Some(balance) = balances.get_mut(&debtor) {
                *balance -= amount;
            }
            if let Some(balance) = balances.get_mut(&creditor) {
                *balance += amount;
            }
        }
        balances
    }

    /// Collapse both directions of every pair into one non-negative entry and
    /// round it to the context scale.
    pub fn finalize(&mut self, context: SettlementContext) {
        let size = self.size();
        for row in 0..size {
            self.set(row, row, Money::ZERO);
            for col in (row + 1)..size {
                let net = self.get(row, col) - self.get(col, row);
                let (debtor, creditor, amount) = if net.is_negative() {
                    (col, row, -net)
                } else {
                    (row, col, net)
                };
                self.set(debtor, creditor, context.round(amount));
                self.set(creditor, debtor, Money::ZERO);
            }
        }
    }

    fn offset(&self, debtor: usize, creditor: usize) -> usize {
        debtor * self.size() + creditor
    }
}

/// Turns attributed fuel costs and outstanding debts into a debt matrix.
pub struct DebtMatrixBuilder {
    context: SettlementContext,
}

impl DebtMatrixBuilder {
    pub fn new(context: SettlementContext) -> Self {
        Self { context }
    }

    /// Build the finalized debt matrix for one settlement period.
    ///
    /// Every fuel purchase is owed to its purchaser by all other members in
    /// proportion to their share of the driven distance. Unsettled debts from
    /// earlier payoffs are subtracted in their own direction, which can reverse
    /// a pair. Members that only appear in earlier debts are appended to the
    /// attribution order.
    pub fn build(
        &self,
        attribution: &CostAttribution,
        fuel_purchases: &[FuelPurchase],
        unsettled_debts: &[Debt],
    ) -> DebtMatrix {
        let members = attribution
            .members()
            .chain(fuel_purchases.iter().map(|purchase| purchase.owner))
            .chain(
                unsettled_debts
                    .iter()
                    .flat_map(|debt| [debt.debtor, debt.creditor]),
            );
        let mut matrix = DebtMatrix::new(members);

        for purchase in fuel_purchases {
            let Some(creditor) = matrix.index_of(purchase.owner) else {
                continue;
            };
            for debtor in 0..matrix.size() {
                if debtor == creditor {
                    continue;
                }
                let fraction = attribution.km_fraction(matrix.member_at(debtor));
                if fraction.is_zero() {
                    continue;
                }
                matrix.add(debtor, creditor, purchase.cost * fraction);
            }
        }

        for debt in unsettled_debts {
            if debt.debtor == debt.creditor {
                continue;
            }
            if let (Some(debtor), Some(creditor)) =
                (matrix.index_of(debt.debtor), matrix.index_of(debt.creditor))
            {
                matrix.add(debtor, creditor, -debt.amount);
            }
        }

        matrix.finalize(self.context);

        tracing::debug!(
            member_count = matrix.size(),
            fuel_purchase_count = fuel_purchases.len(),
            unsettled_debt_count = unsettled_debts.len(),
            edge_count = matrix.edge_count(),
            scale = self.context.scale(),
            "Debt matrix built"
        );

        matrix
    }
}
