use carbulator_domain::{
    CommunityId, CostAttributionCalculator, DebtGraphSimplifier, DebtMatrix, DebtMatrixBuilder,
    Distance, FuelPurchase, FuelPurchaseId, MemberId, Money, SettlementContext, Trip, TripId,
};
use proptest::prelude::*;

fn member(idx: usize) -> MemberId {
    MemberId(idx as u64 + 1)
}

proptest! {
    #[test]
    fn simplification_preserves_net_balances(
        member_count in 2usize..=6,
        edges in prop::collection::vec((0usize..=5, 0usize..=5, 1i64..=50_000), 0..=30),
    ) {
        let members: Vec<MemberId> = (0..member_count).map(member).collect();
        let entries = edges.iter().map(|&(debtor, creditor, cents)| {
            (
                member(debtor % member_count),
                member(creditor % member_count),
                Money::new(cents, 2),
            )
        });
        let input = DebtMatrix::from_entries(members, entries);
        let before = input.net_balances();
        let edge_count = input.edge_count();

        let result = DebtGraphSimplifier.simplify(input);

        prop_assert_eq!(result.net_balances(), before);
        prop_assert!(result.is_acyclic());
        prop_assert!(result.edge_count() <= edge_count);
        prop_assert!(result.entries().all(|(_, _, amount)| amount.is_positive()));
    }
}

proptest! {
    #[test]
    fn settlement_pipeline_is_acyclic_and_balanced(
        member_count in 1usize..=6,
        trips in prop::collection::vec((0usize..=5, 0usize..=63, 1i64..=500), 1..=12),
        purchases in prop::collection::vec((0usize..=5, 0i64..=20_000), 0..=8),
    ) {
        let mut odometer = 0i64;
        let trips: Vec<Trip> = trips
            .iter()
            .enumerate()
            .map(|(idx, &(owner, passenger_mask, km))| {
                let start = odometer;
                odometer += km;
                Trip {
                    id: TripId(idx as u64 + 1),
                    community_id: CommunityId(1),
                    owner: member(owner % member_count),
                    passengers: (0..member_count)
                        .filter(|bit| passenger_mask & (1 << bit) != 0)
                        .map(member)
                        .collect(),
                    start_distance: Distance::new(start, 0),
                    end_distance: Some(Distance::new(odometer, 0)),
                    is_open: true,
                    payoff_id: None,
                }
            })
            .collect();
        let purchases: Vec<FuelPurchase> = purchases
            .iter()
            .enumerate()
            .map(|(idx, &(owner, cents))| FuelPurchase {
                id: FuelPurchaseId(idx as u64 + 1),
                community_id: CommunityId(1),
                owner: member(owner % member_count),
                cost: Money::new(cents, 2),
                is_open: true,
                payoff_id: None,
            })
            .collect();

        let attribution = CostAttributionCalculator
            .attribute(&trips, &purchases)
            .expect("trips always cover some distance");
        let matrix = DebtMatrixBuilder::new(SettlementContext::cents_default())
            .build(&attribution, &purchases, &[]);
        let before = matrix.net_balances();

        let result = DebtGraphSimplifier.simplify(matrix);

        prop_assert!(result.is_acyclic());
        prop_assert_eq!(result.net_balances(), before);
        prop_assert!(result
            .entries()
            .all(|(debtor, creditor, amount)| debtor != creditor && amount.is_positive()));
    }
}
