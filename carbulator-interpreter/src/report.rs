use carbulator_domain::{Payoff, UsageSummary};
use std::fmt::Write;

pub fn format_payoff(payoff: &Payoff) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Payoff #{} for community {}",
        payoff.id, payoff.community_id
    );
    if payoff.debts.is_empty() {
        out.push_str("  nobody owes anything\n");
    }
    for debt in &payoff.debts {
        let _ = writeln!(out, "  {} -> {}: {}", debt.debtor, debt.creditor, debt.amount);
    }
    let _ = write!(
        out,
        "Closed {} trip(s) and {} fuel purchase(s); {}",
        payoff.trips.len(),
        payoff.fuel_purchases.len(),
        if payoff.is_settled { "settled" } else { "open" }
    );
    out
}

pub fn format_usage(usage: &UsageSummary) -> String {
    let mut out = String::from("member  driven  accounted  fuel paid");
    for (member, figures) in usage.iter() {
        let _ = write!(
            out,
            "\n{:>6}  {:>6}  {:>9}  {:>9}",
            member.0,
            figures.driven.as_decimal(),
            figures.accounted.as_decimal().round_dp(2),
            figures.fuel_costs.as_decimal()
        );
    }
    let _ = write!(
        out,
        "\n total  {:>6}  {:>9}  {:>9}",
        usage.total_distance().as_decimal(),
        "",
        usage.total_fuel_costs().as_decimal()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbulator_domain::{CommunityId, Debt, DebtId, MemberId, Money, PayoffId};
    use rstest::rstest;

    #[rstest]
    fn lists_debts_of_open_payoff() {
        let mut payoff = Payoff::new(PayoffId(4), CommunityId(1));
        payoff.debts.push(Debt {
            id: DebtId(1),
            debtor: MemberId(2),
            creditor: MemberId(1),
            amount: Money::new(1050, 2),
            is_settled: false,
            payoff_id: PayoffId(4),
            community_id: CommunityId(1),
        });

        assert_eq!(
            format_payoff(&payoff),
            "Payoff #4 for community 1\n  2 -> 1: 10.50\nClosed 0 trip(s) and 0 fuel purchase(s); open"
        );
    }

    #[rstest]
    fn settled_payoff_says_nobody_owes() {
        let mut payoff = Payoff::new(PayoffId(1), CommunityId(2));
        payoff.is_settled = true;

        assert!(format_payoff(&payoff).contains("nobody owes anything"));
        assert!(format_payoff(&payoff).ends_with("settled"));
    }

    #[rstest]
    fn usage_lists_members_in_first_seen_order() {
        use carbulator_domain::{Distance, FuelPurchase, FuelPurchaseId, Trip, TripId};

        let trips = [Trip {
            id: TripId(1),
            community_id: CommunityId(1),
            owner: MemberId(5),
            passengers: vec![MemberId(3)],
            start_distance: Distance::new(10, 0),
            end_distance: Some(Distance::new(40, 0)),
            is_open: true,
            payoff_id: None,
        }];
        let fuel = [FuelPurchase {
            id: FuelPurchaseId(1),
            community_id: CommunityId(1),
            owner: MemberId(3),
            cost: Money::new(2000, 2),
            is_open: true,
            payoff_id: None,
        }];

        let report = format_usage(&UsageSummary::from_records(&trips, &fuel));
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].trim_start().starts_with('5'));
        assert!(lines[2].trim_start().starts_with('3'));
        assert!(lines[2].ends_with("20.00"));
        assert!(lines[3].trim_start().starts_with("total"));
    }
}
