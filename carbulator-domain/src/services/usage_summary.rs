use crate::model::{Distance, FuelPurchase, MemberId, Money, Trip};
use indexmap::IndexMap;

/// Per-member usage figures for one set of trips and fuel purchases.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemberUsage {
    /// Distance of trips the member owned.
    pub driven: Distance,
    /// Distance the member accounts for after the equal passenger split.
    pub accounted: Distance,
    /// Fuel costs the member paid.
    pub fuel_costs: Money,
}

/// Usage overview of a community, typically over the current unpaid period.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsageSummary {
    members: IndexMap<MemberId, MemberUsage>,
}

impl UsageSummary {
    pub fn from_records(trips: &[Trip], fuel_purchases: &[FuelPurchase]) -> Self {
        let mut members: IndexMap<MemberId, MemberUsage> = IndexMap::new();

        for trip in trips {
            let Some(distance) = trip.distance() else {
                continue;
            };
            members.entry(trip.owner).or_default().driven += distance;

            let participants = trip.participants();
            let share = distance.split(participants.len());
            for participant in participants {
                members.entry(participant).or_default().accounted += share;
            }
        }

        for purchase in fuel_purchases {
            members.entry(purchase.owner).or_default().fuel_costs += purchase.cost;
        }

        Self { members }
    }

    pub fn get(&self, member: MemberId) -> Option<&MemberUsage> {
        self.members.get(&member)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, &MemberUsage)> + '_ {
        self.members.iter().map(|(member, usage)| (*member, usage))
    }

    pub fn total_distance(&self) -> Distance {
        self.members.values().map(|usage| usage.driven).sum()
    }

    pub fn total_fuel_costs(&self) -> Money {
        self.members.values().map(|usage| usage.fuel_costs).sum()
    }
}
