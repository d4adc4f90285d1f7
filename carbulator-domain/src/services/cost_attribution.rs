use crate::model::{Distance, FuelPurchase, MemberId, Trip, TripId};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CostAttributionError {
    #[error("fuel costs cannot be attributed because the total driven distance is zero")]
    ZeroTotalDistance,
    #[error("trip {trip} ends before it starts")]
    InvalidOdometer { trip: TripId },
}

/// Distance attributed to each member over one settlement period.
///
/// Iteration order is first-seen: trip owners and passengers in trip order,
/// then fuel purchasers that did not take part in any trip.
#[derive(Clone, Debug, PartialEq)]
pub struct CostAttribution {
    distances: IndexMap<MemberId, Distance>,
    total_distance: Distance,
}

impl CostAttribution {
    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.distances.keys().copied()
    }

    pub fn member_count(&self) -> usize {
        self.distances.len()
    }

    pub fn total_distance(&self) -> Distance {
        self.total_distance
    }

    pub fn distance_of(&self, member: MemberId) -> Distance {
        self.distances.get(&member).copied().unwrap_or(Distance::ZERO)
    }

    /// Share of the total distance driven by `member`, in `[0, 1]`.
    ///
    /// Zero for unknown members and for periods without any driven distance.
    pub fn km_fraction(&self, member: MemberId) -> Decimal {
        if self.total_distance.is_zero() {
            return Decimal::ZERO;
        }
        self.distance_of(member).as_decimal() / self.total_distance.as_decimal()
    }
}

/// Splits driven distance among trip participants.
pub struct CostAttributionCalculator;

impl CostAttributionCalculator {
    /// Attribute the distance of finished `trips` to their participants.
    ///
    /// Each trip's distance is split equally between the owner and the
    /// distinct passengers. Running trips are skipped. Fuel purchasers that
    /// never drove are registered with zero distance so their purchases can
    /// still be redistributed.
    pub fn attribute(
        &self,
        trips: &[Trip],
        fuel_purchases: &[FuelPurchase],
    ) -> Result<CostAttribution, CostAttributionError> {
        let mut distances: IndexMap<MemberId, Distance> = IndexMap::new();
        let mut total_distance = Distance::ZERO;

        for trip in trips {
            let Some(distance) = trip.distance() else {
                continue;
            };
            if distance < Distance::ZERO {
                tracing::warn!(
                    reject_reason = "invalid_odometer",
                    trip_id = trip.id.0,
                    start = %trip.start_distance,
                    distance = %distance,
                    "Trip ends before it starts"
                );
                return Err(CostAttributionError::InvalidOdometer { trip: trip.id });
            }

            total_distance += distance;
            let participants = trip.participants();
            let share = distance.split(participants.len());
            for participant in participants {
                *distances.entry(participant).or_default() += share;
            }
        }

        for purchase in fuel_purchases {
            distances.entry(purchase.owner).or_default();
        }

        if total_distance.is_zero() && fuel_purchases.iter().any(|p| !p.cost.is_zero()) {
            tracing::warn!(
                reject_reason = "zero_total_distance",
                trip_count = trips.len(),
                fuel_purchase_count = fuel_purchases.len(),
                "Fuel costs exist but no distance was driven"
            );
            return Err(CostAttributionError::ZeroTotalDistance);
        }

        tracing::debug!(
            member_count = distances.len(),
            trip_count = trips.len(),
            total_distance = %total_distance,
            "Cost attribution computed"
        );

        Ok(CostAttribution {
            distances,
            total_distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommunityId, FuelPurchaseId, Money};
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn calculator() -> CostAttributionCalculator {
        CostAttributionCalculator
    }

    fn trip(id: u64, owner: u64, passengers: &[u64], start: i64, end: Option<i64>) -> Trip {
        Trip {
            id: TripId(id),
            community_id: CommunityId(1),
            owner: MemberId(owner),
            passengers: passengers.iter().copied().map(MemberId).collect(),
            start_distance: Distance::new(start, 0),
            end_distance: end.map(|end| Distance::new(end, 0)),
            is_open: true,
            payoff_id: None,
        }
    }

    fn fuel(id: u64, owner: u64, cost: Money) -> FuelPurchase {
        FuelPurchase {
            id: FuelPurchaseId(id),
            community_id: CommunityId(1),
            owner: MemberId(owner),
            cost,
            is_open: true,
            payoff_id: None,
        }
    }

    #[rstest]
    fn splits_trip_equally_between_owner_and_passengers(calculator: CostAttributionCalculator) {
        let trips = [trip(1, 1, &[2, 3], 100, Some(130))];

        let attribution = calculator.attribute(&trips, &[]).expect("attribution");

        for member in [1, 2, 3] {
            assert_eq!(attribution.distance_of(MemberId(member)), Distance::new(10, 0));
        }
        assert_eq!(attribution.total_distance(), Distance::new(30, 0));
    }

    #[rstest]
    fn owner_listed_as_passenger_is_counted_once(calculator: CostAttributionCalculator) {
        let trips = [trip(1, 1, &[1, 2], 0, Some(30))];

        let attribution = calculator.attribute(&trips, &[]).expect("attribution");

        assert_eq!(attribution.distance_of(MemberId(1)), Distance::new(15, 0));
        assert_eq!(attribution.distance_of(MemberId(2)), Distance::new(15, 0));
    }

    #[rstest]
    fn fractions_follow_attributed_distance(calculator: CostAttributionCalculator) {
        let trips = [
            trip(1, 1, &[], 0, Some(60)),
            trip(2, 2, &[1], 60, Some(100)),
        ];

        let attribution = calculator.attribute(&trips, &[]).expect("attribution");

        assert_eq!(attribution.km_fraction(MemberId(1)), dec!(0.8));
        assert_eq!(attribution.km_fraction(MemberId(2)), dec!(0.2));
    }

    #[rstest]
    fn member_order_is_first_seen(calculator: CostAttributionCalculator) {
        let trips = [trip(1, 3, &[1], 0, Some(10)), trip(2, 2, &[3], 10, Some(20))];
        let purchases = [fuel(1, 4, Money::from_i64(50)), fuel(2, 1, Money::from_i64(20))];

        let attribution = calculator.attribute(&trips, &purchases).expect("attribution");

        let order: Vec<u64> = attribution.members().map(|member| member.0).collect();
        assert_eq!(order, vec![3, 1, 2, 4]);
    }

    #[rstest]
    fn fuel_purchaser_without_trips_gets_zero_distance(calculator: CostAttributionCalculator) {
        let trips = [trip(1, 1, &[], 0, Some(10))];
        let purchases = [fuel(1, 2, Money::from_i64(40))];

        let attribution = calculator.attribute(&trips, &purchases).expect("attribution");

        assert_eq!(attribution.member_count(), 2);
        assert_eq!(attribution.km_fraction(MemberId(2)), Decimal::ZERO);
        assert_eq!(attribution.km_fraction(MemberId(1)), Decimal::ONE);
    }

    #[rstest]
    fn running_trips_are_skipped(calculator: CostAttributionCalculator) {
        let trips = [trip(1, 1, &[], 0, Some(10)), trip(2, 2, &[], 10, None)];

        let attribution = calculator.attribute(&trips, &[]).expect("attribution");

        assert_eq!(attribution.total_distance(), Distance::new(10, 0));
        assert_eq!(attribution.member_count(), 1);
    }

    #[rstest]
    #[case::no_trips(vec![])]
    #[case::zero_length_trip(vec![trip(1, 1, &[], 50, Some(50))])]
    fn zero_distance_with_fuel_cost_is_rejected(
        calculator: CostAttributionCalculator,
        #[case] trips: Vec<Trip>,
    ) {
        let purchases = [fuel(1, 1, Money::new(4550, 2))];

        assert_eq!(
            calculator.attribute(&trips, &purchases),
            Err(CostAttributionError::ZeroTotalDistance)
        );
    }

    #[rstest]
    fn zero_distance_without_fuel_cost_yields_zero_fractions(
        calculator: CostAttributionCalculator,
    ) {
        let purchases = [fuel(1, 1, Money::ZERO)];

        let attribution = calculator.attribute(&[], &purchases).expect("attribution");

        assert_eq!(attribution.km_fraction(MemberId(1)), Decimal::ZERO);
    }

    #[rstest]
    fn reversed_odometer_is_rejected(calculator: CostAttributionCalculator) {
        let trips = [trip(7, 1, &[], 100, Some(90))];

        assert_eq!(
            calculator.attribute(&trips, &[]),
            Err(CostAttributionError::InvalidOdometer { trip: TripId(7) })
        );
    }
}
