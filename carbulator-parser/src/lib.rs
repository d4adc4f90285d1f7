#![warn(clippy::uninlined_format_args)]

//! Line-oriented ledger format for trips, fuel purchases and carried-over debts.
//!
//! ```text
//! # odometer readings in km, amounts in currency units
//! trip 1: 1 with 2, 3 from 100.0 to 130.0
//! trip 2: 2 from 130.0            # still on the road
//! fuel 1: 2 paid 45.50
//! debt 3 -> 1: 5.00
//! ```

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{char, digit1, space0, space1, u64},
    combinator::{map_res, opt, recognize, rest},
    multi::separated_list1,
    sequence::preceded,
};
use rust_decimal::Decimal;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct TripEntry {
    pub id: u64,
    pub owner: u64,
    pub passengers: Vec<u64>,
    pub start_km: Decimal,
    pub end_km: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelEntry {
    pub id: u64,
    pub owner: u64,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebtEntry {
    pub debtor: u64,
    pub creditor: u64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Trip(TripEntry),
    Fuel(FuelEntry),
    Debt(DebtEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryWithLine {
    pub line: usize,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ledger {
    pub entries: Vec<EntryWithLine>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at line {line}: {detail}")]
    SyntaxError { line: usize, detail: String },
    #[error("Trip {id} is declared more than once (line {line}).")]
    DuplicateTrip { id: u64, line: usize },
    #[error("Fuel purchase {id} is declared more than once (line {line}).")]
    DuplicateFuelPurchase { id: u64, line: usize },
}

fn decimal(input: &str) -> IResult<&str, Decimal> {
    map_res(
        recognize((digit1, opt((char('.'), digit1)))),
        Decimal::from_str_exact,
    )
    .parse(input)
}

fn members(input: &str) -> IResult<&str, Vec<u64>> {
    separated_list1((space0, char(','), space0), u64).parse(input)
}

// trip {id}: {owner} [with {member}, ...] from {km} [to {km}]
fn trip(input: &str) -> IResult<&str, TripEntry> {
    (
        tag_no_case("trip"),
        space1,
        u64,
        space0,
        char(':'),
        space0,
        u64,
        opt(preceded((space1, tag_no_case("with"), space1), members)),
        space1,
        tag_no_case("from"),
        space1,
        decimal,
        opt(preceded((space1, tag_no_case("to"), space1), decimal)),
    )
        .map(
            |(_, _, id, _, _, _, owner, passengers, _, _, _, start_km, end_km)| TripEntry {
                id,
                owner,
                passengers: passengers.unwrap_or_default(),
                start_km,
                end_km,
            },
        )
        .parse(input)
}

// fuel {id}: {owner} paid {amount}
fn fuel(input: &str) -> IResult<&str, FuelEntry> {
    (
        tag_no_case("fuel"),
        space1,
        u64,
        space0,
        char(':'),
        space0,
        u64,
        space1,
        tag_no_case("paid"),
        space1,
        decimal,
    )
        .map(|(_, _, id, _, _, _, owner, _, _, _, cost)| FuelEntry { id, owner, cost })
        .parse(input)
}

// debt {debtor} -> {creditor}: {amount}
fn debt(input: &str) -> IResult<&str, DebtEntry> {
    (
        tag_no_case("debt"),
        space1,
        u64,
        space0,
        tag("->"),
        space0,
        u64,
        space0,
        char(':'),
        space0,
        decimal,
    )
        .map(|(_, _, debtor, _, _, _, creditor, _, _, _, amount)| DebtEntry {
            debtor,
            creditor,
            amount,
        })
        .parse(input)
}

fn entry(input: &str) -> IResult<&str, Entry> {
    alt((trip.map(Entry::Trip), fuel.map(Entry::Fuel), debt.map(Entry::Debt))).parse(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), rest).parse(input)
}

fn line_entry(input: &str) -> IResult<&str, Option<Entry>> {
    (space0, opt(entry), space0, opt(comment))
        .map(|(_, entry, _, _)| entry)
        .parse(input)
}

fn syntax_error_detail(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            format!("unexpected input `{}`", e.input.trim())
        }
    }
}

pub fn parse_ledger(input: &str) -> Result<Ledger, ParseError> {
    let mut entries = Vec::new();
    let mut trip_ids = HashSet::new();
    let mut fuel_ids = HashSet::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let parsed = match line_entry(raw) {
            Ok((rest, _)) if !rest.trim().is_empty() => {
                return Err(ParseError::SyntaxError {
                    line,
                    detail: format!("unexpected input `{}`", rest.trim()),
                });
            }
            Ok((_, parsed)) => parsed,
            Err(err) => {
                return Err(ParseError::SyntaxError {
                    line,
                    detail: syntax_error_detail(err),
                });
            }
        };
        let Some(entry) = parsed else {
            continue;
        };

        match &entry {
            Entry::Trip(trip) if !trip_ids.insert(trip.id) => {
                return Err(ParseError::DuplicateTrip { id: trip.id, line });
            }
            Entry::Fuel(fuel) if !fuel_ids.insert(fuel.id) => {
                return Err(ParseError::DuplicateFuelPurchase { id: fuel.id, line });
            }
            _ => {}
        }
        entries.push(EntryWithLine { line, entry });
    }

    Ok(Ledger { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case::shared(
        "trip 1: 1 with 2, 3 from 100.0 to 130.5",
        TripEntry {
            id: 1,
            owner: 1,
            passengers: vec![2, 3],
            start_km: dec!(100.0),
            end_km: Some(dec!(130.5)),
        }
    )]
    #[case::alone("trip 7: 4 from 0 to 12", TripEntry {
        id: 7,
        owner: 4,
        passengers: vec![],
        start_km: dec!(0),
        end_km: Some(dec!(12)),
    })]
    #[case::running("TRIP 2:2 from 130", TripEntry {
        id: 2,
        owner: 2,
        passengers: vec![],
        start_km: dec!(130),
        end_km: None,
    })]
    #[case::tight_commas("trip 3: 1 with 2,3,4 from 1 to 2", TripEntry {
        id: 3,
        owner: 1,
        passengers: vec![2, 3, 4],
        start_km: dec!(1),
        end_km: Some(dec!(2)),
    })]
    fn parses_trips(#[case] input: &str, #[case] expected: TripEntry) {
        let (rest, parsed) = trip(input).unwrap();
        assert_eq!(rest, "");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case::fuel(
        "fuel 1: 2 paid 45.50",
        Entry::Fuel(FuelEntry { id: 1, owner: 2, cost: dec!(45.50) })
    )]
    #[case::debt(
        "debt 3 -> 1: 5.00",
        Entry::Debt(DebtEntry { debtor: 3, creditor: 1, amount: dec!(5.00) })
    )]
    #[case::debt_without_spaces(
        "debt 3->1:5",
        Entry::Debt(DebtEntry { debtor: 3, creditor: 1, amount: dec!(5) })
    )]
    fn parses_entries(#[case] input: &str, #[case] expected: Entry) {
        let (rest, parsed) = entry(input).unwrap();
        assert_eq!(rest, "");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn skips_blank_lines_and_comments() {
        let input = "\n# header\n  trip 1: 1 from 0 to 10   # commute\n\nfuel 1: 1 paid 20\n";

        let ledger = parse_ledger(input).unwrap();

        let lines: Vec<usize> = ledger.entries.iter().map(|entry| entry.line).collect();
        assert_eq!(lines, vec![3, 5]);
        assert!(matches!(ledger.entries[0].entry, Entry::Trip(_)));
        assert!(matches!(ledger.entries[1].entry, Entry::Fuel(_)));
    }

    #[rstest]
    #[case::unknown_keyword("trip 1: 1 from 0 to 10\nrefuel 2: 1 paid 3", 2)]
    #[case::missing_start("trip 1: 1 with 2", 1)]
    #[case::trailing_garbage("fuel 1: 1 paid 20 euros", 1)]
    #[case::negative_amount("debt 1 -> 2: -5", 1)]
    fn reports_syntax_error_line(#[case] input: &str, #[case] expected_line: usize) {
        match parse_ledger(input) {
            Err(ParseError::SyntaxError { line, .. }) => assert_eq!(line, expected_line),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[rstest]
    #[case::trip(
        "trip 1: 1 from 0 to 5\ntrip 1: 2 from 5 to 9",
        ParseError::DuplicateTrip { id: 1, line: 2 }
    )]
    #[case::fuel(
        "fuel 4: 1 paid 5\n\nfuel 4: 1 paid 6",
        ParseError::DuplicateFuelPurchase { id: 4, line: 3 }
    )]
    fn rejects_duplicate_ids(#[case] input: &str, #[case] expected: ParseError) {
        assert_eq!(parse_ledger(input), Err(expected));
    }

    #[rstest]
    fn running_trip_has_no_end() {
        let ledger = parse_ledger("trip 9: 1 from 50").unwrap();
        match &ledger.entries[0].entry {
            Entry::Trip(trip) => assert_eq!(trip.end_km, None),
            other => panic!("expected trip, got {other:?}"),
        }
    }
}
