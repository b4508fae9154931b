use super::estimate::Term;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Disposal of all or part of one lot by one sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxableEvent {
    pub asset: String,
    pub acquired_at: NaiveDateTime,
    pub disposed_at: NaiveDateTime,
    /// Quantity of the lot disposed of by this event
    pub quantity: Decimal,
    pub basis: Decimal,
    pub proceeds: Decimal,
}

impl TaxableEvent {
    pub fn gain(&self) -> Decimal {
        self.proceeds - self.basis
    }

    /// Whole days elapsed between acquisition and disposal
    pub fn holding_days(&self) -> i64 {
        (self.disposed_at - self.acquired_at).num_days()
    }

    pub fn term(&self) -> Term {
        Term::from_holding_days(self.holding_days())
    }

    pub fn disposal_date(&self) -> NaiveDate {
        self.disposed_at.date()
    }
}

/// CSV record for event output, date-only precision and amounts to 2dp
#[derive(Debug, Serialize, Deserialize)]
pub struct EventCsvRecord {
    pub asset: String,
    pub acquired: String,
    pub basis: String,
    pub disposed: String,
    pub proceeds: String,
}

impl From<&TaxableEvent> for EventCsvRecord {
    fn from(e: &TaxableEvent) -> Self {
        EventCsvRecord {
            asset: e.asset.clone(),
            acquired: e.acquired_at.format("%Y-%m-%d").to_string(),
            basis: format!("{:.2}", e.basis),
            disposed: e.disposed_at.format("%Y-%m-%d").to_string(),
            proceeds: format!("{:.2}", e.proceeds),
        }
    }
}

/// CSV record for event output with quantity, gain and holding term
#[derive(Debug, Serialize, Deserialize)]
pub struct DetailedEventCsvRecord {
    pub asset: String,
    pub acquired: String,
    pub disposed: String,
    pub quantity: String,
    pub basis: String,
    pub proceeds: String,
    pub gain: String,
    pub holding_days: i64,
    pub term: String,
}

impl From<&TaxableEvent> for DetailedEventCsvRecord {
    fn from(e: &TaxableEvent) -> Self {
        DetailedEventCsvRecord {
            asset: e.asset.clone(),
            acquired: e.acquired_at.format("%Y-%m-%d").to_string(),
            disposed: e.disposed_at.format("%Y-%m-%d").to_string(),
            quantity: e.quantity.normalize().to_string(),
            basis: format!("{:.2}", e.basis),
            proceeds: format!("{:.2}", e.proceeds),
            gain: format!("{:.2}", e.gain()),
            holding_days: e.holding_days(),
            term: e.term().display().to_string(),
        }
    }
}

const EVENT_HEADER: [&str; 5] = ["asset", "acquired", "basis", "disposed", "proceeds"];
const DETAILED_EVENT_HEADER: [&str; 9] = [
    "asset",
    "acquired",
    "disposed",
    "quantity",
    "basis",
    "proceeds",
    "gain",
    "holding_days",
    "term",
];

/// Header is written explicitly so an empty report still has one
fn csv_writer<W: Write>(writer: W, header: &[&str]) -> anyhow::Result<csv::Writer<W>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    Ok(wtr)
}

pub fn write_csv<'a, I, W>(events: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = &'a TaxableEvent>,
    W: Write,
{
    let mut wtr = csv_writer(writer, &EVENT_HEADER)?;
    for event in events {
        wtr.serialize(EventCsvRecord::from(event))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_detailed_csv<'a, I, W>(events: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = &'a TaxableEvent>,
    W: Write,
{
    let mut wtr = csv_writer(writer, &DETAILED_EVENT_HEADER)?;
    for event in events {
        wtr.serialize(DetailedEventCsvRecord::from(event))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::parse_datetime;
    use rust_decimal_macros::dec;

    fn event(acquired: &str, disposed: &str, basis: Decimal, proceeds: Decimal) -> TaxableEvent {
        TaxableEvent {
            asset: "BTC".to_string(),
            acquired_at: parse_datetime(acquired).unwrap(),
            disposed_at: parse_datetime(disposed).unwrap(),
            quantity: dec!(1),
            basis,
            proceeds,
        }
    }

    #[test]
    fn gain_may_be_negative() {
        assert_eq!(
            event("2020-01-01", "2020-06-01", dec!(100), dec!(250)).gain(),
            dec!(150)
        );
        assert_eq!(
            event("2020-01-01", "2020-06-01", dec!(300), dec!(250)).gain(),
            dec!(-50)
        );
    }

    #[test]
    fn holding_days_count_whole_elapsed_days() {
        let e = event("2020-01-01T23:59:00", "2020-01-02T00:01:00", dec!(0), dec!(0));
        assert_eq!(e.holding_days(), 0);

        // a year apart by date but two hours short of 365 full days
        let e = event("2021-01-01T23:00:00", "2022-01-01T01:00:00", dec!(0), dec!(0));
        assert_eq!(e.holding_days(), 364);
        assert_eq!(e.term(), Term::ShortTerm);

        let e = event("2021-01-01T23:00:00", "2022-01-01T23:00:00", dec!(0), dec!(0));
        assert_eq!(e.holding_days(), 365);
        assert_eq!(e.term(), Term::LongTerm);
    }

    #[test]
    fn csv_has_date_only_columns() {
        let events = vec![event(
            "2020-01-01T10:00:00",
            "2021-03-04T12:00:00",
            dec!(100),
            dec!(333.333),
        )];
        let mut buf = Vec::new();
        write_csv(&events, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(
            out,
            "asset,acquired,basis,disposed,proceeds\nBTC,2020-01-01,100.00,2021-03-04,333.33\n"
        );
    }

    #[test]
    fn empty_csv_keeps_header() {
        let mut buf = Vec::new();
        write_csv(&Vec::<TaxableEvent>::new(), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "asset,acquired,basis,disposed,proceeds\n"
        );
    }

    #[test]
    fn detailed_csv_includes_term() {
        let events = vec![event("2020-01-01", "2021-01-01", dec!(100), dec!(150))];
        let mut buf = Vec::new();
        write_detailed_csv(&events, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("asset,acquired,disposed,quantity,basis,proceeds,gain,holding_days,term")
        );
        assert_eq!(
            lines.next(),
            Some("BTC,2020-01-01,2021-01-01,1,100.00,150.00,50.00,366,Long-term")
        );
    }
}
