use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::ledger::Balances;
use crate::model::RawTransaction;
use crate::settlement::Settlement;

/// Errors that can occur when reading or writing ledger csv files
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("failed to write row: {0}")]
    Write(#[source] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One ledger row. Every column but the header is optional.
#[derive(Debug, Deserialize)]
struct InputRow {
    trip_id: Option<String>,
    payer: Option<String>,
    receiver: Option<String>,
    amount: Option<String>,
    r#type: Option<String>,
    is_deleted: Option<bool>,
    description: Option<String>,
}

impl From<InputRow> for RawTransaction {
    fn from(row: InputRow) -> Self {
        RawTransaction {
            trip_id: row.trip_id,
            payer: row.payer,
            receiver: row.receiver,
            amount: row.amount,
            kind: row.r#type,
            deleted: row.is_deleted,
            description: row.description,
            created_at: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SettlementRow<'a> {
    trip_id: &'a str,
    from: &'a str,
    to: &'a str,
    amount: String,
}

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    trip_id: &'a str,
    participant: &'a str,
    balance: String,
}

/// Read ledger records from a csv file
pub fn read_transactions(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<RawTransaction, CsvError>>, CsvError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CsvError::Open {
        path: path.display().to_string(),
        source,
    })?;
    Ok(read_transactions_from(file))
}

/// Read ledger records from any csv source
pub fn read_transactions_from<R: io::Read>(
    reader: R,
) -> impl Iterator<Item = Result<RawTransaction, CsvError>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            result
                .map(RawTransaction::from)
                .map_err(|source| CsvError::Parse { line, source })
        })
}

/// Write each trip's settlements in csv format
pub fn write_settlements<'a, W: io::Write>(
    writer: W,
    trips: impl IntoIterator<Item = (&'a str, &'a [Settlement])>,
) -> Result<(), CsvError> {
    let mut writer = headerless_writer(writer);
    writer
        .write_record(["trip_id", "from", "to", "amount"])
        .map_err(CsvError::Write)?;

    for (trip_id, settlements) in trips {
        for settlement in settlements {
            let row = SettlementRow {
                trip_id,
                from: &settlement.from,
                to: &settlement.to,
                amount: settlement.amount.to_string(),
            };
            writer.serialize(&row).map_err(CsvError::Write)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write each trip's balances in csv format
pub fn write_balances<'a, W: io::Write>(
    writer: W,
    trips: impl IntoIterator<Item = (&'a str, &'a Balances)>,
) -> Result<(), CsvError> {
    let mut writer = headerless_writer(writer);
    writer
        .write_record(["trip_id", "participant", "balance"])
        .map_err(CsvError::Write)?;

    for (trip_id, balances) in trips {
        for (participant, balance) in balances.iter() {
            let row = BalanceRow {
                trip_id,
                participant,
                balance: balance.to_string(),
            };
            writer.serialize(&row).map_err(CsvError::Write)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Header is written explicitly so that empty outputs still carry it
fn headerless_writer<W: io::Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn read_paid_row() {
        let file = write_csv(
            "trip_id,payer,receiver,amount,type,is_deleted,description\n\
             t1,A,B,10.5,Paid,false,lunch\n",
        );
        let results: Vec<_> = read_transactions(file.path()).unwrap().collect();
        assert_eq!(results.len(), 1);

        let raw = results.into_iter().next().unwrap().unwrap();
        assert_eq!(raw.trip_id.as_deref(), Some("t1"));
        assert_eq!(raw.payer.as_deref(), Some("A"));
        assert_eq!(raw.receiver.as_deref(), Some("B"));
        assert_eq!(raw.amount.as_deref(), Some("10.5"));
        assert_eq!(raw.kind.as_deref(), Some("Paid"));
        assert_eq!(raw.deleted, Some(false));
        assert_eq!(raw.description.as_deref(), Some("lunch"));
    }

    #[test]
    fn empty_cells_are_absent_fields() {
        let file = write_csv("payer,receiver,amount,type\nA,,10,Paid\n");
        let raw = read_transactions(file.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(raw.receiver, None);
        assert_eq!(raw.trip_id, None);
        assert_eq!(raw.deleted, None);
    }

    #[test]
    fn read_with_whitespace() {
        let file = write_csv("payer, receiver, amount, type\nA, B, 10.0, Paid\n");
        let results: Vec<_> = read_transactions(file.path()).unwrap().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().amount.as_deref(), Some("10.0"));
    }

    #[test]
    fn read_returns_error_for_bad_flag() {
        let file = write_csv("payer,receiver,amount,type,is_deleted\nA,B,1,Paid,maybe\n");
        let results: Vec<_> = read_transactions(file.path()).unwrap().collect();
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(err, CsvError::Parse { line: 2, .. }));
    }

    #[test]
    fn open_missing_file_fails() {
        let result = read_transactions("does/not/exist.csv");
        assert!(matches!(result, Err(CsvError::Open { .. })));
    }

    #[test]
    fn write_settlement_rows() {
        let goa = vec![Settlement {
            from: "A".to_string(),
            to: "B".to_string(),
            amount: Amount::from_cents(6_050),
        }];
        let rome = vec![Settlement {
            from: "B".to_string(),
            to: "A".to_string(),
            amount: Amount::from_cents(100),
        }];
        let mut out = Vec::new();
        write_settlements(&mut out, [("goa", goa.as_slice()), ("rome", rome.as_slice())]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "trip_id,from,to,amount\ngoa,A,B,60.5\nrome,B,A,1\n"
        );
    }

    #[test]
    fn write_empty_settlements_keeps_header() {
        let mut out = Vec::new();
        write_settlements(&mut out, std::iter::empty::<(&str, &[Settlement])>()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "trip_id,from,to,amount\n");
    }

    #[test]
    fn write_balance_rows() {
        let balances: Balances = [
            ("B".to_string(), Amount::from_cents(10_000)),
            ("A".to_string(), Amount::from_cents(-10_000)),
        ]
        .into_iter()
        .collect();
        let mut out = Vec::new();
        write_balances(&mut out, [("goa", &balances)]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "trip_id,participant,balance\ngoa,A,-100\ngoa,B,100\n"
        );
    }
}
