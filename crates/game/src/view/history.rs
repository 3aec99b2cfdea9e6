use crate::rules::Side;
use crate::session::MoveRecord;

/// One numbered line of the move list: `12. Nf3 Nc6`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRow {
    pub number: usize,
    pub white: Option<String>,
    pub black: Option<String>,
}

pub fn move_rows(records: &[MoveRecord]) -> Vec<MoveRow> {
    let mut rows: Vec<MoveRow> = Vec::with_capacity(records.len().div_ceil(2));
    for record in records {
        match record.mover {
            Side::White => rows.push(MoveRow {
                number: rows.len() + 1,
                white: Some(record.san.clone()),
                black: None,
            }),
            Side::Black => match rows.last_mut() {
                Some(row) if row.black.is_none() => row.black = Some(record.san.clone()),
                _ => rows.push(MoveRow {
                    number: rows.len() + 1,
                    white: None,
                    black: Some(record.san.clone()),
                }),
            },
        }
    }
    rows
}

/// `M:SS`, whole seconds rounded down.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MoveSpec;

    fn record(san: &str, mover: Side) -> MoveRecord {
        MoveRecord {
            spec: MoveSpec::new("a1".parse().unwrap(), "a2".parse().unwrap()),
            san: san.to_string(),
            mover,
            captured: None,
            castle: false,
            check: false,
            checkmate: false,
        }
    }

    #[test]
    fn pairs_moves_into_rows() {
        let rows = move_rows(&[
            record("e4", Side::White),
            record("e5", Side::Black),
            record("Nf3", Side::White),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].black.as_deref(), Some("e5"));
        assert_eq!(rows[1].white.as_deref(), Some("Nf3"));
        assert_eq!(rows[1].black, None);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(300.0), "5:00");
        assert_eq!(format_clock(65.9), "1:05");
        assert_eq!(format_clock(9.0), "0:09");
        assert_eq!(format_clock(-3.0), "0:00");
    }
}
