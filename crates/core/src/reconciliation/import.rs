//! Bank statement text parsing.
//!
//! Accepts decoded delimited text from common bank exports. Columns are
//! located by header name; exports without a header row are read
//! positionally as `date, amount, description[, balance]`. Rows that cannot
//! be read are skipped and reported, never fatal.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::Serialize;
use strata_shared::types::has_cent_precision;

use super::error::ReconciliationError;
use super::types::LineAmount;

/// Day-first formats tried in order.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d/%m/%y",
    "%Y-%m-%d",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%Y/%m/%d",
];

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Where the amount of a row is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AmountColumns {
    /// One signed column: negative is money out.
    Signed(usize),
    /// Separate money-out and money-in columns.
    Split {
        /// Money-out column.
        debit: Option<usize>,
        /// Money-in column.
        credit: Option<usize>,
    },
}

/// Detected column positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLayout {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first row was a header.
    pub has_header: bool,
    /// Date column.
    pub date: usize,
    /// Narrative column.
    pub description: Option<usize>,
    /// Amount column(s).
    pub amounts: AmountColumns,
    /// Running balance column.
    pub balance: Option<usize>,
}

/// Why a row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum SkipReason {
    /// The date cell is empty.
    MissingDate,
    /// The date cell is not a recognised date.
    InvalidDate(String),
    /// No non-zero amount in any amount column.
    MissingAmount,
    /// An amount cell is not a number of whole cents.
    InvalidAmount(String),
    /// Both money-out and money-in hold an amount.
    ConflictingAmounts,
    /// The record itself could not be read.
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDate => f.write_str("missing date"),
            Self::InvalidDate(raw) => write!(f, "invalid date '{raw}'"),
            Self::MissingAmount => f.write_str("missing amount"),
            Self::InvalidAmount(raw) => write!(f, "invalid amount '{raw}'"),
            Self::ConflictingAmounts => f.write_str("both debit and credit present"),
            Self::Unreadable(err) => write!(f, "unreadable row: {err}"),
        }
    }
}

/// A skipped data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based position among data rows.
    pub row_number: usize,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// A successfully parsed data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLine {
    /// 1-based position among data rows.
    pub row_number: usize,
    /// Date the bank applied the movement.
    pub line_date: NaiveDate,
    /// Bank narrative.
    pub description: String,
    /// Money in or out.
    pub amount: LineAmount,
    /// Running balance, if the export has one.
    pub running_balance: Option<Decimal>,
}

impl ParsedLine {
    fn signed(&self) -> Decimal {
        match self.amount {
            LineAmount::Debit(v) => -v,
            LineAmount::Credit(v) => v,
        }
    }
}

/// Result of parsing a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedStatement {
    /// Detected layout.
    pub layout: ColumnLayout,
    /// Imported rows in file order.
    pub lines: Vec<ParsedLine>,
    /// Skipped rows in file order.
    pub skipped: Vec<SkippedRow>,
}

impl ParsedStatement {
    /// Resolves opening and closing balances.
    ///
    /// Supplied values win. Otherwise they are derived from the running
    /// balances of the chronologically first and last lines, and finally
    /// the opening defaults to zero and the closing to opening plus net
    /// movement.
    #[must_use]
    pub fn balances(
        &self,
        opening: Option<Decimal>,
        closing: Option<Decimal>,
    ) -> (Decimal, Decimal) {
        let (first, last) = match (self.lines.first(), self.lines.last()) {
            (Some(a), Some(b)) if a.line_date > b.line_date => (Some(b), Some(a)),
            pair => pair,
        };

        let opening = opening
            .or_else(|| first.and_then(|l| l.running_balance.map(|rb| rb - l.signed())))
            .unwrap_or(Decimal::ZERO);
        let movement: Decimal = self.lines.iter().map(ParsedLine::signed).sum();
        let closing = closing
            .or_else(|| last.and_then(|l| l.running_balance))
            .unwrap_or(opening + movement);

        (opening, closing)
    }

    /// Rejects a statement in which every data row was skipped.
    ///
    /// # Errors
    ///
    /// Returns `NoImportableLines` with the skipped count.
    pub fn ensure_importable(&self) -> Result<(), ReconciliationError> {
        if self.lines.is_empty() {
            return Err(ReconciliationError::NoImportableLines {
                skipped: self.skipped.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    Date,
    Description,
    Debit,
    Credit,
    Amount,
    Balance,
}

/// Bank statement parser.
pub struct StatementParser;

impl StatementParser {
    /// Parses decoded statement text.
    ///
    /// # Errors
    ///
    /// Returns `EmptyStatement` for blank input and `UnrecognisedLayout`
    /// when neither a usable header nor a positional layout is found.
    /// Individual bad rows never fail the parse.
    pub fn parse(raw: &str) -> Result<ParsedStatement, ReconciliationError> {
        let text = raw.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(ReconciliationError::EmptyStatement);
        }

        let delimiter = sniff_delimiter(text);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut records = reader
            .records()
            .filter(|r| r.as_ref().map_or(true, |rec| rec.iter().any(|f| !f.is_empty())));

        let first = match records.next() {
            Some(Ok(record)) => record,
            Some(Err(err)) => {
                return Err(ReconciliationError::UnrecognisedLayout(err.to_string()));
            }
            None => return Err(ReconciliationError::EmptyStatement),
        };

        let layout = detect_layout(&first, delimiter)?;

        let mut lines = Vec::new();
        let mut skipped = Vec::new();
        let data = (!layout.has_header)
            .then_some(Ok(first))
            .into_iter()
            .chain(records);

        for (index, result) in data.enumerate() {
            let row_number = index + 1;
            let parsed = result
                .map_err(|err| SkipReason::Unreadable(err.to_string()))
                .and_then(|record| parse_row(&layout, &record));
            match parsed {
                Ok((line_date, description, amount, running_balance)) => lines.push(ParsedLine {
                    row_number,
                    line_date,
                    description,
                    amount,
                    running_balance,
                }),
                Err(reason) => skipped.push(SkippedRow { row_number, reason }),
            }
        }

        Ok(ParsedStatement {
            layout,
            lines,
            skipped,
        })
    }
}

/// Picks the candidate delimiter occurring most often on the first line.
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for byte in first_line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes
            && let Some(i) = CANDIDATE_DELIMITERS.iter().position(|d| *d == byte)
        {
            counts[i] += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by_key(|(i, count)| (**count, std::cmp::Reverse(*i)))
        .map_or(b',', |(i, _)| CANDIDATE_DELIMITERS[i])
}

fn detect_layout(first: &StringRecord, delimiter: u8) -> Result<ColumnLayout, ReconciliationError> {
    // A first row that already reads as data means there is no header.
    let looks_positional = first.get(0).and_then(parse_date).is_some()
        && parse_amount(first.get(1).unwrap_or("")).is_ok_and(|v| v.is_some());
    if looks_positional {
        return Ok(ColumnLayout {
            delimiter,
            has_header: false,
            date: 0,
            description: (first.len() > 2).then_some(2),
            amounts: AmountColumns::Signed(1),
            balance: (first.len() > 3).then_some(3),
        });
    }

    let mut roles: Vec<(ColumnRole, usize)> = Vec::new();
    for (index, cell) in first.iter().enumerate() {
        if let Some(role) = classify_header(&normalize_header(cell))
            && !roles.iter().any(|(r, _)| *r == role)
        {
            roles.push((role, index));
        }
    }
    let find = |role: ColumnRole| roles.iter().find(|(r, _)| *r == role).map(|(_, i)| *i);

    if let Some(date) = find(ColumnRole::Date) {
        let debit = find(ColumnRole::Debit);
        let credit = find(ColumnRole::Credit);
        let amounts = if debit.is_some() || credit.is_some() {
            AmountColumns::Split { debit, credit }
        } else if let Some(amount) = find(ColumnRole::Amount) {
            AmountColumns::Signed(amount)
        } else {
            return Err(ReconciliationError::UnrecognisedLayout(
                "header has a date column but no amount columns".to_string(),
            ));
        };
        return Ok(ColumnLayout {
            delimiter,
            has_header: true,
            date,
            description: find(ColumnRole::Description),
            amounts,
            balance: find(ColumnRole::Balance),
        });
    }

    Err(ReconciliationError::UnrecognisedLayout(format!(
        "no date column in first row: {}",
        first.iter().collect::<Vec<_>>().join(" | ")
    )))
}

fn normalize_header(cell: &str) -> String {
    cell.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn classify_header(name: &str) -> Option<ColumnRole> {
    const DESCRIPTION_WORDS: [&str; 6] =
        ["description", "narrative", "details", "particulars", "memo", "payee"];

    let has = |word: &str| name.split(' ').any(|w| w.starts_with(word));

    if name.is_empty() {
        None
    } else if has("balance") {
        Some(ColumnRole::Balance)
    } else if has("date") || matches!(name, "posted" | "effective") {
        Some(ColumnRole::Date)
    } else if has("debit")
        || has("withdrawal")
        || matches!(name, "dr" | "money out" | "paid out")
    {
        Some(ColumnRole::Debit)
    } else if has("credit") || has("deposit") || matches!(name, "cr" | "money in" | "paid in") {
        Some(ColumnRole::Credit)
    } else if DESCRIPTION_WORDS.iter().any(|w| has(w)) {
        Some(ColumnRole::Description)
    } else if has("amount") || name == "value" {
        Some(ColumnRole::Amount)
    } else {
        None
    }
}

type RowFields = (NaiveDate, String, LineAmount, Option<Decimal>);

fn parse_row(layout: &ColumnLayout, record: &StringRecord) -> Result<RowFields, SkipReason> {
    let raw_date = record.get(layout.date).unwrap_or("").trim();
    if raw_date.is_empty() {
        return Err(SkipReason::MissingDate);
    }
    let line_date = parse_date(raw_date).ok_or_else(|| SkipReason::InvalidDate(raw_date.to_string()))?;

    let amount = match layout.amounts {
        AmountColumns::Signed(column) => match amount_cell(record, Some(column))? {
            Some(v) if v.is_sign_negative() => LineAmount::Debit(-v),
            Some(v) => LineAmount::Credit(v),
            None => return Err(SkipReason::MissingAmount),
        },
        AmountColumns::Split { debit, credit } => {
            let debit = amount_cell(record, debit)?.map(|v| v.abs());
            let credit = amount_cell(record, credit)?.map(|v| v.abs());
            match (debit, credit) {
                (Some(d), None) => LineAmount::Debit(d),
                (None, Some(c)) => LineAmount::Credit(c),
                (None, None) => return Err(SkipReason::MissingAmount),
                (Some(_), Some(_)) => return Err(SkipReason::ConflictingAmounts),
            }
        }
    };

    let description = layout
        .description
        .and_then(|c| record.get(c))
        .unwrap_or("")
        .trim()
        .to_string();

    let running_balance = layout
        .balance
        .and_then(|c| record.get(c))
        .and_then(|cell| parse_amount(cell).ok().flatten());

    Ok((line_date, description, amount, running_balance))
}

/// Reads a non-zero amount from `column`. Blank and zero cells are `None`.
fn amount_cell(record: &StringRecord, column: Option<usize>) -> Result<Option<Decimal>, SkipReason> {
    let Some(cell) = column.and_then(|c| record.get(c)) else {
        return Ok(None);
    };
    parse_amount(cell)
        .map(|v| v.filter(|a| !a.is_zero()))
        .map_err(|()| SkipReason::InvalidAmount(cell.to_string()))
}

/// Parses a day-first date.
///
/// Trailing time components are ignored.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let attempt = |s: &str| {
        DATE_FORMATS.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .filter(|d| d.year() >= 1900)
        })
    };
    attempt(raw).or_else(|| raw.split_whitespace().next().and_then(attempt))
}

/// Parses a bank amount: currency symbols, thousands separators,
/// parentheses and `CR`/`DR` suffixes. Blank input is `Ok(None)`; anything
/// that is not a number of whole cents is `Err(())`.
fn parse_amount(raw: &str) -> Result<Option<Decimal>, ()> {
    let mut text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let mut negative = false;
    let upper = text.to_ascii_uppercase();
    if upper.ends_with("CR") {
        text = text[..text.len() - 2].trim_end();
    } else if upper.ends_with("DR") {
        text = text[..text.len() - 2].trim_end();
        negative = true;
    }

    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner;
        negative = true;
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}' | '+'))
        .collect();
    if cleaned.is_empty() {
        return Err(());
    }

    let value = Decimal::from_str(&cleaned).map_err(|_| ())?;
    if !has_cent_precision(value) {
        return Err(());
    }

    Ok(Some(if negative { -value.abs() } else { value }))
}
