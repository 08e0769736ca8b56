//! Typed rows of a single year's station file, after ingestion.

/// One observation row. `values` follows the configured metric order.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRow {
    /// Raw date field, `YYYY-MM-DD`.
    pub date: String,
    /// Raw time field, `HH:MM`.
    pub time: String,
    pub values: Vec<f64>,
}

impl YearRow {
    /// The date with its leading `"<year>-"` removed, i.e. `MM-DD`.
    ///
    /// Dates that do not start with the year prefix are returned unchanged.
    pub fn month_day(&self, year: i32) -> &str {
        let prefix = format!("{year}-");
        self.date.strip_prefix(prefix.as_str()).unwrap_or(&self.date)
    }

    /// The day/time key for this row: `MM-DD_HH:MM`.
    pub fn day_time_key(&self, year: i32) -> String {
        format!("{}_{}", self.month_day(year), self.time)
    }
}

/// All rows of one station file for one year, leap day already removed.
#[derive(Debug, Clone, PartialEq)]
pub struct YearTable {
    pub year: i32,
    pub rows: Vec<YearRow>,
}

impl YearTable {
    pub fn new(year: i32, rows: Vec<YearRow>) -> Self {
        Self { year, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The date string of this year's February 29th.
    pub fn leap_day(year: i32) -> String {
        format!("{year}-02-29")
    }
}

/// Parses a metric cell. Values with a decimal point are read as floats,
/// everything else as integers.
pub fn parse_metric_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.contains('.') {
        raw.parse::<f64>().ok()
    } else {
        raw.parse::<i64>().ok().map(|v| v as f64)
    }
}
