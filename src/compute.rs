use crate::{
    data::{Amount, Definitions, Error, Layout, Record, TOTAL_LIMIT},
    read::RecordUser,
};
use tracing::debug;

/// This is where the running totals live. Branches are always aggregated,
/// commodities only when their definitions were loaded. Single-threaded, the
/// ledger is owned by whoever drives the run.
#[derive(Debug)]
pub struct Ledger {
    pub branches: Definitions,
    pub commodities: Option<Definitions>,
}

impl Ledger {
    pub fn new(branches: Definitions) -> Self {
        Self {
            branches,
            commodities: None,
        }
    }

    pub fn with_commodities(branches: Definitions, commodities: Definitions) -> Self {
        Self {
            branches,
            commodities: Some(commodities),
        }
    }

    pub fn layout(&self) -> Layout {
        match self.commodities {
            Some(_) => Layout::BranchAndCommodity,
            None => Layout::BranchOnly,
        }
    }
}

/// Checks run in a fixed order: line count, branch code, commodity code, amount
/// and finally the ten digit limit. Both new totals are computed before either
/// is stored, so a failing record leaves the ledger untouched.
impl RecordUser for Ledger {
    fn use_record(&mut self, file: &str, lines: Vec<String>) -> Result<(), Error> {
        let record = Record::from_lines(&lines, self.layout())
            .ok_or_else(|| Error::InvalidRecordFormat(file.to_owned()))?;
        let branch_total = self
            .branches
            .total(record.branch)
            .ok_or_else(|| Error::UnknownBranchCode(file.to_owned()))?;
        let commodity_total = match (&self.commodities, record.commodity) {
            (Some(commodities), Some(code)) => Some(
                commodities
                    .total(code)
                    .ok_or_else(|| Error::UnknownCommodityCode(file.to_owned()))?,
            ),
            _ => None,
        };
        let amount = parse_amount(record.amount)?;

        let branch_total = accumulate(branch_total, amount)?;
        let commodity_total = commodity_total
            .map(|total| accumulate(total, amount))
            .transpose()?;

        self.branches.set_total(record.branch, branch_total);
        if let (Some(commodities), Some(code), Some(total)) =
            (self.commodities.as_mut(), record.commodity, commodity_total)
        {
            commodities.set_total(code, total);
        }
        debug!(file, amount, branch = record.branch, "accumulated sales file");
        Ok(())
    }
}

/// Only plain decimal digits are accepted, no sign and no whitespace. Anything
/// else is reported with the generic message, without naming the file.
fn parse_amount(raw: &str) -> Result<Amount, Error> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Unexpected);
    }
    // all digits, so the only way to fail is being too large for u64
    raw.parse().map_err(|_| Error::AmountOverflow)
}

fn accumulate(total: Amount, amount: Amount) -> Result<Amount, Error> {
    total
        .checked_add(amount)
        .filter(|&sum| sum < TOTAL_LIMIT)
        .ok_or(Error::AmountOverflow)
}
