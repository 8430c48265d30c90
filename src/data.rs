use serde::Serialize;
use std::{collections::HashMap, fmt, io, path::PathBuf};
use thiserror::Error;

pub type Amount = u64;

/// Totals must stay strictly below this, i.e. fit in ten digits.
pub const TOTAL_LIMIT: Amount = 10_000_000_000;

/// Sales files are named `NNNNNNNN.rcd`.
pub const SEQUENCE_DIGITS: usize = 8;
pub const RECORD_EXTENSION: &str = ".rcd";

/// The two kinds of definition we aggregate on. Each one has its own definition
/// file, its own summary file and its own code format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Branch,
    Commodity,
}

impl Category {
    pub fn definition_file(self) -> &'static str {
        match self {
            Category::Branch => "branch.lst",
            Category::Commodity => "commodity.lst",
        }
    }

    pub fn output_file(self) -> &'static str {
        match self {
            Category::Branch => "branch.out",
            Category::Commodity => "commodity.out",
        }
    }

    /// Branch codes are 3 ASCII digits, commodity codes 8 ASCII alphanumerics.
    pub fn is_valid_code(self, code: &str) -> bool {
        match self {
            Category::Branch => code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit()),
            Category::Commodity => {
                code.len() == 8 && code.bytes().all(|b| b.is_ascii_alphanumeric())
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Branch => write!(f, "branch"),
            Category::Commodity => write!(f, "commodity"),
        }
    }
}

/// Which definitions a run aggregates on. This decides how many lines a sales
/// file must have and which summaries get written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    BranchOnly,
    #[default]
    BranchAndCommodity,
}

impl Layout {
    pub fn record_lines(self) -> usize {
        match self {
            Layout::BranchOnly => 2,
            Layout::BranchAndCommodity => 3,
        }
    }
}

/// One line of a definition file, plus the running total accumulated for it.
/// Field order is the summary file column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionEntry {
    pub code: String,
    pub name: String,
    pub total: Amount,
}

/// Code to entry map that remembers insertion order, so that summaries come out
/// in the same order as the definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definitions {
    category: Category,
    entries: Vec<DefinitionEntry>,
    index: HashMap<String, usize>,
}

impl Definitions {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Adds a code with a zero total. A code seen twice keeps its first position
    /// but takes the last name, and its total starts over at zero.
    pub fn insert(&mut self, code: &str, name: &str) {
        match self.index.get(code) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.name = name.to_owned();
                entry.total = 0;
            }
            None => {
                self.index.insert(code.to_owned(), self.entries.len());
                self.entries.push(DefinitionEntry {
                    code: code.to_owned(),
                    name: name.to_owned(),
                    total: 0,
                });
            }
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&DefinitionEntry> {
        self.index.get(code).map(|&i| &self.entries[i])
    }

    pub fn total(&self, code: &str) -> Option<Amount> {
        self.get(code).map(|entry| entry.total)
    }

    /// Returns `false` if the code is unknown, in which case nothing is stored.
    pub fn set_total(&mut self, code: &str, total: Amount) -> bool {
        match self.index.get(code) {
            Some(&i) => {
                self.entries[i].total = total;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefinitionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A sales file picked up from the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub sequence: u32,
}

impl CandidateFile {
    /// Returns `None` unless `name` is exactly 8 ASCII digits followed by `.rcd`.
    pub fn parse(name: &str) -> Option<Self> {
        let digits = name.strip_suffix(RECORD_EXTENSION)?;
        if digits.len() != SEQUENCE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            name: name.to_owned(),
            sequence: digits.parse().ok()?,
        })
    }
}

/// The lines of one sales file, split into fields. Borrowed from the lines,
/// it only lives for the time it takes to accumulate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub branch: &'a str,
    pub commodity: Option<&'a str>,
    pub amount: &'a str,
}

impl<'a> Record<'a> {
    pub fn from_lines(lines: &'a [String], layout: Layout) -> Option<Self> {
        match (layout, lines) {
            (Layout::BranchOnly, [branch, amount]) => Some(Self {
                branch: branch.as_str(),
                commodity: None,
                amount: amount.as_str(),
            }),
            (Layout::BranchAndCommodity, [branch, commodity, amount]) => Some(Self {
                branch: branch.as_str(),
                commodity: Some(commodity.as_str()),
                amount: amount.as_str(),
            }),
            _ => None,
        }
    }
}

/// Everything that can stop a run. The `Display` text is the one line shown to
/// the user, which is why several variants share the same generic message.
#[derive(Error, Debug)]
pub enum Error {
    #[error("an unexpected error occurred")]
    ArgumentCount,
    #[error("{category} definition file does not exist: {}", .path.display())]
    FileNotFound { category: Category, path: PathBuf },
    #[error("{0} definition file has an invalid format")]
    InvalidDefinitionFormat(Category),
    #[error("sales file names are not sequential ({previous} is followed by {next})")]
    NonSequentialFiles { previous: String, next: String },
    #[error("{0} has an invalid format")]
    InvalidRecordFormat(String),
    #[error("{0} has an invalid branch code")]
    UnknownBranchCode(String),
    #[error("{0} has an invalid commodity code")]
    UnknownCommodityCode(String),
    #[error("total amount exceeded 10 digits")]
    AmountOverflow,
    /// Carries no file name, unlike the other record errors.
    #[error("an unexpected error occurred")]
    Unexpected,
    #[error("an unexpected error occurred")]
    Io(#[from] io::Error),
    #[error("an unexpected error occurred")]
    Csv(#[from] csv::Error),
}
