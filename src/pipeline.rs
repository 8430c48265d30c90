use crate::{
    compute::Ledger,
    data::{Category, Error, Layout},
    read::{collect_records, load_definitions, read_records},
    write::write_summary_file,
};
use std::path::PathBuf;
use tracing::{info, instrument};

/// What to aggregate and where. The directory holds the definition files, the
/// sales files, and receives the summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub directory: PathBuf,
    pub layout: Layout,
}

impl Config {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            layout: Layout::default(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// Runs the whole thing: definitions, sales file collection, aggregation and
/// finally the summaries. The first failure aborts the run; nothing is written
/// unless every sales file was accumulated.
#[instrument(
    level = "info",
    skip_all,
    fields(directory = %config.directory.display(), layout = ?config.layout)
)]
pub fn run(config: &Config) -> Result<Ledger, Error> {
    let dir = config.directory.as_path();
    let branches = load_definitions(dir, Category::Branch)?;
    let mut ledger = match config.layout {
        Layout::BranchOnly => Ledger::new(branches),
        Layout::BranchAndCommodity => {
            Ledger::with_commodities(branches, load_definitions(dir, Category::Commodity)?)
        }
    };

    let files = collect_records(dir)?;
    info!(count = files.len(), "aggregating sales files");
    read_records(dir, &files, &mut ledger)?;

    write_summary_file(dir, &ledger.branches)?;
    if let Some(commodities) = &ledger.commodities {
        write_summary_file(dir, commodities)?;
    }
    Ok(ledger)
}
