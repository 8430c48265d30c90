use crate::data::{Definitions, Error};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

/// Basic CSV exporter for `Definitions`: one `code,name,total` line per code,
/// in definition file order. Names are written as-is, never quoted.
pub fn write_summary<W: std::io::Write>(writer: W, definitions: &Definitions) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for entry in definitions.iter() {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the summary file for `definitions`' category into `dir`, replacing
/// any previous one.
#[instrument(level = "debug", skip_all, fields(dir = %dir.display(), category = %definitions.category()))]
pub fn write_summary_file(dir: &Path, definitions: &Definitions) -> Result<PathBuf, Error> {
    let path = dir.join(definitions.category().output_file());
    write_summary(File::create(&path)?, definitions)?;
    info!(path = %path.display(), count = definitions.len(), "summary written");
    Ok(path)
}
