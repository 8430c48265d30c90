use crate::data::{CandidateFile, Category, Definitions, Error};
use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, info, instrument};

/// Trait for doing something with the lines of a sales file. Used by the
/// aggregation logic to accumulate totals, but also used for mock tests to
/// check which files get read, and in which order.
pub trait RecordUser {
    fn use_record(&mut self, file: &str, lines: Vec<String>) -> Result<(), Error>;
}

/// Loads `category`'s definition file from `dir`.
#[instrument(level = "debug", skip(dir), fields(dir = %dir.display()))]
pub fn load_definitions(dir: &Path, category: Category) -> Result<Definitions, Error> {
    let path = dir.join(category.definition_file());
    if !path.exists() {
        return Err(Error::FileNotFound { category, path });
    }
    let definitions = read_definitions(File::open(&path)?, category)?;
    info!(count = definitions.len(), "loaded {category} definitions");
    Ok(definitions)
}

/// Parses `code,name` lines. Trailing empty fields are dropped, then every
/// line needs exactly two fields and a code that is valid for `category`. A
/// blank line has no fields left and is rejected like any other bad line.
pub fn read_definitions<R: Read>(reader: R, category: Category) -> Result<Definitions, Error> {
    let mut definitions = Definitions::new(category);
    for line in read_lines(reader)? {
        match split_fields(&line).as_slice() {
            [code, name] if category.is_valid_code(code) => definitions.insert(code, name),
            _ => return Err(Error::InvalidDefinitionFormat(category)),
        }
    }
    Ok(definitions)
}

fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(',').collect();
    while fields.last().is_some_and(|field| field.is_empty()) {
        fields.pop();
    }
    fields
}

/// Lists the sales files of `dir` in sequence order, failing if the sequence
/// has a gap. The sequence may start anywhere.
#[instrument(level = "debug", skip(dir), fields(dir = %dir.display()))]
pub fn collect_records(dir: &Path) -> Result<Vec<CandidateFile>, Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !entry.path().is_file() {
            continue;
        }
        if let Some(file) = CandidateFile::parse(&name) {
            files.push(file);
        }
    }
    // fixed width names, so this is also numeric order
    files.sort_by(|a, b| a.name.cmp(&b.name));
    check_sequence(&files)?;
    debug!(count = files.len(), "collected sales files");
    Ok(files)
}

pub fn check_sequence(files: &[CandidateFile]) -> Result<(), Error> {
    for pair in files.windows(2) {
        if pair[1].sequence != pair[0].sequence + 1 {
            return Err(Error::NonSequentialFiles {
                previous: pair[0].name.clone(),
                next: pair[1].name.clone(),
            });
        }
    }
    Ok(())
}

/// Feeds every file of `files`, in order, to `user`. Stops at the first error.
pub fn read_records<U: RecordUser>(
    dir: &Path,
    files: &[CandidateFile],
    user: &mut U,
) -> Result<(), Error> {
    for file in files {
        let lines = read_lines(File::open(dir.join(&file.name))?)?;
        debug!(file = %file.name, lines = lines.len(), "read sales file");
        user.use_record(&file.name, lines)?;
    }
    Ok(())
}

/// Splits on `\n`, `\r\n` and a lone `\r`. A final terminator does not start
/// another line.
fn read_lines<R: Read>(reader: R) -> Result<Vec<String>, Error> {
    let mut text = String::new();
    BufReader::new(reader).read_to_string(&mut text)?;
    let mut lines = Vec::new();
    let mut rest = text.as_str();
    while !rest.is_empty() {
        match rest.find(|c: char| c == '\n' || c == '\r') {
            Some(end) => {
                lines.push(rest[..end].to_owned());
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest.to_owned());
                break;
            }
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use crate::{
        data::{CandidateFile, Category, Error},
        read::{
            check_sequence, collect_records, read_definitions, read_lines, read_records,
            split_fields, RecordUser,
        },
    };
    use std::fs;
    use tempfile::tempdir;

    fn candidates(sequences: &[u32]) -> Vec<CandidateFile> {
        sequences
            .iter()
            .map(|&sequence| CandidateFile {
                name: format!("{sequence:08}.rcd"),
                sequence,
            })
            .collect()
    }

    #[test]
    fn read_branch_definitions() {
        let definitions = read_definitions(
            &b"001,Tokyo\n002,Osaka\r\n003,Nagoya"[..],
            Category::Branch,
        )
        .unwrap();
        let entries: Vec<_> = definitions
            .iter()
            .map(|e| (e.code.as_str(), e.name.as_str(), e.total))
            .collect();
        assert_eq!(
            entries,
            [("001", "Tokyo", 0), ("002", "Osaka", 0), ("003", "Nagoya", 0)]
        );
    }

    #[test]
    fn read_commodity_definitions() {
        let definitions = read_definitions(
            &b"SFD00001,Laptop\nSFD00002,Desktop\n"[..],
            Category::Commodity,
        )
        .unwrap();
        assert_eq!(definitions.category(), Category::Commodity);
        assert!(definitions.contains("SFD00001"));
        assert!(definitions.contains("SFD00002"));
        assert_eq!(definitions.total("SFD00002"), Some(0));
    }

    #[test]
    fn invalid_definition_lines() {
        for input in [
            &b"001,Tokyo,Extra\n"[..],
            &b"001\n"[..],
            &b"01,Tokyo\n"[..],
            &b"ABC,Tokyo\n"[..],
            &b"001,Tokyo\n 002,Osaka\n"[..],
            &b"001,Tokyo\n\n002,Osaka\n"[..],
            &b"001,\n"[..],
            &b",Tokyo\n"[..],
            &b"\n"[..],
        ] {
            assert!(
                matches!(
                    read_definitions(input, Category::Branch),
                    Err(Error::InvalidDefinitionFormat(Category::Branch))
                ),
                "{:?} should be rejected",
                String::from_utf8_lossy(input)
            );
        }
        assert!(matches!(
            read_definitions(&b"SFD0001,Laptop\n"[..], Category::Commodity),
            Err(Error::InvalidDefinitionFormat(Category::Commodity))
        ));
    }

    #[test]
    fn trailing_empty_fields_are_dropped() {
        let definitions =
            read_definitions(&b"001,Tokyo,\n002,Osaka,,\n"[..], Category::Branch).unwrap();
        assert_eq!(definitions.get("001").map(|e| e.name.as_str()), Some("Tokyo"));
        assert_eq!(definitions.get("002").map(|e| e.name.as_str()), Some("Osaka"));
        assert_eq!(split_fields("001,,Tokyo"), ["001", "", "Tokyo"]);
        assert!(split_fields("").is_empty());
        assert!(split_fields(",,").is_empty());
    }

    #[test]
    fn empty_definition_file() {
        let definitions = read_definitions(&b""[..], Category::Branch).unwrap();
        assert!(definitions.is_empty());
    }

    #[test]
    fn line_terminators() {
        assert_eq!(
            read_lines(&b"001\rSFD00001\r100\r"[..]).unwrap(),
            ["001", "SFD00001", "100"]
        );
        assert_eq!(
            read_lines(&b"001\r\nSFD00001\n100"[..]).unwrap(),
            ["001", "SFD00001", "100"]
        );
        assert_eq!(read_lines(&b"a\n\nb\n"[..]).unwrap(), ["a", "", "b"]);
        assert_eq!(read_lines(&b"\r\n"[..]).unwrap(), [""]);
        assert!(read_lines(&b""[..]).unwrap().is_empty());
    }

    #[test]
    fn sequence_without_gap() {
        assert!(check_sequence(&candidates(&[])).is_ok());
        assert!(check_sequence(&candidates(&[7])).is_ok());
        assert!(check_sequence(&candidates(&[5, 6, 7, 8])).is_ok());
    }

    #[test]
    fn sequence_with_gap() {
        match check_sequence(&candidates(&[1, 2, 4])) {
            Err(Error::NonSequentialFiles { previous, next }) => {
                assert_eq!(previous, "00000002.rcd");
                assert_eq!(next, "00000004.rcd");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(matches!(
            check_sequence(&candidates(&[1, 1])),
            Err(Error::NonSequentialFiles { .. })
        ));
    }

    #[test]
    fn collect_only_sales_files() {
        let dir = tempdir().unwrap();
        for name in ["00000002.rcd", "00000001.rcd", "00000003.rcd", "0000004.rcd", "notes.txt"] {
            fs::write(dir.path().join(name), "001\n1\n").unwrap();
        }
        fs::create_dir(dir.path().join("00000009.rcd")).unwrap();
        let files = collect_records(dir.path()).unwrap();
        assert_eq!(files, candidates(&[1, 2, 3]));
    }

    #[test]
    fn collect_detects_gap() {
        let dir = tempdir().unwrap();
        for name in ["00000001.rcd", "00000003.rcd"] {
            fs::write(dir.path().join(name), "001\n1\n").unwrap();
        }
        assert!(matches!(
            collect_records(dir.path()),
            Err(Error::NonSequentialFiles { .. })
        ));
    }

    #[test]
    fn read_records_in_order() {
        #[derive(Default)]
        struct RecordStorage {
            records: Vec<(String, Vec<String>)>,
        }
        impl RecordUser for RecordStorage {
            fn use_record(&mut self, file: &str, lines: Vec<String>) -> Result<(), Error> {
                Ok(self.records.push((file.to_owned(), lines)))
            }
        }
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("00000001.rcd"), "001\nSFD00001\n100\n").unwrap();
        fs::write(dir.path().join("00000002.rcd"), "002\r\nSFD00002\r\n200").unwrap();
        let files = collect_records(dir.path()).unwrap();
        let mut storage = RecordStorage::default();
        read_records(dir.path(), &files, &mut storage).unwrap();
        assert_eq!(
            storage.records,
            [
                (
                    "00000001.rcd".to_string(),
                    vec!["001".to_string(), "SFD00001".to_string(), "100".to_string()]
                ),
                (
                    "00000002.rcd".to_string(),
                    vec!["002".to_string(), "SFD00002".to_string(), "200".to_string()]
                ),
            ]
        );
    }

    #[test]
    fn read_records_stops_at_first_error() {
        struct FailFirst {
            seen: usize,
        }
        impl RecordUser for FailFirst {
            fn use_record(&mut self, file: &str, _lines: Vec<String>) -> Result<(), Error> {
                self.seen += 1;
                Err(Error::InvalidRecordFormat(file.to_owned()))
            }
        }
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("00000001.rcd"), "001\n").unwrap();
        fs::write(dir.path().join("00000002.rcd"), "001\n").unwrap();
        let files = collect_records(dir.path()).unwrap();
        let mut user = FailFirst { seen: 0 };
        assert!(matches!(
            read_records(dir.path(), &files, &mut user),
            Err(Error::InvalidRecordFormat(file)) if file == "00000001.rcd"
        ));
        assert_eq!(user.seen, 1);
    }
}
