use crate::domain::Domain;
use crate::parse::SubdomainSet;
use crate::utils::ensure_dir;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

// region:        --- Formats

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Txt,
    Json,
    Csv,
}

impl Format {
    pub const ALL: [&'static str; 3] = ["txt", "json", "csv"];

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Txt => "txt",
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(Format::Txt),
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            other => Err(Error::CliUsage(format!("unknown output format {other:?}"))),
        }
    }
}

/// What an export wrote: the subdomain list in some format, or the raw URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Subdomains(Format),
    RawUrls,
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Subdomains(format) => f.write_str(format.extension()),
            ExportKind::RawUrls => f.write_str("raw"),
        }
    }
}

// endregion:     --- Formats

#[derive(Debug)]
pub struct ExportResult {
    pub kind: ExportKind,
    pub path: PathBuf,
    /// Number of entries written, or why the file could not be written.
    pub outcome: Result<usize>,
}

impl ExportResult {
    pub fn is_written(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Body of the JSON export.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubdomainReport {
    pub domain: String,
    pub timestamp: String,
    pub count: usize,
    pub subdomains: Vec<String>,
}

pub fn sorted(subdomains: &SubdomainSet) -> Vec<String> {
    let mut sorted: Vec<String> = subdomains.iter().cloned().collect();
    sorted.sort();
    sorted
}

pub struct Exporter<'a> {
    output_dir: &'a Path,
    domain: &'a Domain,
    timestamp: OffsetDateTime,
}

impl<'a> Exporter<'a> {
    pub fn new(output_dir: &'a Path, domain: &'a Domain) -> Self {
        Self {
            output_dir,
            domain,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn path_for(&self, kind: ExportKind) -> PathBuf {
        let stem = self.domain.file_stem();
        let filename = match kind {
            ExportKind::Subdomains(format) => {
                format!("{}_subdomains.{}", stem, format.extension())
            }
            ExportKind::RawUrls => format!("{}_raw_urls.txt", stem),
        };
        self.output_dir.join(filename)
    }

    /// One result per distinct format, in request order. A failing format
    /// does not stop the others.
    pub fn export(&self, subdomains: &SubdomainSet, formats: &[Format]) -> Vec<ExportResult> {
        let subdomains = sorted(subdomains);
        let mut done = Vec::with_capacity(formats.len());

        formats
            .iter()
            .filter(|format| {
                let first = !done.contains(*format);
                done.push(**format);
                first
            })
            .map(|format| {
                let kind = ExportKind::Subdomains(*format);
                let path = self.path_for(kind);
                let outcome = match format {
                    Format::Txt => write_scoped(&path, |w| write_lines(w, &subdomains)),
                    Format::Json => write_scoped(&path, |w| self.write_json(w, &subdomains)),
                    Format::Csv => write_scoped(&path, |w| write_csv(w, &subdomains)),
                }
                .map(|_| subdomains.len());

                ExportResult {
                    kind,
                    path,
                    outcome,
                }
            })
            .collect()
    }

    pub fn export_raw(&self, urls: &[String]) -> ExportResult {
        let kind = ExportKind::RawUrls;
        let path = self.path_for(kind);
        let outcome = write_scoped(&path, |w| write_lines(w, urls)).map(|_| urls.len());

        ExportResult {
            kind,
            path,
            outcome,
        }
    }

    fn write_json(&self, writer: &mut dyn Write, subdomains: &[String]) -> Result<()> {
        let report = SubdomainReport {
            domain: self.domain.to_string(),
            timestamp: self.timestamp.format(&Rfc3339)?,
            count: subdomains.len(),
            subdomains: subdomains.to_vec(),
        };
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        Ok(())
    }
}

// region:        --- Writers

fn write_lines(writer: &mut dyn Write, lines: &[String]) -> Result<()> {
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

fn write_csv(writer: &mut dyn Write, subdomains: &[String]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(["index", "subdomain"])?;
    for (index, subdomain) in subdomains.iter().enumerate() {
        csv.write_record([(index + 1).to_string().as_str(), subdomain.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes `path` through a buffered handle on a temporary sibling that is
/// renamed into place once flushed. The temporary file is removed on failure.
fn write_scoped<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        ensure_dir(dir)?;
    }

    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    let res = write_file(&tmp_path, write).and_then(|_| Ok(fs::rename(&tmp_path, path)?));
    if res.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    res
}

fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

// endregion:     --- Writers

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn example() -> Domain {
        Domain::validate("example.com").unwrap()
    }

    fn set(hosts: &[&str]) -> SubdomainSet {
        hosts.iter().map(|host| host.to_string()).collect()
    }

    #[test]
    fn writes_sorted_txt_and_csv() {
        let dir = tempdir().unwrap();
        let domain = example();
        let exporter = Exporter::new(dir.path(), &domain);

        let results = exporter.export(
            &set(&["www.example.com", "api.example.com", "example.com"]),
            &[Format::Txt, Format::Csv],
        );

        assert!(results.iter().all(ExportResult::is_written));
        assert_eq!(dir.path().join("example_com_subdomains.txt"), results[0].path);
        assert_eq!(
            "api.example.com\nexample.com\nwww.example.com\n",
            fs::read_to_string(&results[0].path).unwrap()
        );
        assert_eq!(
            "index,subdomain\n1,api.example.com\n2,example.com\n3,www.example.com\n",
            fs::read_to_string(&results[1].path).unwrap()
        );
        assert_eq!(3, *results[1].outcome.as_ref().unwrap());
    }

    #[test]
    fn json_reads_back_sorted() {
        let dir = tempdir().unwrap();
        let domain = example();
        let exporter = Exporter::new(dir.path(), &domain);
        let subdomains = set(&["b.example.com", "a.example.com", "example.com"]);

        let results = exporter.export(&subdomains, &[Format::Json]);
        let content = fs::read_to_string(&results[0].path).unwrap();
        let report: SubdomainReport = serde_json::from_str(&content).unwrap();

        assert_eq!("example.com", report.domain);
        assert_eq!(3, report.count);
        assert_eq!(sorted(&subdomains), report.subdomains);
        assert!(OffsetDateTime::parse(&report.timestamp, &Rfc3339).is_ok());
    }

    #[test]
    fn same_input_gives_identical_bytes() {
        let domain = example();
        let subdomains = set(&["z.example.com", "m.example.com", "a.example.com"]);
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();

        let formats = [Format::Txt, Format::Csv];

        let a = Exporter::new(first.path(), &domain).export(&subdomains, &formats);
        let b = Exporter::new(second.path(), &domain).export(&subdomains, &formats);

        for (a, b) in a.iter().zip(b.iter()) {
            assert_eq!(fs::read(&a.path).unwrap(), fs::read(&b.path).unwrap());
        }
    }

    #[test]
    fn empty_set_still_writes_valid_files() {
        let dir = tempdir().unwrap();
        let domain = example();
        let exporter = Exporter::new(dir.path(), &domain);

        let formats = [Format::Txt, Format::Json, Format::Csv];

        let results = exporter.export(&SubdomainSet::new(), &formats);

        assert!(results.iter().all(ExportResult::is_written));
        assert_eq!("", fs::read_to_string(&results[0].path).unwrap());
        let report: SubdomainReport =
            serde_json::from_str(&fs::read_to_string(&results[1].path).unwrap()).unwrap();
        assert!(report.subdomains.is_empty());
        assert_eq!(0, report.count);
        assert_eq!("index,subdomain\n", fs::read_to_string(&results[2].path).unwrap());
    }

    #[test]
    fn overwrites_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let domain = example();
        let exporter = Exporter::new(dir.path(), &domain);
        let path = exporter.path_for(ExportKind::Subdomains(Format::Txt));
        fs::write(&path, "stale content that is longer than the new one\n").unwrap();

        exporter.export(&set(&["example.com"]), &[Format::Txt]);

        assert_eq!("example.com\n", fs::read_to_string(&path).unwrap());
        assert_eq!(1, fs::read_dir(dir.path()).unwrap().count());
    }

    #[test]
    fn failing_format_does_not_stop_the_others() {
        let dir = tempdir().unwrap();
        let domain = example();
        let exporter = Exporter::new(dir.path(), &domain);
        // a directory where the JSON file should go makes the rename fail
        fs::create_dir(exporter.path_for(ExportKind::Subdomains(Format::Json))).unwrap();

        let results = exporter.export(
            &set(&["example.com"]),
            &[Format::Txt, Format::Json, Format::Csv],
        );

        assert!(results[0].is_written());
        assert!(!results[1].is_written());
        assert!(results[2].is_written());
        assert!(!dir.path().join("example_com_subdomains.json.tmp").exists());
    }

    #[test]
    fn duplicate_formats_are_written_once() {
        let dir = tempdir().unwrap();
        let domain = example();
        let exporter = Exporter::new(dir.path(), &domain);

        let formats = [Format::Csv, Format::Txt, Format::Csv];

        let results = exporter.export(&set(&["example.com"]), &formats);

        let kinds: Vec<ExportKind> = results.iter().map(|res| res.kind).collect();
        assert_eq!(
            vec![
                ExportKind::Subdomains(Format::Csv),
                ExportKind::Subdomains(Format::Txt)
            ],
            kinds
        );
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("results").join("run");
        let domain = example();

        let urls = vec!["http://example.com/".to_string()];

        let res = Exporter::new(&nested, &domain).export_raw(&urls);

        assert_eq!(nested.join("example_com_raw_urls.txt"), res.path);
        assert_eq!(1, *res.outcome.as_ref().unwrap());
        assert_eq!("http://example.com/\n", fs::read_to_string(&res.path).unwrap());
    }

    #[test]
    fn parses_formats() {
        assert_eq!(Format::Json, "JSON".parse::<Format>().unwrap());
        assert!("xml".parse::<Format>().is_err());
    }
}
