//! Hands lines from the producer thread to the output, one at a time.
//!
//! The channel is a rendezvous (`sync_channel(0)`): the producer blocks on
//! every send until the writer has taken the previous line, so lines arrive
//! strictly in order and nothing is buffered between the two sides.

use crate::error::GomakerError;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    /// End of transmission.
    End,
}

/// An open destination, plus where the previous file was saved, if anywhere.
pub struct Opened {
    pub out: Box<dyn Write>,
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// `-` means standard output. Relative paths are taken relative to `base`.
    pub fn parse(output: &str, base: &Path) -> Self {
        if output == "-" {
            return Destination::Stdout;
        }
        let path = Path::new(output);
        if path.is_absolute() {
            Destination::File(path.to_path_buf())
        } else {
            Destination::File(base.join(path))
        }
    }

    /// Opens the destination for writing, truncating any existing file.
    ///
    /// With `backup` an existing file is first copied into the temp dir.
    pub fn open(&self, backup: bool, no_clobber: bool) -> Result<Opened, GomakerError> {
        match self {
            Destination::Stdout => Ok(Opened {
                out: Box::new(io::stdout().lock()),
                backup: None,
            }),
            Destination::File(path) => {
                let mut saved = None;
                if path.exists() {
                    if no_clobber {
                        return Err(GomakerError::Clobber(path.clone()));
                    }
                    if backup {
                        let target = backup_file(path)?;
                        info!("Backed up {} to {}", path.display(), target.display());
                        saved = Some(target);
                    }
                }
                let file = File::create(path)?;
                Ok(Opened {
                    out: Box::new(BufWriter::new(file)),
                    backup: saved,
                })
            }
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Stdout => f.write_str("<stdout>"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn generate_random_string(length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| rng.sample(Alphanumeric))
        .map(char::from)
        .collect()
}

/// Copies `path` to `<tmpdir>/gomaker-<random>-<file name>`.
pub fn backup_file(path: &Path) -> Result<PathBuf, GomakerError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Makefile".to_string());
    let target = std::env::temp_dir().join(format!(
        "gomaker-{}-{}",
        generate_random_string(8),
        file_name
    ));
    fs::copy(path, &target).map_err(|source| GomakerError::Backup {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(target)
}

/// Sends every line, then `End`. Fails if the writer hangs up early.
pub fn send_lines<I>(lines: I, tx: &SyncSender<Line>) -> Result<(), GomakerError>
where
    I: IntoIterator<Item = String>,
{
    for line in lines {
        tx.send(Line::Text(line)).map_err(|_| GomakerError::WriterGone)?;
    }
    tx.send(Line::End).map_err(|_| GomakerError::WriterGone)
}

/// Writes lines until `End`, returning how many were written.
pub fn write_lines<W: Write + ?Sized>(
    rx: &Receiver<Line>,
    out: &mut W,
) -> Result<usize, GomakerError> {
    let mut count = 0;
    loop {
        match rx.recv() {
            Ok(Line::Text(line)) => {
                out.write_all(line.as_bytes())?;
                out.write_all(b"\n")?;
                count += 1;
            }
            Ok(Line::End) => {
                out.flush()?;
                debug!(count, "end of transmission");
                return Ok(count);
            }
            Err(_) => return Err(GomakerError::Truncated),
        }
    }
}

/// Runs `produce` on its own thread and writes whatever it sends to `out`.
///
/// A writer failure wins over the producer's, since the producer only
/// notices it as a hang-up. The reverse holds for a truncated stream.
pub fn pipe<F, W>(produce: F, out: &mut W) -> Result<usize, GomakerError>
where
    F: FnOnce(SyncSender<Line>) -> Result<(), GomakerError> + Send + 'static,
    W: Write + ?Sized,
{
    let (tx, rx) = sync_channel(0);
    let producer: JoinHandle<Result<(), GomakerError>> = thread::spawn(move || produce(tx));

    let written = write_lines(&rx, out);
    drop(rx);
    let produced = producer.join().map_err(|_| GomakerError::ProducerPanicked)?;

    match (written, produced) {
        (Err(GomakerError::Truncated), Err(e)) => Err(e),
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(count), Ok(())) => Ok(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lines_arrive_in_order_until_end() {
        let mut out = Vec::new();
        let lines = strings(&["one", "two", "", "three"]);
        let count = pipe(move |tx| send_lines(lines, &tx), &mut out).unwrap();
        assert_eq!(count, 4);
        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\n\nthree\n");
    }

    #[test]
    fn nothing_after_end_is_written() {
        let mut out = Vec::new();
        let count = pipe(
            |tx| {
                tx.send(Line::Text("kept".into())).unwrap();
                tx.send(Line::End).unwrap();
                // writer is gone by now
                let _ = tx.send(Line::Text("dropped".into()));
                Ok(())
            },
            &mut out,
        )
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(out, b"kept\n");
    }

    #[test]
    fn producer_without_end_truncates() {
        let mut out = Vec::new();
        let err = pipe(
            |tx| {
                tx.send(Line::Text("partial".into())).unwrap();
                Ok(())
            },
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, GomakerError::Truncated));
    }

    #[test]
    fn producer_error_is_reported() {
        let mut out = Vec::new();
        let err = pipe(|_tx| Err(GomakerError::Template("boom".into())), &mut out).unwrap_err();
        assert!(matches!(err, GomakerError::Template(msg) if msg == "boom"));
    }

    #[test]
    fn destination_parsing() {
        let base = Path::new("/src/hello");
        assert_eq!(Destination::parse("-", base), Destination::Stdout);
        assert_eq!(
            Destination::parse("Makefile", base),
            Destination::File(PathBuf::from("/src/hello/Makefile"))
        );
        assert_eq!(
            Destination::parse("/tmp/out.mk", base),
            Destination::File(PathBuf::from("/tmp/out.mk"))
        );
    }

    #[test]
    fn existing_file_is_backed_up_then_truncated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Makefile");
        fs::write(&path, "old contents\n").unwrap();

        let saved = backup_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&saved).unwrap(), "old contents\n");
        assert!(saved.file_name().unwrap().to_string_lossy().ends_with("-Makefile"));
        fs::remove_file(saved).unwrap();

        let dest = Destination::File(path.clone());
        {
            let mut opened = dest.open(false, false).unwrap();
            assert_eq!(opened.backup, None);
            opened.out.write_all(b"new\n").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn open_with_backup_reports_saved_copy() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Makefile");
        fs::write(&path, "old contents\n").unwrap();

        let opened = Destination::File(path.clone()).open(true, false).unwrap();
        let saved = opened.backup.clone().unwrap();
        drop(opened);
        assert_eq!(fs::read_to_string(&saved).unwrap(), "old contents\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        fs::remove_file(saved).unwrap();
    }

    #[test]
    fn backup_of_missing_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Makefile");
        let opened = Destination::File(path.clone()).open(true, false).unwrap();
        assert_eq!(opened.backup, None);
        drop(opened);
        assert!(path.is_file());
    }

    #[test]
    fn stdout_destination_opens_without_backup() {
        let opened = Destination::Stdout.open(true, true).unwrap();
        assert_eq!(opened.backup, None);
    }

    #[test]
    fn no_clobber_refuses_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Makefile");
        fs::write(&path, "keep me\n").unwrap();

        let err = Destination::File(path.clone()).open(true, true).err().unwrap();
        assert!(matches!(err, GomakerError::Clobber(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");
    }
}
