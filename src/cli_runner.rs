//! CLI runner shared by the `tarwalk` binary and the integration tests.

use std::io::{self, Write};
use std::path::Path;

use crate::cli::{self, Commands};
use crate::{ArchiveEntry, Compression, MultiHash, TarWalker, WalkError};

/// Public entry for running CLI logic.
pub fn run_cli_app() -> Result<(), Box<dyn std::error::Error>> {
    let command = cli::run()?;

    match &command {
        Commands::List { archive, hash, compression, json } => {
            let stdout = io::stdout();
            let mut out = io::BufWriter::new(stdout.lock());
            list_archive(archive, hash, compression.forced(), *json, &mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}

/// Walks `archive` and writes one line per entry to `out`, followed by a summary
/// line in text mode. Returns the number of entries listed.
///
/// Entries already written stay written when the archive turns out to be corrupt
/// further in; the error is returned after them.
pub fn list_archive<W: Write>(
    archive: &Path,
    hash: &[String],
    compression: Option<Compression>,
    json: bool,
    out: &mut W,
) -> Result<usize, Box<dyn std::error::Error>> {
    let hashes = MultiHash::new(hash)?;
    let mut walker = TarWalker::open_with(archive, compression, hashes)?;

    let mut count = 0usize;
    for entry in walker.entries()? {
        let entry: ArchiveEntry = entry?;
        if json {
            serde_json::to_writer(&mut *out, &entry)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", format_entry(&entry))?;
        }
        count += 1;
    }

    if !json {
        writeln!(out, "{} entries", count)?;
    }
    Ok(count)
}

/// `<type> <mode> <uid>/<gid> <size> <mtime> <name>[ -> target][ algo:hex...]`
fn format_entry(entry: &ArchiveEntry) -> String {
    let mut line = format!(
        "{:<9} {:04o} {}/{} {:>10} {} {}",
        entry.entry_type,
        entry.mode,
        entry.uid,
        entry.gid,
        entry.size,
        entry.mtime,
        entry.name.display()
    );
    if let Some(target) = &entry.link_target {
        line.push_str(&format!(" -> {}", target.display()));
    }
    if let Some(hash) = &entry.hash {
        for (algo, digest) in hash {
            line.push_str(&format!(" {}:{}", algo, digest));
        }
    }
    line
}

/// Process exit code for an error surfaced by the runner.
pub fn exit_code_for(err: &(dyn std::error::Error + 'static)) -> u8 {
    match err.downcast_ref::<WalkError>() {
        Some(WalkError::UnsupportedAlgorithm { .. }) => 2,
        _ => 1,
    }
}
