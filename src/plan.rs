//! The editable XML plan: source/dest directories, matches, partial
//! entries, ignore sets, and the section-header commentary a human reads
//! while hand-editing the file.
//!
//! Reading is a pull parse over `quick_xml`'s `Reader`; writing is done with
//! plain formatted `write!` calls against the same underlying `Write` so
//! that every byte — indentation, blank lines around section comments,
//! trailing newline — is under our control. The plan is hand-edited, so the
//! exact bytes are part of the contract, not an implementation detail.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{CodeSyncError, Result};
use crate::matcher::MatchOutcome;
use crate::relpath::RelativePath;

/// A `Copy` entry. Both fields present is a complete match; either one
/// missing is a partial entry degraded from a stale prior match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyEntry {
    pub source: Option<RelativePath>,
    pub dest: Option<RelativePath>,
}

impl CopyEntry {
    pub fn complete(source: RelativePath, dest: RelativePath) -> Self {
        Self { source: Some(source), dest: Some(dest) }
    }

    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.dest.is_some()
    }
}

/// An `Ignore` entry, recorded as whichever side it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreEntry {
    Source(RelativePath),
    Dest(RelativePath),
}

impl IgnoreEntry {
    pub fn as_source(&self) -> Option<&RelativePath> {
        match self {
            IgnoreEntry::Source(p) => Some(p),
            IgnoreEntry::Dest(_) => None,
        }
    }

    pub fn as_dest(&self) -> Option<&RelativePath> {
        match self {
            IgnoreEntry::Dest(p) => Some(p),
            IgnoreEntry::Source(_) => None,
        }
    }
}

/// The parsed document: directories, optional timestamp, and every `Copy`
/// and `Ignore` entry in document order.
#[derive(Debug, Clone)]
pub struct Plan {
    pub source_directory: String,
    pub dest_directory: String,
    pub modified_time: Option<String>,
    pub copies: Vec<CopyEntry>,
    pub ignores: Vec<IgnoreEntry>,
}

impl Plan {
    /// `Copy` entries with both sides present.
    pub fn files_to_copy(&self) -> impl Iterator<Item = &CopyEntry> {
        self.copies.iter().filter(|c| c.is_complete())
    }

    /// `Copy` entries with exactly one side present.
    pub fn partial_entries(&self) -> impl Iterator<Item = &CopyEntry> {
        self.copies.iter().filter(|c| !c.is_complete())
    }

    pub fn ignore_source_entries(&self) -> impl Iterator<Item = &RelativePath> {
        self.ignores.iter().filter_map(IgnoreEntry::as_source)
    }

    pub fn ignore_dest_entries(&self) -> impl Iterator<Item = &RelativePath> {
        self.ignores.iter().filter_map(IgnoreEntry::as_dest)
    }

    /// Load a plan from disk. A document missing the root element or either
    /// directory is a fatal `InvalidPlan` error.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CodeSyncError::InputNotFound(path.to_path_buf())
            } else {
                CodeSyncError::Io(e)
            }
        })?;

        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut seen_root = false;
        let mut source_directory = None;
        let mut dest_directory = None;
        let mut modified_time = None;
        let mut copies = Vec::new();
        let mut ignores = Vec::new();

        // Two-level state: `outer` is the current top-level child of
        // `CodeSync` (SourceDirectory, DestDirectory, ModifiedTime, Copy,
        // Ignore); `inner` is the current child of a Copy/Ignore element
        // (Source, Destination).
        let mut outer: Option<String> = None;
        let mut inner: Option<String> = None;
        let mut cur_source: Option<String> = None;
        let mut cur_dest: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = tag_name(&e);
                    if name == "CodeSync" {
                        seen_root = true;
                    } else if outer.is_none() {
                        outer = Some(name);
                    } else {
                        inner = Some(name);
                    }
                },
                Event::Empty(_) => {
                    // Self-closed element: an inner Source/Destination with
                    // no text, or an empty Copy/Ignore. Both read back the
                    // same as an absent field.
                },
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    match (outer.as_deref(), inner.as_deref()) {
                        (Some("SourceDirectory"), None) => source_directory = Some(text),
                        (Some("DestDirectory"), None) => dest_directory = Some(text),
                        (Some("ModifiedTime"), None) => modified_time = Some(text),
                        (Some("Copy") | Some("Ignore"), Some("Source")) if !text.is_empty() => {
                            cur_source = Some(text);
                        },
                        (Some("Copy") | Some("Ignore"), Some("Destination")) if !text.is_empty() => {
                            cur_dest = Some(text);
                        },
                        _ => {},
                    }
                },
                Event::End(e) => {
                    let name = tag_name(&e);
                    if inner.as_deref() == Some(name.as_str()) {
                        inner = None;
                    } else if outer.as_deref() == Some(name.as_str()) {
                        match name.as_str() {
                            "Copy" => copies.push(CopyEntry {
                                source: cur_source.take().map(RelativePath::new),
                                dest: cur_dest.take().map(RelativePath::new),
                            }),
                            "Ignore" => match (cur_source.take(), cur_dest.take()) {
                                (Some(s), _) => ignores.push(IgnoreEntry::Source(RelativePath::new(s))),
                                (None, Some(d)) => ignores.push(IgnoreEntry::Dest(RelativePath::new(d))),
                                (None, None) => {},
                            },
                            _ => {},
                        }
                        outer = None;
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        if !seen_root {
            return Err(CodeSyncError::InvalidPlan(format!(
                "{}: missing CodeSync root element",
                path.display()
            )));
        }
        let source_directory = source_directory.ok_or_else(|| {
            CodeSyncError::InvalidPlan(format!("{}: missing SourceDirectory", path.display()))
        })?;
        let dest_directory = dest_directory.ok_or_else(|| {
            CodeSyncError::InvalidPlan(format!("{}: missing DestDirectory", path.display()))
        })?;

        Ok(Plan { source_directory, dest_directory, modified_time, copies, ignores })
    }
}

fn tag_name(e: &quick_xml::events::BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Writes the plan document byte-for-byte: two-space indent, `\n`
/// newlines unconditionally (never `\r\n`, so plans are identical across
/// platforms), and section comments as raw text sharing the writer with
/// the structured `Copy`/`Ignore` elements around them.
pub struct PlanWriter<W: Write> {
    out: W,
}

impl<W: Write> PlanWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(
        &mut self,
        source_dir: &str,
        dest_dir: &str,
        modified_time: Option<&str>,
    ) -> Result<()> {
        writeln!(self.out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(self.out, "<CodeSync>")?;
        writeln!(self.out, "  <SourceDirectory>{}</SourceDirectory>", escape(source_dir))?;
        writeln!(self.out, "  <DestDirectory>{}</DestDirectory>", escape(dest_dir))?;
        if let Some(mt) = modified_time {
            writeln!(self.out, "  <ModifiedTime>{}</ModifiedTime>", escape(mt))?;
        }
        Ok(())
    }

    /// A block-comment section header, with a blank line on either side —
    /// the visual spacing a hand-edited file relies on to tell sections
    /// apart.
    pub fn write_section_header(&mut self, lines: &[&str]) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "  <!--")?;
        for line in lines {
            writeln!(self.out, "    {line}")?;
        }
        writeln!(self.out, "  -->")?;
        writeln!(self.out)?;
        Ok(())
    }

    pub fn write_copy(&mut self, source: &RelativePath, dest: &RelativePath) -> Result<()> {
        writeln!(self.out, "  <Copy>")?;
        writeln!(self.out, "    <Source>{}</Source>", escape(source.as_str()))?;
        writeln!(self.out, "    <Destination>{}</Destination>", escape(dest.as_str()))?;
        writeln!(self.out, "  </Copy>")?;
        Ok(())
    }

    pub fn write_partial(&mut self, entry: &CopyEntry) -> Result<()> {
        writeln!(self.out, "  <Copy>")?;
        if let Some(s) = &entry.source {
            writeln!(self.out, "    <Source>{}</Source>", escape(s.as_str()))?;
        }
        if let Some(d) = &entry.dest {
            writeln!(self.out, "    <Destination>{}</Destination>", escape(d.as_str()))?;
        }
        writeln!(self.out, "  </Copy>")?;
        Ok(())
    }

    pub fn write_ignore_source(&mut self, source: &RelativePath) -> Result<()> {
        writeln!(self.out, "  <Ignore>")?;
        writeln!(self.out, "    <Source>{}</Source>", escape(source.as_str()))?;
        writeln!(self.out, "  </Ignore>")?;
        Ok(())
    }

    pub fn write_ignore_dest(&mut self, dest: &RelativePath) -> Result<()> {
        writeln!(self.out, "  <Ignore>")?;
        writeln!(self.out, "    <Destination>{}</Destination>", escape(dest.as_str()))?;
        writeln!(self.out, "  </Ignore>")?;
        Ok(())
    }

    /// An ambiguous source: its candidates are listed as commented-out
    /// `Destination` hints so a human can pick one by uncommenting.
    pub fn write_ambiguous(&mut self, source: &RelativePath, candidates: &[RelativePath]) -> Result<()> {
        writeln!(self.out, "  <Ignore>")?;
        writeln!(self.out, "    <Source>{}</Source>", escape(source.as_str()))?;
        for candidate in candidates {
            writeln!(
                self.out,
                "    <!-- <Destination>{}</Destination> -->",
                escape(candidate.as_str())
            )?;
        }
        writeln!(self.out, "  </Ignore>")?;
        Ok(())
    }

    pub fn write_dest_orphan_hint(&mut self, path: &RelativePath) -> Result<()> {
        writeln!(self.out, "  <!-- <Destination>{}</Destination> -->", escape(path.as_str()))?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        writeln!(self.out, "</CodeSync>")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Emission order: matches, one-left, ambiguous, source orphans, dest
/// orphans. Each section is preceded by a human-readable header comment.
pub fn write_match_outcome<W: Write>(
    writer: &mut PlanWriter<W>,
    outcome: &MatchOutcome,
) -> Result<()> {
    for m in &outcome.matches {
        writer.write_copy(&m.source, &m.dest)?;
    }

    if !outcome.one_left.is_empty() {
        writer.write_section_header(&[
            "Sources below matched more than one destination candidate, but",
            "every candidate except one was ruled out. The remaining pairing",
            "may still be wrong -- check it before syncing.",
        ])?;
        for entry in &outcome.one_left {
            writer.write_copy(&entry.source, &entry.dest)?;
        }
    }

    if !outcome.ambiguous.is_empty() {
        writer.write_section_header(&[
            "Sources below matched more than one destination candidate and",
            "could not be narrowed down further. Uncomment the Destination",
            "line that is the right match, or leave commented to skip it.",
        ])?;
        for entry in &outcome.ambiguous {
            writer.write_ambiguous(&entry.source, &entry.candidates)?;
        }
    }

    if !outcome.source_orphans.is_empty() {
        writer.write_section_header(&[
            "Source files below had no matching destination file. Add a",
            "Destination line to Copy one in manually, or leave as-is to skip.",
        ])?;
        for path in &outcome.source_orphans {
            writer.write_ignore_source(path)?;
        }
    }

    if !outcome.dest_orphans.is_empty() {
        writer.write_section_header(&[
            "Destination files below had no matching source file. Listed for",
            "reference only; these lines are not read back.",
        ])?;
        for path in &outcome.dest_orphans {
            writer.write_dest_orphan_hint(path)?;
        }
    }

    Ok(())
}

/// Writes a full `update` plan: the carried-forward sections first (in the
/// order the updater produced them), then the fresh matcher outcome,
/// exactly the emission order `update` promises.
pub fn write_update_result<W: Write>(
    writer: &mut PlanWriter<W>,
    result: &crate::updater::UpdateResult,
) -> Result<()> {
    if !result.previous_matches.is_empty() {
        writer.write_section_header(&[
            "Previously matched pairs, carried forward unchanged from the prior",
            "plan. Both files were confirmed to still exist.",
        ])?;
        for entry in &result.previous_matches {
            let source = entry.source.as_ref().expect("previous match is complete");
            let dest = entry.dest.as_ref().expect("previous match is complete");
            writer.write_copy(source, dest)?;
        }
    }

    if !result.previous_partials.is_empty() {
        writer.write_section_header(&[
            "Previously matched pairs whose source or destination has since",
            "gone missing. Fill in the missing side manually, or leave as-is",
            "to let a future update re-resolve it.",
        ])?;
        for entry in &result.previous_partials {
            writer.write_partial(entry)?;
        }
    }

    if !result.ignore_source.is_empty() || !result.ignore_dest.is_empty() {
        writer.write_section_header(&[
            "Ignore entries carried forward unconditionally from the prior plan.",
        ])?;
        for path in &result.ignore_source {
            writer.write_ignore_source(path)?;
        }
        for path in &result.ignore_dest {
            writer.write_ignore_dest(path)?;
        }
    }

    write_match_outcome(writer, &result.fresh)
}
