//! CSV export for state timelines and loaded peaks.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::peak::{PeakEvent, StateSample};

/// Column header of the timeline export.
const TIMELINE_HEADER: &str = "at,state,preheat_in_progress,critical_peak_coming,\
                               current_offer,next_peak_start";

/// Column header of the peaks export.
const PEAKS_HEADER: &str = "offer,start,end,time_slot,sector,critical,\
                            preheat_start,anchor_start,anchor_end";

/// Exports a state timeline to a CSV file at the given path.
///
/// Writes a header row followed by one row per sample. Instants are written
/// in RFC 3339 with their America/Toronto offset. Produces deterministic
/// output for identical inputs.
///
/// # Arguments
///
/// * `samples` - Timeline from [`PeakHandler::state_timeline`](crate::peak::PeakHandler::state_timeline)
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_timeline_csv(samples: &[StateSample], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_timeline_csv(samples, buf)
}

/// Writes a state timeline as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_timeline_csv(samples: &[StateSample], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(TIMELINE_HEADER.split(',').map(str::trim))?;

    for s in samples {
        wtr.write_record(&[
            s.at.to_rfc3339(),
            s.state.as_str().to_string(),
            s.preheat_in_progress.to_string(),
            s.critical_peak_coming.to_string(),
            s.current_offer.clone().unwrap_or_default(),
            s.next_peak_start
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports loaded peaks with their derived windows to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_peaks_csv(events: &[PeakEvent], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_peaks_csv(events, io::BufWriter::new(file))
}

/// Writes loaded peaks with their derived windows as CSV.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_peaks_csv(events: &[PeakEvent], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(PEAKS_HEADER.split(',').map(str::trim))?;

    for e in events {
        let anchor = e.anchor();
        wtr.write_record(&[
            e.offer().to_string(),
            e.start_date().to_rfc3339(),
            e.end_date().to_rfc3339(),
            e.time_slot().label().to_string(),
            e.sector().label().to_string(),
            e.is_critical().to_string(),
            e.preheat().start_date.to_rfc3339(),
            anchor.start_date.to_rfc3339(),
            anchor.end_date.to_rfc3339(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
