//! CSV export of the score trend.

use crate::score::session_score;
use crate::{chronological, Result, Session};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct ScoreRow {
    session_id: String,
    performed_at: String,
    category: String,
    exercises: usize,
    volume_kg: f64,
    score: f64,
}

impl From<&Session> for ScoreRow {
    fn from(session: &Session) -> Self {
        ScoreRow {
            session_id: session.id.to_string(),
            performed_at: session.performed_at.to_rfc3339(),
            category: session.category.to_string(),
            exercises: session.exercises.len(),
            volume_kg: (session.volume_kg() * 10.0).round() / 10.0,
            score: session_score(session),
        }
    }
}

/// Write one row per session, oldest first, replacing any existing file.
///
/// The file is synced to disk before returning the number of rows written.
pub fn write_score_csv(sessions: &[Session], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(csv_path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    let ordered = chronological(sessions);
    for session in &ordered {
        writer.serialize(ScoreRow::from(*session))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions to {:?}", ordered.len(), csv_path);
    Ok(ordered.len())
}
