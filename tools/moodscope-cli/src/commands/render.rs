//! Re-render the text report from a JSON snapshot.

use std::path::PathBuf;

use moodscope_report_engine::{load_snapshot, render_text, write_file};

pub fn run(snapshot: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let report = load_snapshot(&snapshot)
        .map_err(|e| anyhow::anyhow!("Failed to load snapshot: {e}"))?;
    let text = render_text(&report);

    match output {
        Some(path) => {
            write_file(&path, &text)
                .map_err(|e| anyhow::anyhow!("Failed to write report: {e}"))?;
            println!("Report written to: {}", path.display());
        }
        None => print!("{text}"),
    }

    Ok(())
}
