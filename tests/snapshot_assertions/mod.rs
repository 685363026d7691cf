//! Compare rendered SVGs against the files under `tests/snapshots`

use std::fs;
use std::path::Path;

use snapbox::Data;
use snapbox::data::DataFormat;

/// Snapshots are recorded on first run, or on every run with
/// `SNAPSHOTS=overwrite`. Otherwise the file must match.
pub fn assert_svg_snapshot(actual: String, snapshot_path: &Path) {
    let overwrite = std::env::var("SNAPSHOTS").is_ok_and(|v| v == "overwrite");
    if overwrite || !snapshot_path.exists() {
        if let Some(parent) = snapshot_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(snapshot_path, &actual).unwrap();
        return;
    }

    snapbox::assert_data_eq!(
        Data::text(actual),
        Data::read_from(snapshot_path, Some(DataFormat::Text))
    );
}
