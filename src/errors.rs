use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum GcStatsError {
    #[error("No benchmark root at {path}")]
    RootNotFound { path: PathBuf },

    #[error("No benchmark runs under {path} (looked for a '{logs_dir}' directory)")]
    NoRunsFound { path: PathBuf, logs_dir: String },

    #[error("No GC summary lines matched in any log of run '{run}'")]
    NoPauseData { run: String },

    #[error("No lifetime rows in {path}")]
    EmptyTable { path: PathBuf },

    #[error("No group reaches {min_objects} objects (largest has {largest})")]
    BelowThreshold { min_objects: usize, largest: usize },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    #[error("Failed to render plot {path}: {detail}")]
    Plot { path: PathBuf, detail: String },
}
