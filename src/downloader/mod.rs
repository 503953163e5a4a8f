// src/downloader/mod.rs

mod audit;
mod naming;
mod track;

pub use audit::AuditLog;
pub use naming::{candidate_path, looks_like_track_url};
pub use track::TrackDownloader;
