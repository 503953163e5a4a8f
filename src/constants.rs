// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "app.log";
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const TRACKS_SUBDIR: &str = "tracks";
pub const AUDIT_FILE_NAME: &str = "downloads.log";
pub const LOGBOOK_EXTENSION: &str = "dat";
pub const DEFAULT_PILOT_PAUSE_SECS: u64 = 10;
pub const DEFAULT_ELEMENT_TIMEOUT_SECS: u64 = 10;
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

pub mod site {
    pub const BASE_URL: &str = "https://www.xcontest.org";
    pub const PILOT_URL_TEMPLATE: &str = "{base}/world/en/pilots/detail:{pilot}";
    pub const TRACK_LINK_TEXT: &str = "IGC";
    pub const DOWNLOAD_MIME_TYPES: [&str; 3] =
        ["application/x-igc", "application/octet-stream", "text/plain"];

    /// 飞行员年度航班列表
    pub mod listing {
        pub const CONTAINER_CLASS: &str = "XCslotPilotFlights";
        pub const LINK_CLASS: &str = "detail";
        pub const LINK_TITLE: &str = "flight detail";
        pub const YEAR_SELECT: &str = "select";
    }
}

pub mod download {
    pub const TRACK_EXTENSION: &str = "igc";
    pub const IN_PROGRESS_SUFFIX: &str = ".part";
    pub const FILENAME_TIME_FORMAT: &str = "%Y_%m_%d_%H_%M";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
    pub const DEFAULT_SETTLE_MS: u64 = 1000;
}

pub mod format {
    pub const DISPLAYED_DATETIME: &str = "%d.%m.%Y %H:%M";
    pub const LOGBOOK_DATETIME: &str = "%d/%m/%Y %H:%M";
    pub const UTC_SUFFIX: &str = "=UTC";
}
