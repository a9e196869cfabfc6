//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used throughout
//! the engine, providing a single source of truth for constant values.

/// Configuration file locations
pub mod config {
    /// Directory under the platform config/data dirs
    pub const APP_DIR: &str = "dashgrid";

    /// Config file name
    pub const FILENAME: &str = "config.json";

    /// Env var holding the bearer token unless overridden in config
    pub const DEFAULT_TOKEN_ENV: &str = "DASHGRID_TOKEN";

    /// Env var overriding the remote layout endpoint
    pub const ENV_LAYOUT_URL: &str = "DASHGRID_LAYOUT_URL";

    /// Env var overriding the remote capability endpoint
    pub const ENV_CAPABILITIES_URL: &str = "DASHGRID_CAPABILITIES_URL";

    /// Env var overriding the fallback store directory
    pub const ENV_STORAGE_DIR: &str = "DASHGRID_STORAGE_DIR";
}

/// Local fallback store
pub mod storage {
    /// Single named key holding the serialized layout
    pub const LAYOUT_KEY: &str = "dashboard-layout";

    /// Extension appended to the key when stored as a file
    pub const FILE_EXTENSION: &str = "json";

    /// Save reports held for the host before newer ones are dropped
    pub const REPORT_BACKLOG: usize = 64;
}

/// Remote service constants
pub mod remote {
    /// Connect timeout for remote calls
    pub const CONNECT_TIMEOUT_SECS: u64 = 2;

    /// Default total request timeout
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Upper bound accepted from config
    pub const MAX_TIMEOUT_SECS: u64 = 120;
}

/// Grid quantization constants
pub mod grid {
    /// Smallest span a widget may occupy in either axis
    pub const MIN_SPAN: u32 = 1;

    /// Width and height of a synthesized placement (cells)
    pub const SYNTH_SPAN: u32 = 3;

    /// Widgets per synthesized row
    pub const SYNTH_PER_ROW: u32 = 4;

    /// Row stride of a synthesized placement (cells)
    pub const SYNTH_ROW_STRIDE: u32 = 4;

    /// Default row height in pixels
    pub const DEFAULT_ROW_HEIGHT: u32 = 30;

    /// Default horizontal/vertical margin between items in pixels
    pub const DEFAULT_MARGIN: [u32; 2] = [10, 10];

    /// Default container padding in pixels
    pub const DEFAULT_CONTAINER_PADDING: [u32; 2] = [10, 10];
}

/// Freeform editor constants
pub mod freeform {
    pub const DEFAULT_MIN_WIDTH: u32 = 120;
    pub const DEFAULT_MIN_HEIGHT: u32 = 80;
    pub const DEFAULT_MAX_WIDTH: u32 = 1600;
    pub const DEFAULT_MAX_HEIGHT: u32 = 1200;
}

/// Validation bounds applied to loaded config values
pub mod validation {
    /// Largest column count a breakpoint may declare
    pub const MAX_COLUMNS: u32 = 48;

    /// Largest row height in pixels
    pub const MAX_ROW_HEIGHT: u32 = 500;
}

/// Tracking cause tags
pub mod cause {
    pub const DRAG: &str = "drag";
    pub const RESIZE: &str = "resize";
    pub const INITIAL: &str = "initial";
    pub const LAYOUT_CHANGE: &str = "layout-change";
}
