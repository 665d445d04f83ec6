pub const API_HELIX_URL: &str = "https://api.twitch.tv/helix";
pub const API_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

pub const SERVER_PORT: u16 = 3000;
pub const SERVICE_NAME: &str = "higher-lower-api";
pub const TRACER_NAME: &str = "higher-lower-tracer";

// HELIX REQUEST BOUNDS
//
// helix caps both `first` on /streams and the number of `id` params on /games at 100
pub const STREAMS_PAGE_SIZE: usize = 100;
pub const MAX_STREAM_PAGES: usize = 10;
pub const GAMES_BATCH_SIZE: usize = 100;
pub const MAX_CONCURRENT_BATCHES: usize = 4;
pub const TOP_GAMES_LIMIT: usize = 100;
pub const SPOTLIGHT_LIMIT: usize = 3;

// IMAGE TEMPLATE SIZES
pub const BOX_ART_WIDTH: u32 = 272;
pub const BOX_ART_HEIGHT: u32 = 380;
pub const THUMBNAIL_WIDTH: u32 = 400;
pub const THUMBNAIL_HEIGHT: u32 = 225;

/// Cached app tokens are refetched once they are within this many seconds of expiring
pub const TOKEN_REFRESH_MARGIN_SECS: u64 = 60;

pub const LEADERBOARD_SIZE: i64 = 10;
pub const NICKNAME_MAX_CHARS: usize = 32;
