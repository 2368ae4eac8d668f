use std::cmp::Ordering;

use crate::models::{ProviderResponse, TmdbVideo, TmdbWatchProvider};

pub const YOUTUBE_EMBED_BASE_URL: &str = "https://www.youtube.com/embed/";

/// Providers offered as discover filters, by TMDB display name
pub const POPULAR_PROVIDERS: &[&str] = &[
    "Netflix",
    "Disney Plus",
    "Amazon Prime Video",
    "Apple TV+",
    "Paramount Plus",
    "Hulu",
    "Curiosity Stream",
    "Crunchyroll",
    "Max",
];

/// Picks the video to embed: the largest official YouTube trailer, else the
/// largest YouTube trailer, else the largest YouTube featurette.
pub fn best_trailer(videos: &[TmdbVideo]) -> Option<&TmdbVideo> {
    let largest = |pred: &dyn Fn(&TmdbVideo) -> bool| {
        videos
            .iter()
            .filter(|video| video.site == "YouTube" && pred(video))
            // first of equally large videos wins
            .max_by(|a, b| a.size.cmp(&b.size).then(Ordering::Greater))
    };

    largest(&|video| video.video_type == "Trailer" && video.official)
        .or_else(|| largest(&|video| video.video_type == "Trailer"))
        .or_else(|| largest(&|video| video.video_type == "Featurette"))
}

pub fn trailer_url(video: &TmdbVideo) -> String {
    format!("{}{}", YOUTUBE_EMBED_BASE_URL, video.key)
}

/// Popular providers only, in TMDB display order
pub fn popular_providers(mut providers: Vec<TmdbWatchProvider>) -> Vec<ProviderResponse> {
    providers.retain(|provider| POPULAR_PROVIDERS.contains(&provider.provider_name.as_str()));
    providers.sort_by_key(|provider| provider.display_priority);
    providers.into_iter().map(ProviderResponse::from).collect()
}
