//! Audiobook metadata value object

/// Genre written when none is configured
pub const DEFAULT_GENRE: &str = "Audiobook";

/// Embedded cover image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl CoverArt {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Guess the MIME type from a file extension, defaulting to JPEG
    pub fn mime_for_extension(ext: &str) -> &'static str {
        match ext.to_ascii_lowercase().as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "image/jpeg",
        }
    }
}

/// Tag fields for one output file.
///
/// `artist` holds the author and `album` the book title; the narrator is
/// stored as album artist and the series as content group by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudiobookMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track_number: u32,
    pub total_tracks: u32,
    pub year: Option<i32>,
    pub genre: String,
    pub narrator: String,
    pub series: String,
    pub series_number: String,
    pub disc_number: Option<u32>,
    pub total_discs: Option<u32>,
    pub cover_art: Option<CoverArt>,
}

impl Default for AudiobookMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            track_number: 0,
            total_tracks: 0,
            year: None,
            genre: DEFAULT_GENRE.to_string(),
            narrator: String::new(),
            series: String::new(),
            series_number: String::new(),
            disc_number: None,
            total_discs: None,
            cover_art: None,
        }
    }
}

impl AudiobookMetadata {
    /// Metadata carrying only a track number
    pub fn for_track(track_number: u32) -> Self {
        Self {
            track_number,
            ..Default::default()
        }
    }

    /// TRCK value: "n/total" or "n"
    pub fn track_label(&self) -> Option<String> {
        match (self.track_number, self.total_tracks) {
            (0, _) => None,
            (n, 0) => Some(n.to_string()),
            (n, total) => Some(format!("{}/{}", n, total)),
        }
    }

    /// Content group value: "Series #3" or "Series"
    pub fn series_label(&self) -> Option<String> {
        if self.series.is_empty() {
            return None;
        }
        if self.series_number.is_empty() {
            Some(self.series.clone())
        } else {
            Some(format!("{} #{}", self.series, self.series_number))
        }
    }

    /// TPOS value: "disc/total" or "disc"
    pub fn disc_label(&self) -> Option<String> {
        match (self.disc_number, self.total_discs) {
            (Some(d), Some(t)) if d > 0 => Some(format!("{}/{}", d, t)),
            (Some(d), _) if d > 0 => Some(d.to_string()),
            _ => None,
        }
    }

    /// Metadata for a single file holding the whole disc: the disc
    /// number stands in for the track number.
    pub fn for_combined_file(&self, title: Option<&str>) -> Self {
        let mut combined = self.clone();
        combined.track_number = self.disc_number.unwrap_or(1);
        combined.total_tracks = self.total_discs.unwrap_or(1);
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            combined.title = title.to_string();
        }
        combined
    }
}
