//! Output file naming

use super::AudiobookMetadata;

/// Default per-track file name template
pub const DEFAULT_FILENAME_TEMPLATE: &str = "{track:02} - {title}";

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Remove characters that are not allowed in file names
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Template for per-track output file names.
///
/// Placeholders: `{track}`, `{track:02}`, `{title}`, `{album}`, `{artist}`.
/// Unknown placeholders are left as written. The `.mp3` extension is
/// appended by [`FilenameTemplate::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    template: String,
}

impl FilenameTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render the file name for one track
    pub fn render(&self, track: u32, metadata: &AudiobookMetadata) -> String {
        let mut title = sanitize_title(&metadata.title);
        if title.is_empty() {
            title = format!("Track {:02}", track);
        }

        let name = self
            .template
            .replace("{track:02}", &format!("{:02}", track))
            .replace("{track}", &track.to_string())
            .replace("{title}", &title)
            .replace("{album}", &sanitize_title(&metadata.album))
            .replace("{artist}", &sanitize_title(&metadata.artist));

        let name = sanitize_title(&name);
        let name = if name.is_empty() {
            format!("Track {:02}", track)
        } else {
            name
        };

        format!("{}.mp3", name)
    }
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_FILENAME_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(title: &str) -> AudiobookMetadata {
        AudiobookMetadata {
            title: title.to_string(),
            album: "The Book".to_string(),
            artist: "A. Author".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn sanitize_strips_forbidden() {
        assert_eq!(sanitize_title("What? Now: \"Yes\"/No*"), "What Now YesNo");
        assert_eq!(sanitize_title("  plain  "), "plain");
    }

    #[test]
    fn default_template() {
        let name = FilenameTemplate::default().render(3, &meta("Chapter Three"));
        assert_eq!(name, "03 - Chapter Three.mp3");
    }

    #[test]
    fn empty_title_falls_back_to_track_label() {
        let name = FilenameTemplate::default().render(7, &meta("???"));
        assert_eq!(name, "07 - Track 07.mp3");
    }

    #[test]
    fn custom_placeholders() {
        let template = FilenameTemplate::new("{album} - {track} - {artist}");
        assert_eq!(
            template.render(12, &meta("x")),
            "The Book - 12 - A. Author.mp3"
        );
    }

    #[test]
    fn separators_in_template_are_removed() {
        let template = FilenameTemplate::new("{album}/{title}");
        assert_eq!(template.render(1, &meta("One")), "The BookOne.mp3");
    }
}
