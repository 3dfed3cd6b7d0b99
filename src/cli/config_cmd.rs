//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::audio::Bitrate;
use crate::domain::config::{AppConfig, ToolsConfig};
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;
    store.save(&config).await?;

    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let config = store.load().await?;
    presenter.output(get_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, get_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(invalid(
            key,
            format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        ))
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(invalid(key, "Value must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn positive<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|n| *n > T::default())
        .ok_or_else(|| invalid(key, "Value must be a positive whole number"))
}

/// Parse, validate and store one key
pub fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "output_directory" => config.output_directory = Some(non_empty(key, value)?),
        "drive" => config.drive = Some(non_empty(key, value)?),
        "bitrate" => {
            let bitrate: Bitrate = value.parse().map_err(|e| invalid(key, format!("{}", e)))?;
            config.bitrate = Some(bitrate.kbps());
        }
        "filename_template" => {
            let template = non_empty(key, value)?;
            if !template.contains("{track") {
                return Err(invalid(
                    key,
                    "Template must contain {track} or {track:02} so file names stay unique",
                ));
            }
            config.filename_template = Some(template);
        }
        "combined_filename" => {
            let name = non_empty(key, value)?;
            if name.contains(['/', '\\']) {
                return Err(invalid(key, "File name must not contain path separators"));
            }
            if name == "." || name == ".." {
                return Err(invalid(key, "File name must name a file"));
            }
            config.combined_filename = Some(name);
        }
        "genre" => config.genre = Some(non_empty(key, value)?),
        "artist" => config.artist = Some(value.trim().to_string()),
        "narrator" => config.narrator = Some(value.trim().to_string()),
        "encode_workers" => config.encode_workers = Some(positive::<usize>(key, value)?),
        "cancel_grace_secs" => config.cancel_grace_secs = Some(positive::<u64>(key, value)?),
        "tools.ffmpeg" => {
            config.tools.get_or_insert_with(ToolsConfig::default).ffmpeg =
                Some(non_empty(key, value)?)
        }
        "tools.ffprobe" => {
            config.tools.get_or_insert_with(ToolsConfig::default).ffprobe =
                Some(non_empty(key, value)?)
        }
        _ => {
            ensure_known_key(key)?;
            return Err(invalid(key, "Key cannot be set"));
        }
    }
    Ok(())
}

/// Current value of one key, if set
pub fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "output_directory" => config.output_directory.clone(),
        "drive" => config.drive.clone(),
        "bitrate" => config.bitrate.map(|b| b.to_string()),
        "filename_template" => config.filename_template.clone(),
        "combined_filename" => config.combined_filename.clone(),
        "genre" => config.genre.clone(),
        "artist" => config.artist.clone(),
        "narrator" => config.narrator.clone(),
        "encode_workers" => config.encode_workers.map(|n| n.to_string()),
        "cancel_grace_secs" => config.cancel_grace_secs.map(|n| n.to_string()),
        "tools.ffmpeg" => config.tools.as_ref().and_then(|t| t.ffmpeg.clone()),
        "tools.ffprobe" => config.tools.as_ref().and_then(|t| t.ffprobe.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(key: &str, value: &str) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::empty();
        set_value(&mut config, key, value)?;
        Ok(config)
    }

    #[test]
    fn bitrate_is_validated() {
        assert_eq!(set("bitrate", "128").unwrap().bitrate, Some(128));
        assert_eq!(set("bitrate", "256k").unwrap().bitrate, Some(256));
        assert!(set("bitrate", "100").is_err());
        assert!(set("bitrate", "loud").is_err());
    }

    #[test]
    fn workers_must_be_positive() {
        assert_eq!(set("encode_workers", "2").unwrap().encode_workers, Some(2));
        assert!(set("encode_workers", "0").is_err());
        assert!(set("encode_workers", "-1").is_err());
    }

    #[test]
    fn template_needs_track_placeholder() {
        assert!(set("filename_template", "{title}").is_err());
        assert!(set("filename_template", "{album} {track:02} {title}").is_ok());
    }

    #[test]
    fn combined_filename_rejects_paths() {
        assert!(set("combined_filename", "../book.mp3").is_err());
        assert!(set("combined_filename", "..").is_err());
        assert!(set("combined_filename", " . ").is_err());
        assert_eq!(
            set("combined_filename", "book.mp3").unwrap().combined_filename.as_deref(),
            Some("book.mp3")
        );
    }

    #[test]
    fn tool_keys_create_section() {
        let config = set("tools.ffmpeg", "/opt/bin/ffmpeg").unwrap();
        assert_eq!(config.ffmpeg_or_default(), "/opt/bin/ffmpeg");
        assert_eq!(get_value(&config, "tools.ffmpeg").as_deref(), Some("/opt/bin/ffmpeg"));
        assert_eq!(get_value(&config, "tools.ffprobe"), None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            set("api_key", "x"),
            Err(ConfigError::ValidationError { .. })
        ));
        assert!(ensure_known_key("api_key").is_err());
    }

    #[test]
    fn every_listed_key_round_trips() {
        let mut config = AppConfig::empty();
        let samples = [
            ("output_directory", "/srv/books"),
            ("drive", "E"),
            ("bitrate", "160"),
            ("filename_template", "{track} {title}"),
            ("combined_filename", "book.mp3"),
            ("genre", "Spoken Word"),
            ("artist", "Jane Author"),
            ("narrator", "Sam Reader"),
            ("encode_workers", "3"),
            ("cancel_grace_secs", "10"),
            ("tools.ffmpeg", "ffmpeg7"),
            ("tools.ffprobe", "ffprobe7"),
        ];
        assert_eq!(samples.len(), VALID_CONFIG_KEYS.len());

        for (key, value) in samples {
            set_value(&mut config, key, value).unwrap();
            assert_eq!(get_value(&config, key).as_deref(), Some(value), "{}", key);
        }
    }
}
