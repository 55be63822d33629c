use crate::error::{ImportError, Result};
use crate::models::StationKey;

/// Resolve the station encoded in a data filename (e.g., Texas_Austin.txt -> AUSTIN, Texas)
///
/// The extension is dropped, the stem is split on `_`, the first segment becomes the
/// capitalized state and the rest, rejoined, becomes the uppercased station name.
///
/// # Examples
/// ```
/// use weather_loader::readers::resolve_station;
///
/// let key = resolve_station("texas_round_rock.txt").unwrap();
/// assert_eq!(key.state, "Texas");
/// assert_eq!(key.name, "ROUND_ROCK");
/// ```
pub fn resolve_station(filename: &str) -> Result<StationKey> {
    let stem = match filename.rfind('.') {
        Some(pos) if pos > 0 => &filename[..pos],
        _ => filename,
    };

    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 2 {
        return Err(ImportError::MalformedFilename {
            filename: filename.to_string(),
        });
    }

    let state = capitalize(parts[0]);
    let name = parts[1..].join("_").to_uppercase();

    Ok(StationKey::new(name, state))
}

/// First character uppercased, the rest lowercased
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
