/// Player sprite: a small text-art picture loaded off the frame thread.
///
/// File format: plain UTF-8 text, one row per line. Spaces are transparent.
/// The picture is stretched over the player's bounding box, so any size
/// works; something close to the player's 3:4 aspect looks best.
///
/// The loader thread sends exactly one result over a channel. Until it
/// arrives (or if loading failed) the renderer draws a placeholder block.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("could not read sprite {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sprite {} has no visible characters", path.display())]
    Empty { path: PathBuf },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    rows: Vec<Vec<char>>,
    width: usize,
}

impl Sprite {
    pub fn parse(text: &str) -> Option<Sprite> {
        let mut rows: Vec<Vec<char>> = text
            .lines()
            .map(|l| l.trim_end().chars().collect())
            .collect();
        while rows.last().map_or(false, |r| r.is_empty()) {
            rows.pop();
        }
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let visible = rows.iter().flatten().any(|c| !c.is_whitespace());
        if !visible {
            return None;
        }
        Some(Sprite { rows, width })
    }

    /// Character at normalized coordinates `u, v ∈ [0, 1)`.
    /// `None` means transparent.
    pub fn sample(&self, u: f32, v: f32) -> Option<char> {
        let h = self.rows.len();
        let col = ((u.clamp(0.0, 0.9999)) * self.width as f32) as usize;
        let row = ((v.clamp(0.0, 0.9999)) * h as f32) as usize;
        let ch = *self.rows.get(row)?.get(col)?;
        if ch.is_whitespace() { None } else { Some(ch) }
    }
}

pub fn read_sprite(path: &Path) -> Result<Sprite, SpriteError> {
    let text = std::fs::read_to_string(path).map_err(|source| SpriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Sprite::parse(&text).ok_or_else(|| SpriteError::Empty { path: path.to_path_buf() })
}

enum LoadState {
    Pending(Receiver<Result<Sprite, SpriteError>>),
    Ready(Sprite),
    Failed,
}

pub struct SpriteAsset {
    state: LoadState,
}

impl SpriteAsset {
    /// Start loading in the background and return immediately.
    pub fn load(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("sprite-loader".into())
            .spawn(move || {
                let _ = tx.send(read_sprite(&path));
            });
        match spawned {
            Ok(_) => SpriteAsset { state: LoadState::Pending(rx) },
            Err(e) => {
                log::warn!("could not start sprite loader: {e}");
                SpriteAsset { state: LoadState::Failed }
            }
        }
    }

    /// Pick up the loader's result if it has arrived. Cheap; call every frame.
    pub fn poll(&mut self) {
        let LoadState::Pending(rx) = &self.state else { return };
        let next = match rx.try_recv() {
            Ok(Ok(sprite)) => {
                log::info!("player sprite loaded");
                LoadState::Ready(sprite)
            }
            Ok(Err(e)) => {
                log::warn!("{e}; drawing placeholder");
                LoadState::Failed
            }
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                log::warn!("sprite loader exited without a result");
                LoadState::Failed
            }
        };
        self.state = next;
    }

    /// Loading finished, successfully or not.
    pub fn is_complete(&self) -> bool {
        !matches!(self.state, LoadState::Pending(_))
    }

    pub fn get(&self) -> Option<&Sprite> {
        match &self.state {
            LoadState::Ready(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_complete(asset: &mut SpriteAsset) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !asset.is_complete() && Instant::now() < deadline {
            asset.poll();
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn parse_trims_trailing_blank_rows() {
        let s = Sprite::parse(" o \n/|\\\n/ \\\n\n\n").unwrap();
        assert_eq!(s.rows.len(), 3);
        assert_eq!(s.width, 3);
    }

    #[test]
    fn blank_text_is_not_a_sprite() {
        assert!(Sprite::parse("   \n  \n").is_none());
        assert!(Sprite::parse("").is_none());
    }

    #[test]
    fn sample_maps_corners() {
        let s = Sprite::parse("ab\ncd").unwrap();
        assert_eq!(s.sample(0.0, 0.0), Some('a'));
        assert_eq!(s.sample(0.99, 0.0), Some('b'));
        assert_eq!(s.sample(0.0, 0.99), Some('c'));
        assert_eq!(s.sample(1.0, 1.0), Some('d'));
    }

    #[test]
    fn spaces_and_short_rows_are_transparent() {
        let s = Sprite::parse("a b\nc").unwrap();
        assert_eq!(s.sample(0.5, 0.0), None);
        assert_eq!(s.sample(0.9, 0.9), None);
    }

    #[test]
    fn loads_in_background() {
        let path = std::env::temp_dir().join(format!("cheese-chase-sprite-{}.txt", std::process::id()));
        std::fs::write(&path, "[]\n||\n").unwrap();
        let mut asset = SpriteAsset::load(path.clone());
        wait_complete(&mut asset);
        assert!(asset.is_complete());
        assert_eq!(asset.get().and_then(|s| s.sample(0.0, 0.0)), Some('['));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_completes_without_sprite() {
        let mut asset = SpriteAsset::load(PathBuf::from("/nonexistent/cheese-chase/player.txt"));
        wait_complete(&mut asset);
        assert!(asset.is_complete());
        assert!(asset.get().is_none());
    }
}
