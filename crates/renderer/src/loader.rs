use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use image::RgbaImage;

use crate::error::LoadError;
use crate::session::LoadTicket;

/// Extensions offered by the file dialog; decoding itself sniffs the format.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Width and height of the drawing surface, taken from the loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded RGBA8 bitmap, first row at the top.
#[derive(Debug, Clone)]
pub struct SourceImage {
    path: PathBuf,
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn from_rgba(path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        Self {
            path: path.into(),
            pixels,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }
}

/// Result of one background decode, tagged with the selection it belongs to.
#[derive(Debug)]
pub enum LoadOutcome {
    Decoded { generation: u64, image: SourceImage },
    Failed { generation: u64, error: LoadError },
}

impl LoadOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            LoadOutcome::Decoded { generation, .. } | LoadOutcome::Failed { generation, .. } => {
                *generation
            }
        }
    }
}

/// Decodes an image file into RGBA8 on the calling thread.
pub fn decode(path: &Path) -> Result<SourceImage, LoadError> {
    let decoded = image::open(path).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let pixels = decoded.to_rgba8();
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(SourceImage::from_rgba(path, pixels))
}

/// Decodes the ticket's file on a worker thread and hands the outcome to
/// `notify` once, from that thread.
pub fn spawn_decode<F>(ticket: LoadTicket, notify: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce(LoadOutcome) + Send + 'static,
{
    thread::Builder::new()
        .name(format!("cellmosaic-decode-{}", ticket.generation))
        .spawn(move || {
            let LoadTicket { generation, path } = ticket;
            let outcome = match decode(&path) {
                Ok(image) => {
                    tracing::debug!(
                        generation,
                        path = %path.display(),
                        viewport = %image.viewport(),
                        "decoded image"
                    );
                    LoadOutcome::Decoded { generation, image }
                }
                Err(error) => LoadOutcome::Failed { generation, error },
            };
            notify(outcome);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use image::Rgba;
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 7, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn decode_reports_viewport_and_rows_top_first() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "ramp.png", 3, 2);
        let image = decode(&path).unwrap();
        assert_eq!(
            image.viewport(),
            Viewport {
                width: 3,
                height: 2
            }
        );
        assert_eq!(image.path(), path.as_path());
        assert_eq!(image.pixels().get_pixel(2, 0), &Rgba([2, 0, 7, 255]));
        assert_eq!(image.pixels().get_pixel(0, 1), &Rgba([0, 1, 7, 255]));
    }

    #[test]
    fn decode_rejects_non_images() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        match decode(&path) {
            Err(LoadError::Decode { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn decode_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        let err = decode(&dir.path().join("missing.png")).unwrap_err();
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn spawn_decode_tags_outcome_with_generation() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "tile.png", 4, 4);
        let (tx, rx) = bounded(1);
        let handle = spawn_decode(
            LoadTicket {
                generation: 7,
                path,
            },
            move |outcome| {
                tx.send(outcome).unwrap();
            },
        )
        .unwrap();
        handle.join().unwrap();

        match rx.recv().unwrap() {
            LoadOutcome::Decoded { generation, image } => {
                assert_eq!(generation, 7);
                assert_eq!(image.viewport().width, 4);
            }
            LoadOutcome::Failed { error, .. } => panic!("decode failed: {error}"),
        }
    }

    #[test]
    fn spawn_decode_delivers_failures() {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = bounded(1);
        spawn_decode(
            LoadTicket {
                generation: 3,
                path: dir.path().join("gone.jpg"),
            },
            move |outcome| {
                tx.send(outcome).unwrap();
            },
        )
        .unwrap()
        .join()
        .unwrap();

        let outcome = rx.recv().unwrap();
        assert_eq!(outcome.generation(), 3);
        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
    }
}
