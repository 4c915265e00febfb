//! Page sources.
//!
//! A [`FrameSource`] rasterizes page `i` into a pooled RGBA frame. The
//! pipeline only ever sees the trait; [`ImageSource`] serves a directory of
//! pre-rendered page images.

use pagecast_core::{FramePool, PagecastError, PixelFormat, PooledFrame, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rasterizes pages on demand. Shared across render workers.
pub trait FrameSource: Send + Sync {
    fn page_count(&self) -> usize;

    /// Native page size in pixels.
    fn page_dimensions(&self, index: usize) -> Result<(u32, u32)>;

    /// Render one page as RGBA8 at `dpi`.
    fn render_page(&self, index: usize, dpi: u32) -> Result<PooledFrame>;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Page images read from disk.
///
/// A directory yields its `.jpg`/`.jpeg`/`.png` files in name order; a
/// single file is a one-page source. Images are already rasterized, so the
/// requested DPI is ignored.
#[derive(Debug)]
pub struct ImageSource {
    paths: Vec<PathBuf>,
    pool: FramePool,
}

impl ImageSource {
    pub fn open(path: impl AsRef<Path>, pool: FramePool) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PagecastError::NotFound(format!(
                "Input not found: {}",
                path.display()
            )));
        }

        let paths = if path.is_dir() {
            let mut paths = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let p = entry?.path();
                if p.is_file() && is_page_image(&p) {
                    paths.push(p);
                }
            }
            paths.sort();
            paths
        } else {
            vec![path.to_path_buf()]
        };

        info!(source = %path.display(), pages = paths.len(), "Opened image source");
        Ok(Self { paths, pool })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn path(&self, index: usize) -> Result<&Path> {
        self.paths.get(index).map(PathBuf::as_path).ok_or_else(|| {
            PagecastError::NotFound(format!(
                "page {index} out of range (source has {})",
                self.paths.len()
            ))
        })
    }
}

impl FrameSource for ImageSource {
    fn page_count(&self) -> usize {
        self.paths.len()
    }

    fn page_dimensions(&self, index: usize) -> Result<(u32, u32)> {
        let path = self.path(index)?;
        image::image_dimensions(path)
            .map_err(|e| PagecastError::Image(format!("{}: {e}", path.display())))
    }

    fn render_page(&self, index: usize, dpi: u32) -> Result<PooledFrame> {
        let path = self.path(index)?;
        let img = image::open(path)
            .map_err(|e| PagecastError::Render {
                page: index,
                message: format!("{}: {e}", path.display()),
            })?
            .to_rgba8();

        let (width, height) = img.dimensions();
        let mut frame = self.pool.checkout(width, height, PixelFormat::Rgba8);
        if !frame.fill_from(img.as_raw()) {
            return Err(PagecastError::Render {
                page: index,
                message: format!("decoded size mismatch for {width}x{height}"),
            });
        }
        debug!(page = index, width, height, dpi, "Rendered page");
        Ok(frame)
    }
}
