//! In-memory stand-ins for the page source and the encoder.

use pagecast_core::{CancelToken, FrameBuffer, FramePool, PagecastError, PixelFormat, PooledFrame, Result, SegmentParams};
use pagecast_media::{AssemblySettings, FrameSource, MediaEncoder};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Black pages with one white square in the middle.
pub struct MockSource {
    pub pages: usize,
    pub width: u32,
    pub height: u32,
    pub fail_page: Option<usize>,
    /// Number of `close` calls.
    pub closed: AtomicUsize,
    pool: FramePool,
}

impl MockSource {
    pub fn new(pages: usize, width: u32, height: u32) -> Self {
        Self {
            pages,
            width,
            height,
            fail_page: None,
            closed: AtomicUsize::new(0),
            pool: FramePool::new(64 * 1024 * 1024),
        }
    }
}

impl FrameSource for MockSource {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_dimensions(&self, _index: usize) -> Result<(u32, u32)> {
        Ok((self.width, self.height))
    }

    fn render_page(&self, index: usize, _dpi: u32) -> Result<PooledFrame> {
        if self.fail_page == Some(index) {
            return Err(PagecastError::Render {
                page: index,
                message: "corrupt page".into(),
            });
        }
        let mut frame = self.pool.checkout(self.width, self.height, PixelFormat::Rgba8);
        paint_page(&mut frame);
        Ok(frame)
    }

    fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Black background, centered white square half the page wide.
pub fn paint_page(frame: &mut FrameBuffer) {
    let (w, h) = (frame.width, frame.height);
    frame.fill_rect(0, 0, w, h, [0, 0, 0, 255]);
    frame.fill_rect(w / 4, h / 4, w / 2, h / 2, [255, 255, 255, 255]);
}

/// Records what it was asked to do and writes placeholder files.
#[derive(Default)]
pub struct MockEncoder {
    /// Fire the token after this many successful segments.
    pub cancel_after: Option<usize>,
    pub fail_page: Option<usize>,
    /// Write a partial output, then get interrupted during assembly.
    pub interrupt_assembly: bool,
    /// Filters this build reports as unavailable.
    pub missing_filters: Vec<&'static str>,
    pub encoded: AtomicUsize,
    pub filters: Mutex<Vec<(usize, String)>>,
    pub concatenated: Mutex<Option<(Vec<PathBuf>, AssemblySettings)>>,
}

impl MockEncoder {
    pub fn filter_for(&self, page: usize) -> Option<String> {
        self.filters
            .lock()
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, f)| f.clone())
    }
}

impl MediaEncoder for MockEncoder {
    fn encode_segment(&self, frame: &FrameBuffer, output: &Path, params: &SegmentParams, cancel: &CancelToken) -> Result<()> {
        cancel.check()?;
        if self.fail_page == Some(params.page_index) {
            return Err(PagecastError::Encode {
                page: params.page_index,
                message: "encoder exited with status 1".into(),
                stderr: None,
            });
        }
        assert_eq!(frame.data.len(), frame.format.frame_size(frame.width, frame.height));

        std::fs::write(output, format!("segment {}", params.page_index))?;
        self.filters.lock().push((params.page_index, params.filter.clone()));

        let done = self.encoded.fetch_add(1, Ordering::SeqCst) + 1;
        if self.cancel_after == Some(done) {
            cancel.cancel();
        }
        Ok(())
    }

    fn concatenate(
        &self,
        segments: &[PathBuf],
        output: &Path,
        _work_dir: &Path,
        settings: &AssemblySettings,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        if self.interrupt_assembly {
            std::fs::write(output, b"partial")?;
            cancel.cancel();
            return Err(PagecastError::Cancelled);
        }
        for segment in segments {
            assert!(segment.exists(), "segment {} missing", segment.display());
        }
        std::fs::write(output, b"video")?;
        *self.concatenated.lock() = Some((segments.to_vec(), settings.clone()));
        Ok(())
    }

    fn supports_filter(&self, name: &str) -> bool {
        !self.missing_filters.contains(&name)
    }
}
