//! Annotated copies of analysed photos
//!
//! Each detection gets a coloured box with its Russian label, and a dark panel
//! in the top-right corner carries the violation count and verdict. Text needs a
//! TrueType font with Cyrillic glyphs; without one only boxes and the status
//! bar are drawn.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::debug;

use crate::domain::PhotoVerdict;
use crate::errors::{PermitError, Result};

use super::{display_label, Detection};

/// Looked up in order when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOX_THICKNESS: i32 = 3;
const PANEL_WIDTH: u32 = 450;
const PANEL_HEIGHT: u32 = 120;
const PANEL_MARGIN: i32 = 10;
const STATUS_BAR_HEIGHT: u32 = 8;

const VIOLATION: Rgb<u8> = Rgb([255, 0, 0]);
const PERSON: Rgb<u8> = Rgb([0, 102, 255]);
const OTHER: Rgb<u8> = Rgb([128, 128, 128]);
const PASS: Rgb<u8> = Rgb([0, 200, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const CYAN: Rgb<u8> = Rgb([0, 255, 255]);

/// Writes annotated PNG copies of evidence photos into one directory
pub struct Annotator {
    dir: PathBuf,
    violation_prefix: String,
    font: Option<FontVec>,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("dir", &self.dir)
            .field("violation_prefix", &self.violation_prefix)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl Annotator {
    /// Annotator using the first system font found, if any.
    pub fn new(dir: impl Into<PathBuf>, violation_prefix: impl Into<String>) -> Self {
        let font = SYSTEM_FONTS
            .iter()
            .find_map(|path| load_font(Path::new(path)).ok());
        Annotator {
            dir: dir.into(),
            violation_prefix: violation_prefix.into(),
            font,
        }
    }

    /// Use this font file for labels.
    ///
    /// # Errors
    /// * `ConfigError` - If the file cannot be read or is not a font
    pub fn with_font_file(mut self, path: &Path) -> Result<Self> {
        self.font = Some(load_font(path)?);
        Ok(self)
    }

    /// Draw boxes only
    pub fn without_text(mut self) -> Self {
        self.font = None;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `<name>.png` with the detections and verdict drawn on `image`.
    ///
    /// The copy is assembled in a temporary file inside the output directory
    /// and only renamed into place once fully written; on any error nothing is
    /// left behind.
    ///
    /// # Errors
    /// * `Annotation` - If the photo cannot be decoded or the copy encoded
    /// * `Io` - If the output directory is not writable
    pub fn annotate(
        &self,
        image: &[u8],
        detections: &[Detection],
        verdict: &PhotoVerdict,
        name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let mut scratch = tempfile::Builder::new()
            .prefix(".annotating-")
            .suffix(".png")
            .tempfile_in(&self.dir)?;

        let mut canvas = image::load_from_memory(image)
            .map_err(|e| PermitError::Annotation(format!("cannot decode photo: {}", e)))?
            .to_rgb8();

        for detection in detections {
            self.draw_detection(&mut canvas, detection);
        }
        self.draw_panel(&mut canvas, detections, verdict);

        {
            let mut writer = BufWriter::new(scratch.as_file_mut());
            DynamicImage::ImageRgb8(canvas)
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| PermitError::Annotation(format!("cannot encode PNG: {}", e)))?;
            writer.flush()?;
        }

        let target = self.dir.join(format!("{}.png", file_stem(name)));
        scratch.persist(&target).map_err(|e| PermitError::Io(e.error))?;
        debug!(path = %target.display(), "annotated copy written");
        Ok(target)
    }

    fn color_for(&self, detection: &Detection) -> Rgb<u8> {
        if detection.is_violation(&self.violation_prefix) {
            VIOLATION
        } else if detection.label == "person" {
            PERSON
        } else {
            OTHER
        }
    }

    fn draw_detection(&self, canvas: &mut RgbImage, detection: &Detection) {
        let color = self.color_for(detection);
        let [x1, y1, x2, y2] = detection.bbox;
        for inset in 0..BOX_THICKNESS {
            if let Some(rect) = clamp_rect(canvas, x1 + inset, y1 + inset, x2 - inset, y2 - inset) {
                draw_hollow_rect_mut(canvas, rect, color);
            }
        }

        let Some(font) = &self.font else {
            return;
        };
        let label = format!(
            "{}: {:.2}",
            display_label(&detection.label),
            detection.confidence
        );
        let scale = PxScale::from(16.0);
        let (width, height) = imageproc::drawing::text_size(scale, font, &label);
        let top = (y1 - height as i32 - 10).max(0);
        let (right, bottom) = (x1 + width as i32 + 10, top + height as i32 + 10);
        if let Some(rect) = clamp_rect(canvas, x1, top, right, bottom) {
            draw_filled_rect_mut(canvas, rect, color);
            draw_text_mut(canvas, WHITE, rect.left() + 5, rect.top() + 5, scale, font, &label);
        }
    }

    fn draw_panel(
        &self,
        canvas: &mut RgbImage,
        detections: &[Detection],
        verdict: &PhotoVerdict,
    ) {
        let width = PANEL_WIDTH.min(canvas.width());
        let height = PANEL_HEIGHT.min(canvas.height());
        let left = (canvas.width() as i32 - width as i32 - PANEL_MARGIN).max(0);
        let top = PANEL_MARGIN.min(canvas.height() as i32 - height as i32).max(0);

        let Some(panel) =
            clamp_rect(canvas, left, top, left + width as i32, top + height as i32)
        else {
            return;
        };
        draw_filled_rect_mut(canvas, panel, BLACK);
        draw_hollow_rect_mut(canvas, panel, WHITE);

        let status = match verdict {
            PhotoVerdict::Pass => PASS,
            PhotoVerdict::Fail { .. } => VIOLATION,
            PhotoVerdict::Inconclusive { .. } => OTHER,
        };
        let bar_bottom = panel.bottom().min(panel.top() + STATUS_BAR_HEIGHT as i32);
        let bar = clamp_rect(canvas, panel.left() + 1, panel.top() + 1, panel.right(), bar_bottom);
        if let Some(bar) = bar {
            draw_filled_rect_mut(canvas, bar, status);
        }

        let Some(font) = &self.font else {
            return;
        };
        let violations = detections
            .iter()
            .filter(|d| d.is_violation(&self.violation_prefix))
            .count();
        let x = panel.left() + 10;
        let lines = [
            ("АНАЛИЗ БЕЗОПАСНОСТИ".to_string(), CYAN, 16.0),
            (format!("Нарушений: {}", violations), WHITE, 12.0),
            (format!("Статус: {}", verdict.status_text()), status, 12.0),
            ("Автоматическая проверка СИЗ".to_string(), CYAN, 12.0),
        ];
        let mut y = panel.top() + 15;
        for (text, color, size) in lines {
            if y >= panel.bottom() {
                break;
            }
            draw_text_mut(canvas, color, x, y, PxScale::from(size), font, &text);
            y += 22;
        }
    }
}

fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path).map_err(|e| {
        PermitError::ConfigError(format!("cannot read font {}: {}", path.display(), e))
    })?;
    FontVec::try_from_vec(bytes)
        .map_err(|_| PermitError::ConfigError(format!("not a font file: {}", path.display())))
}

/// Clip `[x1, y1, x2, y2]` to the canvas; `None` when nothing is left.
fn clamp_rect(canvas: &RgbImage, x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Rect> {
    let max_x = canvas.width() as i32 - 1;
    let max_y = canvas.height() as i32 - 1;
    if max_x < 0 || max_y < 0 {
        return None;
    }
    let (left, right) = (x1.min(x2).clamp(0, max_x), x1.max(x2).clamp(0, max_x));
    let (top, bottom) = (y1.min(y2).clamp(0, max_y), y1.max(y2).clamp(0, max_y));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32))
}

/// File-system safe name for an annotated copy
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Encoded single-colour PNG for tests
#[cfg(test)]
pub(crate) fn blank_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 200, 200]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn detection(label: &str, bbox: [i32; 4]) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            bbox,
        }
    }

    fn entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .map(|rd| rd.map(|e| e.unwrap().path()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_fail_photo_gets_annotated_copy() {
        let temp = TempDir::new().unwrap();
        let annotator = Annotator::new(temp.path().join("out"), "NO-").without_text();
        let found = vec![
            detection("person", [5, 150, 60, 190]),
            detection("NO-Hardhat", [100, 140, 180, 195]),
        ];
        let verdict = PhotoVerdict::Fail {
            violations: vec!["NO-Hardhat".to_string()],
        };

        let path = annotator
            .annotate(&blank_png(640, 200), &found, &verdict, "P-1/start 1")
            .unwrap();

        assert_eq!(path, temp.path().join("out").join("P-1_start_1.png"));
        assert_eq!(entries(annotator.dir()), vec![path.clone()]);

        let drawn = image::open(&path).unwrap().to_rgb8();
        assert_eq!(drawn.dimensions(), (640, 200));
        // Box outlines
        assert_eq!(*drawn.get_pixel(100, 170), VIOLATION);
        assert_eq!(*drawn.get_pixel(5, 170), PERSON);
        // Status bar inside the top-right panel
        assert_eq!(*drawn.get_pixel(640 - 10 - 200, 10 + 4), VIOLATION);
        // Untouched background
        assert_eq!(*drawn.get_pixel(50, 100), Rgb([200, 200, 200]));
    }

    #[test]
    fn test_pass_photo_has_green_status() {
        let temp = TempDir::new().unwrap();
        let annotator = Annotator::new(temp.path(), "NO-").without_text();

        let path = annotator
            .annotate(&blank_png(500, 150), &[], &PhotoVerdict::Pass, "ok")
            .unwrap();

        let drawn = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*drawn.get_pixel(500 - 10 - 100, 10 + 4), PASS);
    }

    #[test]
    fn test_undecodable_photo_leaves_nothing_behind() {
        let temp = TempDir::new().unwrap();
        let annotator = Annotator::new(temp.path().join("out"), "NO-");
        let verdict = PhotoVerdict::Fail {
            violations: vec!["NO-Mask".to_string()],
        };

        let err = annotator
            .annotate(b"not an image", &[detection("NO-Mask", [0, 0, 5, 5])], &verdict, "bad")
            .unwrap_err();

        assert!(matches!(err, PermitError::Annotation(_)));
        assert!(entries(annotator.dir()).is_empty());
    }

    #[test]
    fn test_boxes_outside_the_image_are_clipped() {
        let temp = TempDir::new().unwrap();
        let annotator = Annotator::new(temp.path(), "NO-").without_text();
        let found = vec![
            detection("NO-Hardhat", [-50, -50, 5000, 5000]),
            detection("NO-Mask", [900, 900, 950, 950]),
        ];
        let verdict = PhotoVerdict::Fail {
            violations: vec!["NO-Hardhat".to_string(), "NO-Mask".to_string()],
        };

        assert!(annotator
            .annotate(&blank_png(32, 24), &found, &verdict, "tiny")
            .is_ok());
    }

    #[test]
    fn test_missing_font_file_is_config_error() {
        let err = Annotator::new("out", "NO-")
            .with_font_file(Path::new("/no/such/font.ttf"))
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("P-100-start-01"), "P-100-start-01");
        assert_eq!(file_stem("../x y"), "___x_y");
    }
}
