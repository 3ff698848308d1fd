// Screenshot functionality
//
// Saves converted frames as RGBA PNG files.

use crate::framebuffer::LinearFrame;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur during screenshot operations
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),
}

/// Save a screenshot of a converted frame
///
/// # Arguments
/// * `frame` - Frame to save
/// * `directory` - Screenshot directory, created if missing
/// * `include_timestamp` - Name the file after the local time instead of a counter
///
/// # Returns
/// Path of the written file
pub fn save_screenshot(
    frame: &LinearFrame,
    directory: &Path,
    include_timestamp: bool,
) -> Result<PathBuf, ScreenshotError> {
    fs::create_dir_all(directory)?;

    let file_path = if include_timestamp {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        directory.join(format!("screenshot_{}.png", timestamp))
    } else {
        next_numbered_path(directory)
    };

    save_png(&file_path, frame)?;

    Ok(file_path)
}

/// First `screenshot_NNNN.png` in `directory` that does not exist yet
fn next_numbered_path(directory: &Path) -> PathBuf {
    (0u32..)
        .map(|n| directory.join(format!("screenshot_{:04}.png", n)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| directory.join("screenshot.png"))
}

/// Write a frame as an 8-bit RGBA PNG
pub fn save_png(path: &Path, frame: &LinearFrame) -> Result<(), ScreenshotError> {
    let file = fs::File::create(path)?;
    let w = io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, frame.width(), frame.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame.to_rgba())?;
    writer.finish()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detile::Resolution;
    use crate::framebuffer::argb;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("xenos_fb_shots_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_png_contents() {
        let dir = temp_dir("contents");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");

        let mut frame = LinearFrame::new(Resolution::new(4, 2), argb(0xFF, 30, 30, 30));
        frame.set(1, 0, argb(0x80, 0x10, 0x20, 0x30));
        save_png(&path, &frame).unwrap();

        let decoder = png::Decoder::new(io::BufReader::new(fs::File::open(&path).unwrap()));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0u8; 4 * 2 * 4];
        let info = reader.next_frame(&mut buf).unwrap();

        assert_eq!((info.width, info.height), (4, 2));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        assert_eq!(&buf[0..4], &[30, 30, 30, 0xFF]);
        assert_eq!(&buf[4..8], &[0x10, 0x20, 0x30, 0x80]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_numbered_screenshots() {
        let dir = temp_dir("numbered");
        fs::remove_dir_all(&dir).ok();
        let frame = LinearFrame::new(Resolution::new(2, 2), 0xFF00_0000);

        let first = save_screenshot(&frame, &dir, false).unwrap();
        let second = save_screenshot(&frame, &dir, false).unwrap();

        assert!(first.ends_with("screenshot_0000.png"));
        assert!(second.ends_with("screenshot_0001.png"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_timestamped_screenshot() {
        let dir = temp_dir("timestamped");
        let frame = LinearFrame::new(Resolution::new(2, 2), 0xFF00_0000);

        let path = save_screenshot(&frame, &dir, true).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".png"));
        assert!(path.exists());
        fs::remove_dir_all(&dir).ok();
    }
}
