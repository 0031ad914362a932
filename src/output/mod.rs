use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptResult;

/// Render a transcript in the requested format
pub fn render(result: &TranscriptResult, format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => result.transcript.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
    };
    Ok(content)
}

/// Save transcript to file
pub fn save_to_file(result: &TranscriptResult, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcript to console
pub fn print_to_console(result: &TranscriptResult, format: &OutputFormat) -> Result<()> {
    println!("{}", render(result, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::VideoId;

    fn sample() -> TranscriptResult {
        TranscriptResult {
            video_id: VideoId::new("dQw4w9WgXcQ"),
            language: "en".to_string(),
            is_generated: true,
            transcript: "hello world".to_string(),
        }
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render(&sample(), &OutputFormat::Text).unwrap(), "hello world");
    }

    #[test]
    fn test_render_json_uses_wire_field_names() {
        let json: serde_json::Value =
            serde_json::from_str(&render(&sample(), &OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["video_id"], "dQw4w9WgXcQ");
        assert_eq!(json["language"], "en");
        assert_eq!(json["is_generated"], true);
        assert_eq!(json["transcript"], "hello world");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        save_to_file(&sample(), &path, &OutputFormat::Text).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
    }
}
