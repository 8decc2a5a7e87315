//! SVG flamegraph generation using the inferno library.

use crate::utils::config::DEFAULT_FLAMEGRAPH_WIDTH;
use crate::utils::error::FlamegraphError;
use inferno::flamegraph::{self, Options};
use log::info;

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    pub title: String,
    pub width: usize,
    /// Unit shown in frame tooltips
    pub count_name: String,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            title: "CPU Usage flame graph".to_string(),
            width: DEFAULT_FLAMEGRAPH_WIDTH,
            count_name: "samples".to_string(),
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

/// Generate SVG flamegraph from collapsed stack lines
///
/// **Public** - main entry point for flamegraph rendering
///
/// # Arguments
/// * `lines` - "frame;frame;frame count" lines
/// * `config` - Title and size, defaults when None
///
/// # Errors
/// * `FlamegraphError::EmptyStacks` - nothing to draw
/// * `FlamegraphError::GenerationFailed` - inferno rejected the input
pub fn generate_flamegraph(lines: &[String], config: Option<&FlamegraphConfig>) -> Result<String, FlamegraphError> {
    if lines.is_empty() {
        return Err(FlamegraphError::EmptyStacks);
    }

    let config = config.cloned().unwrap_or_default();
    info!("Generating flamegraph with {} stacks", lines.len());

    let mut options = Options::default();
    options.title = config.title;
    options.image_width = Some(config.width);
    options.count_name = config.count_name;

    let mut svg = Vec::new();
    flamegraph::from_lines(&mut options, lines.iter().map(String::as_str), &mut svg)
        .map_err(|e| FlamegraphError::GenerationFailed(e.to_string()))?;

    Ok(String::from_utf8(svg)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            generate_flamegraph(&[], None),
            Err(FlamegraphError::EmptyStacks)
        ));
    }

    #[test]
    fn test_generates_svg_with_title() {
        let lines = vec![
            "app.exe_1_9;root;mid;leaf 3".to_string(),
            "app.exe_1_9;root;other 1".to_string(),
        ];
        let config = FlamegraphConfig::new().with_title("CPU Usage flame graph of app.exe_1_9");
        let svg = generate_flamegraph(&lines, Some(&config)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("CPU Usage flame graph of app.exe_1_9"));
    }
}
