//! Content pipeline kinds and their directory contract.

/// Extensions handled by the image pipeline.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpeg", "jpg", "gif", "svg"];

/// One of the four content pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineKind {
    /// Templated HTML pages
    Html,
    /// Sass stylesheets
    Styles,
    /// JavaScript sources
    Scripts,
    /// Raster and vector images
    Images,
}

impl PipelineKind {
    /// All content pipelines, in reporting order.
    pub const ALL: [PipelineKind; 4] =
        [PipelineKind::Html, PipelineKind::Styles, PipelineKind::Scripts, PipelineKind::Images];

    /// Directory under `src/` holding this pipeline's sources.
    pub fn src_subdir(self) -> &'static str {
        match self {
            PipelineKind::Html => "html",
            PipelineKind::Styles => "scss",
            PipelineKind::Scripts => "js",
            PipelineKind::Images => "img",
        }
    }

    /// Directory under `dist/` receiving this pipeline's outputs.
    pub fn out_subdir(self) -> Option<&'static str> {
        match self {
            PipelineKind::Html => None,
            PipelineKind::Styles => Some("css"),
            PipelineKind::Scripts => Some("js"),
            PipelineKind::Images => Some("img"),
        }
    }

    /// Glob patterns, relative to the project root, whose changes re-run this pipeline.
    pub fn watch_patterns(self) -> Vec<String> {
        let dir = format!("src/{}", self.src_subdir());
        match self {
            PipelineKind::Images => {
                IMAGE_EXTENSIONS.iter().map(|ext| format!("{}/**/*.{}", dir, ext)).collect()
            }
            _ => vec![format!("{}/**/*", dir)],
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineKind::Html => write!(f, "html"),
            PipelineKind::Styles => write!(f, "css"),
            PipelineKind::Scripts => write!(f, "js"),
            PipelineKind::Images => write!(f, "images"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        let names: Vec<String> = PipelineKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["html", "css", "js", "images"]);
    }

    #[test]
    fn test_watch_patterns() {
        assert_eq!(PipelineKind::Html.watch_patterns(), vec!["src/html/**/*"]);
        assert_eq!(PipelineKind::Styles.watch_patterns(), vec!["src/scss/**/*"]);
        assert_eq!(PipelineKind::Scripts.watch_patterns(), vec!["src/js/**/*"]);

        let images = PipelineKind::Images.watch_patterns();
        assert_eq!(images.len(), 5);
        assert!(images.contains(&"src/img/**/*.svg".to_string()));
        assert!(images.contains(&"src/img/**/*.jpeg".to_string()));
    }
}
