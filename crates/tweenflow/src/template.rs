use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::InterpolationError;

/// A printf-style frame filename template such as `./img_%03d.tif`.
///
/// The template holds exactly one integer counter (`%d`, `%Nd` or `%0Nd`)
/// directly followed by a file extension. It is parsed once and then maps
/// frame indices to paths and back without touching the filesystem.
///
/// # Examples
///
/// ```
/// use tweenflow::template::PathTemplate;
///
/// let template: PathTemplate = "frames/img_%03d.png".parse().unwrap();
///
/// assert_eq!(template.path_for(7).to_str(), Some("frames/img_007.png"));
/// assert_eq!(template.path_for(1234).to_str(), Some("frames/img_1234.png"));
/// assert_eq!(template.index_of("frames/img_042.png"), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    prefix: String,
    width: Option<usize>,
    zero_pad: bool,
    extension: String,
}

impl PathTemplate {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::MalformedTemplate`] if the counter or the
    /// extension cannot be located.
    pub fn parse(template: &str) -> Result<Self, InterpolationError> {
        let malformed = |reason| InterpolationError::MalformedTemplate {
            template: template.to_string(),
            reason,
        };

        let (prefix, rest) = template
            .split_once('%')
            .ok_or_else(|| malformed("no counter placeholder"))?;
        if rest.contains('%') {
            return Err(malformed("more than one placeholder"));
        }

        let conversion = rest
            .find('d')
            .ok_or_else(|| malformed("unsupported conversion, expected %0Nd"))?;
        let flags = &rest[..conversion];
        if !flags.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed("unsupported conversion, expected %0Nd"));
        }

        let zero_pad = flags.starts_with('0');
        let width = match flags {
            "" => None,
            digits => match digits.parse::<usize>() {
                Ok(0) | Err(_) => return Err(malformed("counter width must be positive")),
                Ok(w) => Some(w),
            },
        };

        let extension = rest[conversion + 1..]
            .strip_prefix('.')
            .filter(|ext| !ext.is_empty() && !ext.contains(['.', '/', '\\']))
            .ok_or_else(|| malformed("counter must be followed by a file extension"))?;

        Ok(Self {
            prefix: prefix.to_string(),
            width,
            zero_pad,
            extension: extension.to_string(),
        })
    }

    /// The text before the counter.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Minimum number of digits of the counter, if padded.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// The file extension, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn counter(&self, index: usize) -> String {
        match self.width {
            Some(w) if self.zero_pad => format!("{index:0w$}"),
            Some(w) => format!("{index:>w$}"),
            None => index.to_string(),
        }
    }

    /// Render the path of frame `index`.
    ///
    /// Indices wider than the counter keep all their digits.
    pub fn path_for(&self, index: usize) -> PathBuf {
        PathBuf::from(format!(
            "{}{}.{}",
            self.prefix,
            self.counter(index),
            self.extension
        ))
    }

    /// Recover the frame index from a path rendered by [`PathTemplate::path_for`].
    ///
    /// Returns `None` for paths this template cannot produce.
    pub fn index_of(&self, path: impl AsRef<Path>) -> Option<usize> {
        let path = path.as_ref();
        let digits = path
            .to_str()?
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;

        let index = digits.trim_start().parse::<usize>().ok()?;

        // only the canonical rendering maps back, e.g. `+7` or `7` for `%03d` do not
        (self.path_for(index) == path).then_some(index)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.prefix)?;
        if self.zero_pad {
            write!(f, "0")?;
        }
        if let Some(w) = self.width {
            write!(f, "{w}")?;
        }
        write!(f, "d.{}", self.extension)
    }
}

impl FromStr for PathTemplate {
    type Err = InterpolationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Render the path of frame `index` for a template string.
///
/// # Errors
///
/// Returns [`InterpolationError::MalformedTemplate`] if `template` does not parse.
pub fn path_for(template: &str, index: usize) -> Result<PathBuf, InterpolationError> {
    Ok(PathTemplate::parse(template)?.path_for(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_zero_padded() -> Result<(), InterpolationError> {
        let template = PathTemplate::parse("./img_%03d.tif")?;
        assert_eq!(template.prefix(), "./img_");
        assert_eq!(template.width(), Some(3));
        assert_eq!(template.extension(), "tif");
        assert_eq!(template.path_for(0), PathBuf::from("./img_000.tif"));
        assert_eq!(template.path_for(42), PathBuf::from("./img_042.tif"));
        Ok(())
    }

    #[test]
    fn wide_index_is_not_clipped() -> Result<(), InterpolationError> {
        let template = PathTemplate::parse("f%02d.png")?;
        assert_eq!(template.path_for(99), PathBuf::from("f99.png"));
        assert_eq!(template.path_for(100), PathBuf::from("f100.png"));
        assert_eq!(template.path_for(123456), PathBuf::from("f123456.png"));
        assert_eq!(template.index_of("f123456.png"), Some(123456));
        Ok(())
    }

    #[test]
    fn other_counters() -> Result<(), InterpolationError> {
        let plain = PathTemplate::parse("seq/%d.bmp")?;
        assert_eq!(plain.path_for(5), PathBuf::from("seq/5.bmp"));
        assert_eq!(plain.index_of("seq/5.bmp"), Some(5));

        let spaced = PathTemplate::parse("a%3d.png")?;
        assert_eq!(spaced.path_for(5), PathBuf::from("a  5.png"));
        assert_eq!(spaced.index_of("a  5.png"), Some(5));
        Ok(())
    }

    #[test]
    fn round_trip() -> Result<(), InterpolationError> {
        let template = PathTemplate::parse("out/frame_%04d.tiff")?;
        for index in [0, 1, 10, 999, 9999, 10000] {
            assert_eq!(template.index_of(template.path_for(index)), Some(index));
        }
        Ok(())
    }

    #[test]
    fn index_of_foreign_paths() -> Result<(), InterpolationError> {
        let template = PathTemplate::parse("img_%03d.png")?;
        assert_eq!(template.index_of("img_007.tif"), None);
        assert_eq!(template.index_of("other_007.png"), None);
        assert_eq!(template.index_of("img_7.png"), None);
        assert_eq!(template.index_of("img_+07.png"), None);
        assert_eq!(template.index_of("img_abc.png"), None);
        Ok(())
    }

    #[test]
    fn malformed_templates() {
        for text in [
            "img.png",
            "img_%03d_%03d.png",
            "img_%03x.png",
            "img_%-3d.png",
            "img_%03d",
            "img_%03d.",
            "img_%03d_suffix.png",
            "img_%03d.tar.gz",
            "img_%0d.png",
        ] {
            assert!(
                matches!(
                    PathTemplate::parse(text),
                    Err(InterpolationError::MalformedTemplate { .. })
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trip() -> Result<(), InterpolationError> {
        for text in ["./img_%03d.tif", "x%d.png", "y%4d.bmp"] {
            let template: PathTemplate = text.parse()?;
            assert_eq!(template.to_string(), text);
        }
        Ok(())
    }

    #[test]
    fn free_path_for() -> Result<(), InterpolationError> {
        assert_eq!(path_for("a_%02d.png", 3)?, PathBuf::from("a_03.png"));
        assert!(path_for("a_.png", 3).is_err());
        Ok(())
    }
}
