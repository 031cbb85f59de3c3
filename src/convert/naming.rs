//! Output file naming.

use crate::codec::JpegTarget;

const FALLBACK_STEM: &str = "image";

/// Name for the converted file.
///
/// A non-empty requested name is used verbatim. Otherwise the base name of
/// the declared upload name gets the target extension appended, so
/// `photo.heic` becomes `photo.heic.jpg`.
pub fn output_name(declared: &str, requested: Option<&str>) -> String {
    if let Some(name) = requested.filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    let base = declared.rsplit('/').next().unwrap_or_default();
    let base = if base.is_empty() { FALLBACK_STEM } else { base };
    format!("{base}.{}", JpegTarget::EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_from_declared_name() {
        assert_eq!(output_name("photo.heic", None), "photo.heic.jpg");
    }

    #[test]
    fn requested_name_is_verbatim() {
        assert_eq!(output_name("photo.heic", Some("foo.jpg")), "foo.jpg");
        assert_eq!(output_name("photo.heic", Some("no extension")), "no extension");
    }

    #[test]
    fn empty_request_falls_back_to_derived() {
        assert_eq!(output_name("IMG_0001.HEIC", Some("")), "IMG_0001.HEIC.jpg");
    }

    #[test]
    fn directories_are_stripped() {
        assert_eq!(output_name("/tmp/uploads/cat.heic", None), "cat.heic.jpg");
        assert_eq!(output_name("dir/", None), "image.jpg");
        assert_eq!(output_name("", None), "image.jpg");
    }
}
