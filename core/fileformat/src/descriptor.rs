use std::path::Path;

/// Extension and size information derived purely from a path, without
/// consulting any registry. `extensions[0]` is the last (rightmost)
/// extension; a name with `k` dot-separated extensions yields exactly `k`
/// entries here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathDescriptor {
    pub extensions: Vec<String>,
    /// File size in bytes, or `None` if the path could not be stat'd.
    pub bytes: Option<u64>,
}

/// Splits a filename right-to-left on `.`, lower-casing each run into
/// `extensions[0..]`. A filename starting with `.` (a dotfile) has no
/// extensions. Two consecutive dots stop the scan at that point, keeping
/// whatever extensions were already found further right.
pub fn desc_from_path<P: AsRef<Path>>(path: P) -> PathDescriptor {
    let path = path.as_ref();
    let bytes = std::fs::metadata(path).ok().map(|m| m.len());

    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return PathDescriptor { extensions: Vec::new(), bytes };
    };

    let parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() <= 1 || parts[0].is_empty() {
        return PathDescriptor { extensions: Vec::new(), bytes };
    }

    let mut extensions = Vec::new();
    for part in parts[1..].iter().rev() {
        if part.is_empty() {
            break;
        }
        extensions.push(part.to_lowercase());
    }

    PathDescriptor { extensions, bytes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_to_left_order_and_lowercasing() {
        let desc = desc_from_path("file.jG.WHAT1.eVer");
        assert_eq!(desc.extensions, vec!["ever", "what1", "jg"]);
    }

    #[test]
    fn dotfile_has_no_extension() {
        let desc = desc_from_path(".bashrc");
        assert!(desc.extensions.is_empty());
    }

    #[test]
    fn consecutive_dots_stop_the_scan() {
        let desc = desc_from_path("archive..tar.gz");
        assert_eq!(desc.extensions, vec!["gz", "tar"]);
    }

    #[test]
    fn no_extension_at_all() {
        let desc = desc_from_path("README");
        assert!(desc.extensions.is_empty());
    }
}
