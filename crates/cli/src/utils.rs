//! Small helpers shared by CLI commands.

use std::path::{Path, PathBuf};

/// Derive the default output path: `book.epub` becomes `book_modern.epub`
/// next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("book");
    input.with_file_name(format!("{stem}_modern.epub"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_keeps_the_directory() {
        let path = default_output_path(Path::new("books/gonewiththewind.epub"));
        assert_eq!(path, Path::new("books/gonewiththewind_modern.epub"));
    }

    #[test]
    fn output_path_without_extension() {
        let path = default_output_path(Path::new("book"));
        assert_eq!(path, Path::new("book_modern.epub"));
    }
}
