//! Discovery - 取り込み対象の画像ファイルを列挙
//!
//! walkdir のイテレータをそのまま包むので列挙は遅延評価です。
//! 同じディレクトリ内はファイル名順（バイト順）、サブディレクトリは深さ優先。
//! 読み込みはディレクトリ単位なので、巨大なツリーでも全体を先読みしません。

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::FileError;

/// Extensions that are picked up, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Lazy, recursive sequence of image files under a root directory.
///
/// Traversal errors (unreadable directory, entry removed mid-walk) are
/// yielded as `FileError::Walk` and the walk continues.
pub struct ImageFiles {
    inner: walkdir::IntoIter,
}

impl ImageFiles {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            inner: WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
        }
    }
}

impl Iterator for ImageFiles {
    type Item = Result<PathBuf, FileError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    // シンボリックリンク先のファイルは拾うが、ディレクトリのリンクは辿らない
                    let is_file = entry.file_type().is_file()
                        || (entry.path_is_symlink() && entry.path().is_file());
                    if is_file && is_image_path(entry.path()) {
                        return Some(Ok(entry.into_path()));
                    }
                }
                Err(err) => {
                    return Some(Err(FileError::Walk {
                        path: err.path().map(Path::to_path_buf),
                        message: err.to_string(),
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::png("a.png", true)]
    #[case::upper_jpg("B.JPG", true)]
    #[case::jpeg("c.jpeg", true)]
    #[case::gif("d.Gif", true)]
    #[case::bmp("e.bmp", true)]
    #[case::tiff("f.TIFF", true)]
    #[case::tif_is_not_listed("g.tif", false)]
    #[case::webp("h.webp", false)]
    #[case::text("notes.txt", false)]
    #[case::no_extension("README", false)]
    #[case::dotfile("/x/.png", false)]
    fn image_extension_filter(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image_path(Path::new(name)), expected);
    }

    #[test]
    fn walks_recursively_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["a.png", "B.JPG", "notes.txt", "nested/deeper/c.tiff", "nested/d.webp"] {
            let path = root.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"x").unwrap();
        }
        // 拡張子が画像でもディレクトリは対象外
        std::fs::create_dir_all(root.join("folder.png")).unwrap();

        let found: Vec<PathBuf> = ImageFiles::new(root)
            .map(|r| r.unwrap().strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("B.JPG"),
                PathBuf::from("a.png"),
                PathBuf::from("nested/deeper/c.tiff"),
            ]
        );
    }

    #[test]
    fn siblings_come_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.png", "m.png", "0.png", "k/a.png"] {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"x").unwrap();
        }

        let names: Vec<String> = ImageFiles::new(dir.path())
            .map(|r| {
                let path = r.unwrap();
                path.strip_prefix(dir.path()).unwrap().display().to_string()
            })
            .collect();
        assert_eq!(names, vec!["0.png", "k/a.png", "m.png", "z.png"]);
    }

    #[test]
    fn missing_root_yields_walk_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let items: Vec<_> = ImageFiles::new(&missing).collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(FileError::Walk { path: Some(p), .. }) if p == &missing));
    }
}
