use chrono::{Local, NaiveDateTime};

/// `strftime` pattern of the suffix appended to every stored name:
/// `YYYYMMDD_HHMMSSmmm`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";

/// Derives a filesystem-safe storage name from a client-supplied file name,
/// stamped with the current local time.
///
/// - Spaces in the base name become `_`.
/// - Anything other than ASCII alphanumerics, `_` and `-` is dropped from the
///   base name.
/// - `_YYYYMMDD_HHMMSSmmm` is appended, then the original extension.
///
/// Uniqueness is best-effort: two equal names sanitized within the same
/// millisecond collide.
pub fn sanitize(original_name: &str) -> String {
    sanitize_at(original_name, Local::now().naive_local())
}

/// Same as [`sanitize`] with an explicit timestamp.
pub fn sanitize_at(original_name: &str, at: NaiveDateTime) -> String {
    let (base, ext) = split_extension(original_name);

    let cleaned: String = base
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();

    format!("{cleaned}_{}{ext}", at.format(TIMESTAMP_FORMAT))
}

/// Splits `name` into base and extension.
///
/// The extension runs from the last `.` of the final path component to the
/// end, dot included. Leading dots of a component do not start an extension,
/// so `.bashrc` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    let component_start = name.rfind(['/', '\\']).map_or(0, |i| i + 1);

    let Some(dot) = name.rfind('.') else {
        return (name, "");
    };
    if dot < component_start || name[component_start..dot].bytes().all(|b| b == b'.') {
        return (name, "");
    }

    name.split_at(dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(10, 15, 30, 123)
            .unwrap()
    }

    #[test]
    fn report_with_spaces_and_parens() {
        assert_eq!(
            sanitize_at("My Report (final).pdf", at()),
            "My_Report_final_20240301_101530123.pdf"
        );
    }

    #[test]
    fn no_extension() {
        assert_eq!(sanitize_at("README", at()), "README_20240301_101530123");
    }

    #[test]
    fn only_last_extension_is_kept() {
        assert_eq!(
            sanitize_at("archive.tar.gz", at()),
            "archivetar_20240301_101530123.gz"
        );
    }

    #[test]
    fn extension_is_not_modified() {
        assert_eq!(
            sanitize_at("photo.J P(G)", at()),
            "photo_20240301_101530123.J P(G)"
        );
    }

    #[test]
    fn empty_base_keeps_timestamp() {
        assert_eq!(sanitize_at("", at()), "_20240301_101530123");
        assert_eq!(sanitize_at("((())).txt", at()), "_20240301_101530123.txt");
    }

    #[test]
    fn dotfile_has_no_extension() {
        assert_eq!(sanitize_at(".bashrc", at()), "bashrc_20240301_101530123");
    }

    #[test]
    fn non_ascii_is_stripped() {
        assert_eq!(
            sanitize_at("résumé_2024-v2.docx", at()),
            "rsum_2024-v2_20240301_101530123.docx"
        );
    }

    #[test]
    fn separators_never_survive() {
        let inputs = [
            "../../etc/passwd",
            "..\\..\\windows\\system32.dll",
            "dir/sub.d/file",
            "a/b/c.txt",
            "/absolute/path.bin",
            "C:\\Users\\me\\notes.md",
            "we:ird*na<me>?.log",
            "tab\tand\nnewline.csv",
        ];
        for input in inputs {
            let out = sanitize_at(input, at());
            let (_, ext) = split_extension(input);
            let body = out.strip_suffix(ext).unwrap();
            assert!(!out.contains('/'), "{out}");
            assert!(!out.contains('\\'), "{out}");
            assert!(
                body.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                "{input:?} -> {out:?}"
            );
            assert!(out.ends_with(ext));
        }
    }

    #[test]
    fn split_extension_rules() {
        assert_eq!(split_extension("file.txt"), ("file", ".txt"));
        assert_eq!(split_extension("file."), ("file", "."));
        assert_eq!(split_extension("file"), ("file", ""));
        assert_eq!(split_extension("..hidden.txt"), ("..hidden", ".txt"));
        assert_eq!(split_extension("..."), ("...", ""));
        assert_eq!(split_extension("dir.d/file"), ("dir.d/file", ""));
        assert_eq!(split_extension("dir/.profile"), ("dir/.profile", ""));
    }

    #[test]
    fn live_clock_suffix_shape() {
        let out = sanitize("notes.txt");
        let stamp = out
            .strip_prefix("notes_")
            .and_then(|s| s.strip_suffix(".txt"))
            .unwrap();
        assert_eq!(stamp.len(), "20240301_101530123".len());
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }
}
