//! Shared helper functions for CLI commands

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of the solver's post-processing result files
pub const RESULT_FILE_SUFFIX: &str = ".post.res";

fn is_result_file(path: &Path) -> bool {
    path.to_string_lossy().ends_with(RESULT_FILE_SUFFIX)
}

/// Trailing number of a result file name (`output_stage12.post.res` -> 12)
fn stage_number(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?.strip_suffix(RESULT_FILE_SUFFIX)?;
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    name[stem.len()..].parse().ok()
}

/// Parse a `c,phi` pair of 1-based parameter indices
pub fn parse_c_phi(s: &str) -> Result<(usize, usize), String> {
    let (c, phi) = s
        .split_once(',')
        .ok_or_else(|| format!("expected C,PHI (e.g. 3,4), got '{}'", s))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|_| format!("'{}' is not a parameter index", part.trim()))
    };
    Ok((parse(c)?, parse(phi)?))
}

/// Expand paths - directories are scanned for result files
///
/// Files found in a directory are sorted by stage number, so
/// `output_stage10` follows `output_stage9`;
/// explicitly named files keep the order they were given in.
pub fn expand_result_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path().to_path_buf())
                .filter(|p| is_result_file(p))
                .collect();
            found.sort_by(|a, b| {
                (a.parent(), stage_number(a), a).cmp(&(b.parent(), stage_number(b), b))
            });
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_c_phi() {
        assert_eq!(parse_c_phi("3,4"), Ok((3, 4)));
        assert_eq!(parse_c_phi(" 1 , 2 "), Ok((1, 2)));
        assert!(parse_c_phi("3").is_err());
        assert!(parse_c_phi("a,4").is_err());
        assert!(parse_c_phi("-1,4").is_err());
    }

    #[test]
    fn test_directories_are_scanned_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gid_output");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("output_stage2.post.res"), "").unwrap();
        fs::write(out.join("output_stage1.post.res"), "").unwrap();
        fs::write(out.join("output_stage1.post.bin"), "").unwrap();

        let files = expand_result_paths(&[out.clone()]);
        assert_eq!(
            files,
            vec![
                out.join("output_stage1.post.res"),
                out.join("output_stage2.post.res")
            ]
        );
    }

    #[test]
    fn test_stage_ten_sorts_after_stage_two() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["output_stage10.post.res", "output_stage2.post.res"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let files = expand_result_paths(&[dir.path().to_path_buf()]);
        assert_eq!(files[0].file_name().unwrap(), "output_stage2.post.res");
        assert_eq!(files[1].file_name().unwrap(), "output_stage10.post.res");
    }

    #[test]
    fn test_explicit_files_keep_their_order() {
        let paths = vec![PathBuf::from("b.post.res"), PathBuf::from("a.post.res")];
        assert_eq!(expand_result_paths(&paths), paths);
    }
}
