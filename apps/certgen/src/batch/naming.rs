//! Output file naming.
//!
//! Names are not de-duplicated: two recipients whose names sanitize to the
//! same stem write to the same path, and the later row wins.

use std::path::{Path, PathBuf};

const RESERVED: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replaces characters that are unsafe in file names with `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

pub fn certificate_file_name(name: &str) -> String {
    format!("Certificate - {}.pdf", sanitize_file_stem(name))
}

pub fn certificate_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(certificate_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_characters_become_underscores() {
        assert_eq!(certificate_file_name("A/B:C"), "Certificate - A_B_C.pdf");
        assert_eq!(sanitize_file_stem(r#"a\b*c?d"e<f>g|h"#), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn test_ordinary_names_are_untouched() {
        assert_eq!(certificate_file_name("José O'Neil"), "Certificate - José O'Neil.pdf");
    }

    #[test]
    fn test_colliding_names_share_a_path() {
        let dir = Path::new("/out");
        assert_eq!(certificate_path(dir, "A/B"), certificate_path(dir, "A:B"));
    }
}
