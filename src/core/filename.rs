use crate::models::TrackDescriptor;

/// 파일명에 사용할 수 없는 문자를 `_`로 치환한다.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c == '/' || c == '\0' {
                return '_';
            }
            if cfg!(target_os = "windows")
                && (matches!(c, '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_ascii_control())
            {
                return '_';
            }
            if cfg!(target_os = "macos") && c == ':' {
                return '_';
            }
            c
        })
        .collect()
}

/// `"{title} - {singer}.flac"` 형식의 저장 파일명을 만든다.
pub fn build_filename(track: &TrackDescriptor) -> String {
    format!(
        "{} - {}.flac",
        sanitize_filename(track.title.trim()),
        sanitize_filename(track.singer.trim())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, singer: &str) -> TrackDescriptor {
        TrackDescriptor {
            title: title.to_string(),
            singer: singer.to_string(),
            n: 1,
        }
    }

    #[test]
    fn test_sanitize_filename_removes_slash_and_null() {
        assert_eq!(sanitize_filename("a/b\0c"), "a_b_c");
    }

    #[test]
    fn test_build_filename_cjk() {
        assert_eq!(build_filename(&track("告白气球", "周杰伦")), "告白气球 - 周杰伦.flac");
    }

    #[test]
    fn test_build_filename_sanitizes() {
        assert_eq!(
            build_filename(&track("Back/Slash", " AC/DC ")),
            "Back_Slash - AC_DC.flac"
        );
    }
}
