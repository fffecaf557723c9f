use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{HWSystemError, Result};
use crate::models::submissions::entities::FileRef;

// 外部文件存储返回的引用：http(s) 地址或 对象存储键（bucket/key 形式）
static FILE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://[^\s/$.?#][^\s]*|[A-Za-z0-9][A-Za-z0-9._-]*(/[A-Za-z0-9._-]+)+)$")
        .expect("Invalid file url regex")
});

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_FEEDBACK_LEN: usize = 5000;
pub const MAX_REASON_LEN: usize = 1000;
pub const MAX_FILES_PER_SUBMISSION: usize = 20;

pub fn validate_file_ref(file: &FileRef) -> Result<()> {
    if !FILE_URL_RE.is_match(&file.url) {
        return Err(HWSystemError::validation(format!(
            "文件引用格式无效: '{}'",
            file.url
        )));
    }
    if file.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(HWSystemError::validation("文件名不能为空"));
    }
    Ok(())
}

/// 校验提交的文件列表：至少一个，且每个引用格式有效
pub fn validate_files(files: &[FileRef]) -> Result<()> {
    if files.is_empty() {
        return Err(HWSystemError::validation("提交至少需要包含一个文件"));
    }
    if files.len() > MAX_FILES_PER_SUBMISSION {
        return Err(HWSystemError::validation(format!(
            "单次提交最多 {MAX_FILES_PER_SUBMISSION} 个文件"
        )));
    }
    files.iter().try_for_each(validate_file_ref)
}

pub fn validate_title(title: &str) -> Result<()> {
    let len = title.trim().chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(HWSystemError::validation(format!(
            "作业标题长度必须在 1 到 {MAX_TITLE_LEN} 个字符之间"
        )));
    }
    Ok(())
}

pub fn validate_feedback(feedback: Option<&str>) -> Result<()> {
    if feedback.is_some_and(|text| text.chars().count() > MAX_FEEDBACK_LEN) {
        return Err(HWSystemError::validation(format!(
            "评语不能超过 {MAX_FEEDBACK_LEN} 个字符"
        )));
    }
    Ok(())
}

pub fn validate_reason(reason: &str) -> Result<()> {
    let len = reason.trim().chars().count();
    if len == 0 || len > MAX_REASON_LEN {
        return Err(HWSystemError::validation(format!(
            "原因长度必须在 1 到 {MAX_REASON_LEN} 个字符之间"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(url: &str) -> FileRef {
        FileRef {
            url: url.to_string(),
            name: None,
            content_type: None,
        }
    }

    #[test]
    fn test_accepts_urls_and_object_keys() {
        assert!(validate_file_ref(&file("https://cdn.school.org/hw/1.pdf")).is_ok());
        assert!(validate_file_ref(&file("uploads/2024/essay.docx")).is_ok());
    }

    #[test]
    fn test_rejects_malformed_refs() {
        for url in ["", "   ", "not a url", "ftp://x/y", "https://"] {
            assert!(
                matches!(validate_file_ref(&file(url)), Err(HWSystemError::Validation(_))),
                "{url:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_file_list_is_rejected() {
        assert!(matches!(
            validate_files(&[]),
            Err(HWSystemError::Validation(_))
        ));
    }

    #[test]
    fn test_reason_must_not_be_blank() {
        assert!(validate_reason("  ").is_err());
        assert!(validate_reason("missing page 2").is_ok());
    }
}
