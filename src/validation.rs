//! Task input validation.

use crate::error::{StoreError, StoreResult};
use crate::types::{NewTask, TaskPatch};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

pub fn validate_title(title: &str) -> StoreResult<()> {
    let len = title.trim().chars().count();
    if len < TITLE_MIN_CHARS {
        return Err(StoreError::validation(
            "title",
            format!("must be at least {} characters", TITLE_MIN_CHARS),
        ));
    }
    if len > TITLE_MAX_CHARS {
        return Err(StoreError::validation(
            "title",
            format!("must be less than {} characters", TITLE_MAX_CHARS),
        ));
    }
    Ok(())
}

pub fn validate_description(description: Option<&str>) -> StoreResult<()> {
    if let Some(description) = description
        && description.chars().count() > DESCRIPTION_MAX_CHARS
    {
        return Err(StoreError::validation(
            "description",
            format!("must be less than {} characters", DESCRIPTION_MAX_CHARS),
        ));
    }
    Ok(())
}

pub fn validate_new_task(input: &NewTask) -> StoreResult<()> {
    validate_title(&input.title)?;
    validate_description(input.description.as_deref())
}

pub fn validate_patch(patch: &TaskPatch) -> StoreResult<()> {
    if let Some(ref title) = patch.title {
        validate_title(title)?;
    }
    if let Some(Some(ref description)) = patch.description {
        validate_description(Some(description))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnId;

    #[test]
    fn test_title_bounds() {
        assert!(validate_title("abc").is_ok());
        assert!(validate_title("  ab  ").is_err());
        assert!(validate_title(&"x".repeat(255)).is_ok());
        assert!(validate_title(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_description_limit() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some(&"d".repeat(1000))).is_ok());
        let err = validate_description(Some(&"d".repeat(1001))).unwrap_err();
        assert_eq!(
            err,
            StoreError::validation("description", "must be less than 1000 characters")
        );
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        assert!(validate_patch(&TaskPatch::default()).is_ok());
        let patch = TaskPatch {
            title: Some("no".into()),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
        assert!(validate_new_task(&NewTask::new("Write tests", ColumnId::Backlog)).is_ok());
    }
}
