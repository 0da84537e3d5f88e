use crate::error::{ApiError, ApiResult};
use crate::models::share::MAX_SHARE_DURATION_SECONDS;

/// Input gates for user-supplied fields. Each returns the trimmed value so
/// callers store the normalized form.

pub fn group_name(name: &str) -> ApiResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("그룹 이름을 입력해 주세요".into()));
    }
    let len = trimmed.chars().count();
    if len < 2 {
        return Err(ApiError::InvalidInput("그룹 이름은 2자 이상이어야 합니다".into()));
    }
    if len > 30 {
        return Err(ApiError::InvalidInput("그룹 이름은 30자 이하여야 합니다".into()));
    }
    Ok(trimmed.to_string())
}

/// Nicknames allow Korean (syllables and jamo), English letters, digits and
/// spaces. 2–15 characters after trimming.
pub fn nickname(nickname: &str) -> ApiResult<String> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("닉네임을 입력해 주세요".into()));
    }
    let len = trimmed.chars().count();
    if len < 2 {
        return Err(ApiError::InvalidInput("닉네임은 2자 이상이어야 합니다".into()));
    }
    if len > 15 {
        return Err(ApiError::InvalidInput("닉네임은 15자 이하여야 합니다".into()));
    }
    if !trimmed.chars().all(is_allowed_nickname_char) {
        return Err(ApiError::InvalidInput(
            "닉네임에는 한글, 영문, 숫자만 사용할 수 있습니다".into(),
        ));
    }
    Ok(trimmed.to_string())
}

fn is_allowed_nickname_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == ' '
        || ('가'..='힣').contains(&c)
        || ('ㄱ'..='ㅎ').contains(&c)
        || ('ㅏ'..='ㅣ').contains(&c)
}

/// Invite codes are 8 alphanumeric characters, stored uppercase.
pub fn invite_code(code: &str) -> ApiResult<String> {
    let trimmed = code.trim().to_uppercase();
    if trimmed.chars().count() != 8 {
        return Err(ApiError::InvalidInput("초대 코드는 8자리여야 합니다".into()));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::InvalidInput(
            "초대 코드는 영문과 숫자만 포함해야 합니다".into(),
        ));
    }
    Ok(trimmed)
}

pub fn share_description(description: &str) -> ApiResult<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("어떤 도움이었는지 입력해 주세요".into()));
    }
    let len = trimmed.chars().count();
    if len < 2 {
        return Err(ApiError::InvalidInput("최소 2자 이상 입력해 주세요".into()));
    }
    if len > 100 {
        return Err(ApiError::InvalidInput("100자 이하로 입력해 주세요".into()));
    }
    Ok(trimmed.to_string())
}

pub fn share_duration(duration_seconds: i64) -> ApiResult<()> {
    if duration_seconds <= 0 {
        return Err(ApiError::InvalidInput("시간을 입력해 주세요".into()));
    }
    if duration_seconds > MAX_SHARE_DURATION_SECONDS {
        return Err(ApiError::InvalidInput("24시간 이하로 입력해 주세요".into()));
    }
    Ok(())
}

pub fn help_request_description(description: &str) -> ApiResult<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("무엇이 필요한지 입력해 주세요".into()));
    }
    let len = trimmed.chars().count();
    if len < 5 {
        return Err(ApiError::InvalidInput("최소 5자 이상 입력해 주세요".into()));
    }
    if len > 200 {
        return Err(ApiError::InvalidInput("200자 이하로 입력해 주세요".into()));
    }
    Ok(trimmed.to_string())
}

/// Optional field — empty is fine, overlong is not.
pub fn thank_you_note(note: &str) -> ApiResult<Option<String>> {
    let trimmed = note.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > 150 {
        return Err(ApiError::InvalidInput("150자 이하로 입력해 주세요".into()));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_name_length_bounds() {
        assert!(group_name("").is_err());
        assert!(group_name("a").is_err());
        assert!(group_name("우리 가족").is_ok());
        assert!(group_name(&"가".repeat(31)).is_err());
        assert_eq!(group_name("  이웃사촌  ").unwrap(), "이웃사촌");
    }

    #[test]
    fn nickname_length_and_charset() {
        assert!(nickname("a").is_err());
        assert!(nickname(&"가".repeat(16)).is_err());
        assert_eq!(nickname("  민수  ").unwrap(), "민수");

        // Korean, English, digits and spaces are fine, including bare jamo.
        assert!(nickname("지은맘").is_ok());
        assert!(nickname("Minsu 2").is_ok());
        assert!(nickname("ㅎㅎ둘째맘").is_ok());

        // Punctuation and emoji are not.
        assert!(nickname("민수!").is_err());
        assert!(nickname("min-su").is_err());
        assert!(nickname("민수😀").is_err());
    }

    #[test]
    fn invite_code_format() {
        assert_eq!(invite_code("ab12cd34").unwrap(), "AB12CD34");
        assert!(invite_code("AB12CD3").is_err());
        assert!(invite_code("AB12CD345").is_err());
        assert!(invite_code("AB12CD3!").is_err());
    }

    #[test]
    fn share_duration_range() {
        assert!(share_duration(0).is_err());
        assert!(share_duration(-60).is_err());
        assert!(share_duration(1).is_ok());
        assert!(share_duration(86_400).is_ok());
        assert!(share_duration(86_401).is_err());
    }

    #[test]
    fn descriptions() {
        assert!(share_description("a").is_err());
        assert!(share_description("아이 돌봄").is_ok());
        assert!(share_description(&"a".repeat(101)).is_err());
        assert!(help_request_description("장보기").is_err()); // < 5 chars
        assert!(help_request_description("내일 아이 하원 부탁해요").is_ok());
    }

    #[test]
    fn thank_you_note_optional() {
        assert_eq!(thank_you_note("  ").unwrap(), None);
        assert_eq!(thank_you_note("고마워요!").unwrap().as_deref(), Some("고마워요!"));
        assert!(thank_you_note(&"감".repeat(151)).is_err());
    }
}
