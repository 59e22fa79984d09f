use crate::store::UserRecord;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Raw form submission, before any normalization.
#[derive(Debug, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Validation knobs. Defaults match the free-form product variant
/// (five interests, no province); the province variant turns on the
/// stricter rules individually.
#[derive(Debug, Clone)]
pub struct Rules {
    pub interest_count: usize,
    pub require_province: bool,
    pub distinct_interests: bool,
    pub interest_char_len: Option<usize>,
    pub case_sensitive_nicknames: bool,
    pub forbidden_province_terms: Vec<String>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            interest_count: 5,
            require_province: false,
            distinct_interests: false,
            interest_char_len: None,
            case_sensitive_nicknames: false,
            forbidden_province_terms: Vec::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("nickname is required")]
    EmptyNickname,
    #[error("exactly {expected} interests are required")]
    WrongInterestCount { expected: usize },
    #[error("interests must not be empty")]
    EmptyInterest,
    #[error("province is required")]
    MissingProvince,
    #[error("province must not contain {term:?}")]
    ForbiddenProvinceTerm { term: String },
    #[error("interests must be distinct")]
    DuplicateInterest,
    #[error("each interest must be exactly {expected} characters")]
    WrongInterestLength { expected: usize },
    #[error("nickname {nickname:?} is already taken")]
    NicknameTaken { nickname: String },
}

/// Normalizes a submission and checks it against the configured rules and
/// the records already in the store. Interests are trimmed, lowercased and
/// kept in input order; nickname and province keep their case.
pub fn validate(
    rules: &Rules,
    submission: &Submission,
    existing: &[UserRecord],
) -> Result<UserRecord, ValidationError> {
    let nickname = submission.nickname.trim();
    if nickname.is_empty() {
        return Err(ValidationError::EmptyNickname);
    }

    let interests: Vec<String> = submission
        .interests
        .iter()
        .map(|interest| interest.trim().to_lowercase())
        .collect();
    if interests.len() != rules.interest_count {
        return Err(ValidationError::WrongInterestCount {
            expected: rules.interest_count,
        });
    }
    if interests.iter().any(|interest| interest.is_empty()) {
        return Err(ValidationError::EmptyInterest);
    }
    if let Some(expected) = rules.interest_char_len {
        if interests
            .iter()
            .any(|interest| interest.chars().count() != expected)
        {
            return Err(ValidationError::WrongInterestLength { expected });
        }
    }
    if rules.distinct_interests {
        let mut seen = HashSet::new();
        if !interests.iter().all(|interest| seen.insert(interest)) {
            return Err(ValidationError::DuplicateInterest);
        }
    }

    let province = submission
        .province
        .as_deref()
        .map(str::trim)
        .filter(|province| !province.is_empty());
    if rules.require_province && province.is_none() {
        return Err(ValidationError::MissingProvince);
    }
    if let Some(province) = province {
        for term in &rules.forbidden_province_terms {
            if province.contains(term.as_str()) {
                return Err(ValidationError::ForbiddenProvinceTerm { term: term.clone() });
            }
        }
    }

    let taken = existing.iter().any(|user| {
        if rules.case_sensitive_nicknames {
            user.nickname == nickname
        } else {
            user.nickname.to_lowercase() == nickname.to_lowercase()
        }
    });
    if taken {
        return Err(ValidationError::NicknameTaken {
            nickname: nickname.to_string(),
        });
    }

    Ok(UserRecord {
        nickname: nickname.to_string(),
        province: province.map(str::to_string),
        interests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(nickname: &str, interests: &[&str]) -> Submission {
        Submission {
            nickname: nickname.to_string(),
            province: None,
            interests: interests.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn two_interest_rules() -> Rules {
        Rules {
            interest_count: 2,
            ..Rules::default()
        }
    }

    #[test]
    fn trims_and_lowercases_interests_preserving_order() {
        let rules = two_interest_rules();
        let record = validate(&rules, &submission("  Ann ", &[" Tea ", "HIKING"]), &[])
            .expect("should accept");
        assert_eq!(record.nickname, "Ann");
        assert_eq!(record.interests, vec!["tea", "hiking"]);
    }

    #[test]
    fn rejects_empty_nickname() {
        let rules = two_interest_rules();
        let result = validate(&rules, &submission("   ", &["a", "b"]), &[]);
        assert_eq!(result, Err(ValidationError::EmptyNickname));
    }

    #[test]
    fn rejects_wrong_interest_count() {
        let rules = two_interest_rules();
        let result = validate(&rules, &submission("Ann", &["a", "b", "c"]), &[]);
        assert_eq!(
            result,
            Err(ValidationError::WrongInterestCount { expected: 2 })
        );
        let result = validate(&rules, &submission("Ann", &["a"]), &[]);
        assert_eq!(
            result,
            Err(ValidationError::WrongInterestCount { expected: 2 })
        );
    }

    #[test]
    fn rejects_interest_empty_after_trim() {
        let rules = two_interest_rules();
        let result = validate(&rules, &submission("Ann", &["a", "   "]), &[]);
        assert_eq!(result, Err(ValidationError::EmptyInterest));
    }

    #[test]
    fn rejects_duplicate_nickname_case_insensitively_by_default() {
        let rules = two_interest_rules();
        let existing = vec![
            validate(&rules, &submission("Ann", &["a", "b"]), &[]).expect("should accept"),
        ];
        let result = validate(&rules, &submission("ann", &["c", "d"]), &existing);
        assert_eq!(
            result,
            Err(ValidationError::NicknameTaken {
                nickname: "ann".to_string()
            })
        );
    }

    #[test]
    fn case_sensitive_rule_allows_differently_cased_nickname() {
        let rules = Rules {
            case_sensitive_nicknames: true,
            ..two_interest_rules()
        };
        let existing = vec![
            validate(&rules, &submission("Ann", &["a", "b"]), &[]).expect("should accept"),
        ];
        assert!(validate(&rules, &submission("ann", &["c", "d"]), &existing).is_ok());
        assert_eq!(
            validate(&rules, &submission("Ann", &["c", "d"]), &existing),
            Err(ValidationError::NicknameTaken {
                nickname: "Ann".to_string()
            })
        );
    }

    #[test]
    fn rejects_missing_province_when_required() {
        let rules = Rules {
            require_province: true,
            ..two_interest_rules()
        };
        let result = validate(&rules, &submission("Ann", &["a", "b"]), &[]);
        assert_eq!(result, Err(ValidationError::MissingProvince));

        let blank = Submission {
            province: Some("   ".to_string()),
            ..submission("Ann", &["a", "b"])
        };
        assert_eq!(
            validate(&rules, &blank, &[]),
            Err(ValidationError::MissingProvince)
        );
    }

    #[test]
    fn rejects_province_containing_forbidden_term() {
        let rules = Rules {
            require_province: true,
            forbidden_province_terms: vec!["省".to_string(), "市".to_string()],
            ..two_interest_rules()
        };
        let with_suffix = Submission {
            province: Some("云南省".to_string()),
            ..submission("Ann", &["a", "b"])
        };
        assert_eq!(
            validate(&rules, &with_suffix, &[]),
            Err(ValidationError::ForbiddenProvinceTerm {
                term: "省".to_string()
            })
        );

        let clean = Submission {
            province: Some("云南".to_string()),
            ..submission("Ann", &["a", "b"])
        };
        let record = validate(&rules, &clean, &[]).expect("should accept");
        assert_eq!(record.province.as_deref(), Some("云南"));
    }

    #[test]
    fn rejects_identical_interests_when_distinct_required() {
        let rules = Rules {
            distinct_interests: true,
            ..two_interest_rules()
        };
        // Lowercasing happens first, so these collide.
        let result = validate(&rules, &submission("Ann", &["Tea", "tea"]), &[]);
        assert_eq!(result, Err(ValidationError::DuplicateInterest));
    }

    #[test]
    fn rejects_interest_with_wrong_character_length() {
        let rules = Rules {
            interest_char_len: Some(2),
            ..two_interest_rules()
        };
        let result = validate(&rules, &submission("Ann", &["旅游", "唱"]), &[]);
        assert_eq!(
            result,
            Err(ValidationError::WrongInterestLength { expected: 2 })
        );
        // Two CJK characters count as length 2, not byte length.
        assert!(validate(&rules, &submission("Ann", &["旅游", "唱歌"]), &[]).is_ok());
    }

    #[test]
    fn accepts_five_interests_under_default_rules() {
        let rules = Rules::default();
        let record = validate(
            &rules,
            &submission("Ann", &["a", "b", "c", "d", "e"]),
            &[],
        )
        .expect("should accept");
        assert_eq!(record.interests.len(), 5);
    }
}
