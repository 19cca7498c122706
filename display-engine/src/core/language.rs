//! Survey language selection.

use serde::Serialize;

use crate::state::Survey;

/// Outcome of resolving a requested language against a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "code")]
pub enum LanguageSelection {
    /// Render in the survey's default language.
    Default,
    /// Render in the given enabled, non-default language.
    Code(String),
}

/// Code of the language flagged as the survey default.
pub fn get_default_language_code(survey: &Survey) -> Option<&str> {
    survey
        .languages
        .iter()
        .find(|entry| entry.default)
        .map(|entry| entry.language.code.as_str())
}

/// Resolve `requested` (code or alias, case-insensitive) for `survey`.
///
/// No request, or a request naming the default language, selects
/// [`LanguageSelection::Default`]. Unknown or disabled languages yield `None`.
pub fn get_language_code(survey: &Survey, requested: Option<&str>) -> Option<LanguageSelection> {
    let Some(requested) = requested.filter(|value| !value.is_empty()) else {
        return Some(LanguageSelection::Default);
    };
    let selected = survey.languages.iter().find(|entry| {
        entry.language.code.eq_ignore_ascii_case(requested)
            || entry
                .language
                .alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(requested))
    })?;
    if selected.default {
        return Some(LanguageSelection::Default);
    }
    if !selected.enabled {
        return None;
    }
    Some(LanguageSelection::Code(selected.language.code.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DisplayOption, Language, SurveyLanguage};
    use crate::test_support::survey;

    fn lang(code: &str, alias: Option<&str>, default: bool, enabled: bool) -> SurveyLanguage {
        SurveyLanguage {
            language: Language {
                code: code.to_string(),
                alias: alias.map(str::to_string),
            },
            default,
            enabled,
        }
    }

    fn with_languages(languages: Vec<SurveyLanguage>) -> Survey {
        let mut multilingual = survey("s1", DisplayOption::DisplayOnce);
        multilingual.languages = languages;
        multilingual
    }

    #[test]
    fn default_language_code_is_flagged_entry() {
        let survey = with_languages(vec![
            lang("en", None, false, true),
            lang("fr", None, true, true),
        ]);
        assert_eq!(get_default_language_code(&survey), Some("fr"));
    }

    #[test]
    fn default_language_code_absent_without_flag() {
        let survey = with_languages(vec![
            lang("en", None, false, true),
            lang("fr", None, false, true),
        ]);
        assert_eq!(get_default_language_code(&survey), None);
    }

    #[test]
    fn no_request_selects_default() {
        let survey = with_languages(vec![lang("en", None, true, true)]);
        assert_eq!(get_language_code(&survey, None), Some(LanguageSelection::Default));
    }

    #[test]
    fn requesting_default_language_selects_default() {
        let survey = with_languages(vec![
            lang("en", None, true, true),
            lang("fr", None, false, true),
        ]);
        assert_eq!(
            get_language_code(&survey, Some("en")),
            Some(LanguageSelection::Default)
        );
    }

    #[test]
    fn unknown_or_disabled_language_is_none() {
        let survey = with_languages(vec![
            lang("en", None, true, true),
            lang("fr", None, false, false),
        ]);
        assert_eq!(get_language_code(&survey, Some("fr")), None);
        assert_eq!(get_language_code(&survey, Some("de")), None);
    }

    #[test]
    fn matches_code_or_alias_case_insensitively() {
        let survey = with_languages(vec![
            lang("en", Some("English"), true, true),
            lang("fr", Some("fr-FR"), false, true),
        ]);
        let french = Some(LanguageSelection::Code("fr".to_string()));
        assert_eq!(get_language_code(&survey, Some("fr")), french);
        assert_eq!(get_language_code(&survey, Some("fr-FR")), french);
        assert_eq!(get_language_code(&survey, Some("FR")), french);
    }

    #[test]
    fn mixed_case_codes_match_any_spelling() {
        let survey = with_languages(vec![
            lang("en", None, true, true),
            lang("zh-Hans", None, false, true),
        ]);
        let chinese = Some(LanguageSelection::Code("zh-Hans".to_string()));
        assert_eq!(get_language_code(&survey, Some("zh-Hans")), chinese);
        assert_eq!(get_language_code(&survey, Some("ZH-hans")), chinese);
        assert_eq!(
            get_language_code(&survey, Some("EN")),
            Some(LanguageSelection::Default)
        );
    }
}
