//! Form input and outbound request types for topicgen

use std::fmt;
use serde::{Deserialize, Serialize};
use log::debug;
use crate::error::Error;

/// Sampling temperature sent with every request
pub const TEMPERATURE: f32 = 0.7;

/// Upper bound on generated tokens sent with every request
pub const MAX_OUTPUT_TOKENS: u32 = 800;

/// Reasoning budget for Gemini models that support thinking
pub const THINKING_BUDGET: u32 = 256;

/// Academic level the topics are targeted at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize)]
pub enum AcademicLevel
{   #[default]
    Masters
  , Doctorate
}

impl AcademicLevel
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   AcademicLevel::Masters => "Masters"
          , AcademicLevel::Doctorate => "Doctorate"
        }
    }
}

impl fmt::Display for AcademicLevel
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// A selectable option as shown by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption
{   pub label: &'static str
  , pub value: &'static str
}

/// Options for the academic level radio group
pub const ACADEMIC_LEVEL_OPTIONS: &[SelectOption] = &[
  SelectOption { label: "Master's degree", value: "Masters" }
, SelectOption { label: "Doctorate (PhD)", value: "Doctorate" }
];

/// Closed catalog of fields of study offered by the form
pub const FIELD_OF_STUDY_OPTIONS: &[SelectOption] = &[
  SelectOption
  { label: "Computer Engineering", value: "Computer Engineering" }
, SelectOption
  { label: "Electrical Engineering", value: "Electrical Engineering" }
, SelectOption
  { label: "Mechanical Engineering", value: "Mechanical Engineering" }
, SelectOption
  { label: "Civil Engineering", value: "Civil Engineering" }
, SelectOption
  { label: "Industrial Engineering", value: "Industrial Engineering" }
, SelectOption
  { label: "Chemical Engineering", value: "Chemical Engineering" }
, SelectOption
  { label: "Computer Science", value: "Computer Science" }
, SelectOption
  { label: "Mathematics", value: "Mathematics" }
, SelectOption
  { label: "Physics", value: "Physics" }
, SelectOption
  { label: "Chemistry", value: "Chemistry" }
, SelectOption
  { label: "Biology", value: "Biology" }
, SelectOption
  { label: "Medicine", value: "Medicine" }
, SelectOption
  { label: "Psychology", value: "Psychology" }
, SelectOption
  { label: "Economics", value: "Economics" }
, SelectOption
  { label: "Management", value: "Management" }
, SelectOption
  { label: "Law", value: "Law" }
, SelectOption
  { label: "Sociology", value: "Sociology" }
, SelectOption
  { label: "Linguistics", value: "Linguistics" }
];

/// Look up a field of study by its option value
pub fn find_field(value: &str) -> Option<&'static SelectOption>
{   FIELD_OF_STUDY_OPTIONS.iter().find(|o| o.value == value)
}

impl std::str::FromStr for AcademicLevel
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim()
        {   "Masters" | "masters" | "MSc" | "msc" => {
              Ok(AcademicLevel::Masters)
            }
          , "Doctorate" | "doctorate" | "PhD" | "phd" => {
              Ok(AcademicLevel::Doctorate)
            }
          , other => Err(Error::Validation(format!(
              "Unknown academic level: {}", other
            )))
        }
    }
}

/// One user submission from the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest
{   /// Free-text keywords
    pub keywords: String
  , /// Value from the field of study catalog
    pub field_of_study: String
  , pub academic_level: AcademicLevel
}

impl GenerationRequest
{   pub fn new(
      keywords: impl Into<String>
    , field_of_study: impl Into<String>
    , academic_level: AcademicLevel
    ) -> Self
    {   GenerationRequest
        {   keywords: keywords.into()
          , field_of_study: field_of_study.into()
          , academic_level
        }
    }

    /// Check the submission before anything goes on the wire.
    /// Keywords may not be blank and the field must come from
    /// the catalog.
    pub fn validate(&self) -> Result<(), Error>
    {   if self.keywords.trim().is_empty()
          || self.field_of_study.is_empty()
        {   debug!("Rejecting submission with missing input");
            return Err(Error::Validation(
              "Please enter keywords and choose a field of study."
                .to_string()
            ));
        }
        if find_field(&self.field_of_study).is_none()
        {   debug!(
              "Rejecting unknown field of study: {}",
              self.field_of_study
            );
            return Err(Error::Validation(format!(
              "Unknown field of study: {}",
              self.field_of_study
            )));
        }
        Ok(())
    }
}

/// Backend-agnostic shape of the single outbound call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest
{   pub system_instruction: String
  , pub user_content: String
  , pub temperature: f32
  , pub max_output_tokens: u32
}

impl CompletionRequest
{   /// Wrap a built prompt with the fixed deployment settings
    pub fn new(
      system_instruction: impl Into<String>
    , user_content: impl Into<String>
    ) -> Self
    {   CompletionRequest
        {   system_instruction: system_instruction.into()
          , user_content: user_content.into()
          , temperature: TEMPERATURE
          , max_output_tokens: MAX_OUTPUT_TOKENS
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn blank_keywords_fail_validation()
    {   let req = GenerationRequest::new(
          "   \n",
          "Computer Engineering",
          AcademicLevel::Masters
        );
        let err = req.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn empty_field_fails_validation()
    {   let req = GenerationRequest::new(
          "deep learning", "", AcademicLevel::Doctorate
        );
        assert_eq!(
          req.validate().unwrap_err().kind(),
          ErrorKind::Validation
        );
    }

    #[test]
    fn field_outside_catalog_fails_validation()
    {   let req = GenerationRequest::new(
          "deep learning", "Astrology", AcademicLevel::Masters
        );
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("Astrology"));
    }

    #[test]
    fn catalog_field_passes()
    {   let req = GenerationRequest::new(
          "deep learning",
          "Computer Engineering",
          AcademicLevel::Masters
        );
        assert!(req.validate().is_ok());
    }

    #[test]
    fn level_options_match_variants()
    {   for opt in ACADEMIC_LEVEL_OPTIONS
        {   let level: AcademicLevel = opt.value.parse().unwrap();
            assert_eq!(level.as_str(), opt.value);
        }
        assert!("bachelor".parse::<AcademicLevel>().is_err());
    }

    #[test]
    fn outbound_request_uses_deployment_constants()
    {   let req = CompletionRequest::new("sys", "user");
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_output_tokens, 800);
    }
}
