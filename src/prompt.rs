//! Prompt template and request builder

use log::{debug, trace};
use crate::error::Error;
use crate::request::GenerationRequest;

/// Fixed steering text sent as the system turn
pub const SYSTEM_INSTRUCTION: &str = "\
You are an experienced academic advisor who helps graduate students choose \
research topics. Suggest exactly 5 original, specific and feasible thesis \
topics. For each topic give a numbered title followed by a short paragraph \
explaining the research problem, its significance and a possible method. \
Answer in plain text without markdown headings.";

/// Default user-turn template
pub const USER_PROMPT_TEMPLATE: &str = "\
Suggest research topics for a {academicLevel} thesis in the field of \
{fieldOfStudy}. The student is interested in the following keywords: \
{keywords}";

const PLACEHOLDERS: [Slot; 3] = [
  Slot::Keywords
, Slot::FieldOfStudy
, Slot::AcademicLevel
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot
{   Keywords
  , FieldOfStudy
  , AcademicLevel
}

impl Slot
{   fn token(&self) -> &'static str
    {   match self
        {   Slot::Keywords => "{keywords}"
          , Slot::FieldOfStudy => "{fieldOfStudy}"
          , Slot::AcademicLevel => "{academicLevel}"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment
{   Text(String)
  , Slot(Slot)
}

/// A template with the three form placeholders, each present
/// exactly once. Parsed up front so rendering is a single pass
/// and user text is never re-scanned for placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate
{   segments: Vec<Segment>
}

impl PromptTemplate
{   /// Parse a template, checking every placeholder occurs once
    pub fn new(template: &str) -> Result<Self, Error>
    {   let mut segments = Vec::new();
        let mut rest = template;
        let mut literal = String::new();

        while !rest.is_empty()
        {   let hit = PLACEHOLDERS.iter()
              .find(|s| rest.starts_with(s.token()));
            match hit
            {   Some(slot) => {
                  if !literal.is_empty()
                  {   segments.push(Segment::Text(
                        std::mem::take(&mut literal)
                      ));
                  }
                  segments.push(Segment::Slot(*slot));
                  rest = &rest[slot.token().len()..];
                }
              , None => {
                  let mut chars = rest.chars();
                  if let Some(c) = chars.next()
                  {   literal.push(c);
                  }
                  rest = chars.as_str();
                }
            }
        }
        if !literal.is_empty()
        {   segments.push(Segment::Text(literal));
        }

        for slot in PLACEHOLDERS
        {   let count = segments.iter()
              .filter(|s| **s == Segment::Slot(slot))
              .count();
            if count != 1
            {   return Err(Error::Configuration(format!(
                  "prompt template must contain {} exactly once \
                   (found {})",
                  slot.token(), count
                )));
            }
        }

        debug!(
          "Parsed prompt template with {} segments",
          segments.len()
        );
        Ok(PromptTemplate { segments })
    }

    /// Substitute the request's fields into the template.
    /// Values are inserted verbatim.
    pub fn render(&self, request: &GenerationRequest) -> String
    {   let mut out = String::new();
        for segment in &self.segments
        {   match segment
            {   Segment::Text(text) => out.push_str(text)
              , Segment::Slot(Slot::Keywords) => {
                  out.push_str(&request.keywords)
                }
              , Segment::Slot(Slot::FieldOfStudy) => {
                  out.push_str(&request.field_of_study)
                }
              , Segment::Slot(Slot::AcademicLevel) => {
                  out.push_str(request.academic_level.as_str())
                }
            }
        }
        trace!("Rendered prompt: {}", out);
        out
    }
}

impl Default for PromptTemplate
{   fn default() -> Self
    {   // The built-in template holds each token once, so the
        // segments can be laid out directly.
        PromptTemplate
        {   segments: vec![
              Segment::Text(
                "Suggest research topics for a ".to_string()
              )
            , Segment::Slot(Slot::AcademicLevel)
            , Segment::Text(
                " thesis in the field of ".to_string()
              )
            , Segment::Slot(Slot::FieldOfStudy)
            , Segment::Text(
                ". The student is interested in the following \
                 keywords: ".to_string()
              )
            , Segment::Slot(Slot::Keywords)
            ]
        }
    }
}

/// Build the user turn for a request with the default template
pub fn build_prompt(request: &GenerationRequest) -> String
{   PromptTemplate::default().render(request)
}
