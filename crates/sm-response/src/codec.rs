//! Header + row text encoding of responses
//!
//! The header line is `WORKERID`, then every question id in survey order,
//! then a `CORRELATION` marker field when the survey declares correlation
//! groups. Each row carries the worker id, the selected option ids in header
//! order and, under the marker, the keys of the groups the response satisfies
//! joined by `;`. Every line ends with `\n`, so a header and its rows can be
//! concatenated directly.

use crate::error::{DecodingError, EncodingError};
use crate::response::{SurveyResponse, WorkerId};
use sm_survey::{OptionId, Question, Survey};
use std::io::{BufRead, Write};

/// Header field holding the worker id
pub const WORKER_FIELD: &str = "WORKERID";

/// Header field holding satisfied correlation groups
pub const CORRELATION_FIELD: &str = "CORRELATION";

/// Joins group keys inside the correlation cell
pub const CORRELATION_SEPARATOR: char = ';';

/// Default field separator
pub const DEFAULT_SEPARATOR: char = ',';

/// Response text codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCodec {
    separator: char,
}

impl Default for ResponseCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCodec {
    /// Codec using `,` between fields
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Codec using a custom field separator
    ///
    /// # Errors
    /// `InvalidSeparator` for line breaks, the correlation joiner and
    /// characters that may appear in identifiers
    pub fn with_separator(separator: char) -> Result<Self, EncodingError> {
        let usable = !(separator == CORRELATION_SEPARATOR
            || separator == '\n'
            || separator == '\r'
            || separator.is_alphanumeric()
            || matches!(separator, '_' | '-' | '.'));
        if usable {
            Ok(Self { separator })
        } else {
            Err(EncodingError::InvalidSeparator { separator })
        }
    }

    /// Field separator
    #[inline]
    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Header line for a survey
    #[must_use]
    pub fn output_headers(&self, survey: &Survey) -> String {
        let mut fields: Vec<&str> = Vec::with_capacity(survey.len() + 2);
        fields.push(WORKER_FIELD);
        fields.extend(survey.question_ids().map(|q| q.as_str()));
        if survey.has_correlations() {
            fields.push(CORRELATION_FIELD);
        }
        self.line(&fields)
    }

    /// Row line for one response
    ///
    /// # Errors
    /// When the response does not fit the survey, or its worker id contains
    /// the separator
    pub fn output_response(
        &self,
        survey: &Survey,
        response: &SurveyResponse,
    ) -> Result<String, EncodingError> {
        response.validate(survey)?;
        let worker = response.worker_id().as_str();
        if worker.contains(self.separator) {
            return Err(EncodingError::SeparatorInField {
                field: "worker id",
                value: worker.to_string(),
                separator: self.separator,
            });
        }

        let mut fields: Vec<String> = Vec::with_capacity(survey.len() + 2);
        fields.push(worker.to_string());
        for question in survey.questions() {
            let option = response
                .answer(question.id().as_str())
                .ok_or_else(|| EncodingError::MissingAnswer {
                    question: question.id().to_string(),
                })?;
            fields.push(option.to_string());
        }
        if survey.has_correlations() {
            let satisfied: Vec<&str> = survey
                .correlations()
                .values()
                .filter(|group| response.satisfies(survey, group))
                .map(|group| group.key().as_str())
                .collect();
            fields.push(satisfied.join(CORRELATION_SEPARATOR.to_string().as_str()));
        }
        Ok(self.line(&fields))
    }

    /// Write a header followed by every response
    ///
    /// # Errors
    /// On the first response that cannot be encoded, or a writer failure
    pub fn write_responses<'a, W, I>(
        &self,
        survey: &Survey,
        responses: I,
        mut writer: W,
    ) -> Result<(), EncodingError>
    where
        W: Write,
        I: IntoIterator<Item = &'a SurveyResponse>,
    {
        writer.write_all(self.output_headers(survey).as_bytes())?;
        let mut written = 0usize;
        for response in responses {
            writer.write_all(self.output_response(survey, response)?.as_bytes())?;
            written += 1;
        }
        writer.flush()?;
        tracing::debug!(survey = %survey.id(), rows = written, "responses written");
        Ok(())
    }

    /// Read a header line and the rows that follow it
    ///
    /// Question columns may appear in any order; blank lines are skipped.
    ///
    /// # Errors
    /// The first malformed line, or a reader failure
    pub fn read_responses<R: BufRead>(
        &self,
        survey: &Survey,
        reader: R,
    ) -> Result<Vec<SurveyResponse>, DecodingError> {
        self.decode(survey, reader).map_err(|err| {
            tracing::debug!(survey = %survey.id(), error = %err, "response decoding failed");
            err
        })
    }

    fn decode<R: BufRead>(
        &self,
        survey: &Survey,
        reader: R,
    ) -> Result<Vec<SurveyResponse>, DecodingError> {
        let mut lines = reader.lines().enumerate();

        let layout = loop {
            match lines.next() {
                None => return Err(DecodingError::MissingHeader),
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break Layout::from_header(survey, &self.split(&line))?;
                    }
                }
            }
        };

        let mut responses = Vec::new();
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            responses.push(layout.decode_row(survey, index + 1, &self.split(&line))?);
        }
        tracing::debug!(survey = %survey.id(), rows = responses.len(), "responses read");
        Ok(responses)
    }

    fn split<'l>(&self, line: &'l str) -> Vec<&'l str> {
        line.split(self.separator).map(str::trim).collect()
    }

    fn line<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let mut out = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            out.push_str(field.as_ref());
        }
        out.push('\n');
        out
    }
}

/// Column positions resolved from a header line
struct Layout {
    width: usize,
    /// Header column of each question, in survey order
    columns: Vec<usize>,
    marker: Option<usize>,
}

impl Layout {
    fn from_header(survey: &Survey, fields: &[&str]) -> Result<Self, DecodingError> {
        let mismatch = |reason: String| DecodingError::HeaderMismatch { reason };

        match fields.first() {
            Some(first) if first.eq_ignore_ascii_case(WORKER_FIELD) => {}
            _ => return Err(mismatch(format!("first field must be {WORKER_FIELD}"))),
        }

        let marker = fields
            .iter()
            .position(|f| f.eq_ignore_ascii_case(CORRELATION_FIELD));
        match (marker, survey.has_correlations()) {
            (None, true) => {
                return Err(mismatch(format!("missing {CORRELATION_FIELD} field")));
            }
            (Some(_), false) => {
                return Err(mismatch(format!(
                    "{CORRELATION_FIELD} field on a survey without correlation groups"
                )));
            }
            _ => {}
        }

        let mut columns = vec![usize::MAX; survey.len()];
        let question_index =
            |id: &str| survey.questions().iter().position(|q| q.id().as_str() == id);
        for (column, &field) in fields.iter().enumerate().skip(1) {
            if Some(column) == marker {
                continue;
            }
            let Some(index) = question_index(field) else {
                return Err(mismatch(format!("unknown question {field:?}")));
            };
            if columns[index] != usize::MAX {
                return Err(mismatch(format!("duplicate question {field:?}")));
            }
            columns[index] = column;
        }
        if let Some(missing) = columns.iter().position(|c| *c == usize::MAX) {
            return Err(mismatch(format!(
                "missing question {}",
                survey.questions()[missing].id()
            )));
        }

        Ok(Self {
            width: fields.len(),
            columns,
            marker,
        })
    }

    fn decode_row(
        &self,
        survey: &Survey,
        row: usize,
        fields: &[&str],
    ) -> Result<SurveyResponse, DecodingError> {
        if fields.len() != self.width {
            return Err(DecodingError::ColumnCount {
                row,
                expected: self.width,
                found: fields.len(),
            });
        }
        let worker = WorkerId::new(fields[0]).map_err(|_| DecodingError::EmptyWorker { row })?;

        let mut response = SurveyResponse::new(worker);
        for (question, &column) in survey.questions().iter().zip(&self.columns) {
            let option = Self::option(question, row, fields[column])?;
            response.insert(question.id().clone(), option);
        }

        if let Some(marker) = self.marker {
            for key in fields[marker]
                .split(CORRELATION_SEPARATOR)
                .map(str::trim)
                .filter(|k| !k.is_empty())
            {
                if !survey.correlations().contains_key(key) {
                    return Err(DecodingError::UnknownCorrelation {
                        row,
                        key: key.to_string(),
                    });
                }
            }
        }
        Ok(response)
    }

    fn option(question: &Question, row: usize, value: &str) -> Result<OptionId, DecodingError> {
        question
            .option(value)
            .map(|o| o.id().clone())
            .ok_or_else(|| DecodingError::UnknownOption {
                row,
                question: question.id().to_string(),
                option: value.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_survey::{CorrelationRelation, OptionId, QuestionId, SurveyBuilder};

    fn survey(correlated: bool) -> Survey {
        let mut b = SurveyBuilder::new();
        for id in ["q1", "q2"] {
            b.add_question("1", id, "").unwrap();
            b.add_option(id, "a", "").unwrap();
            b.add_option(id, "b", "").unwrap();
        }
        if correlated {
            b.correlate("g", CorrelationRelation::SameIndex, &["q1", "q2"])
                .unwrap();
        }
        b.build().unwrap()
    }

    fn response(worker: &str, q1: &str, q2: &str) -> SurveyResponse {
        SurveyResponse::new(WorkerId::new(worker).unwrap())
            .with_answer(QuestionId::new("q1").unwrap(), OptionId::new(q1).unwrap())
            .with_answer(QuestionId::new("q2").unwrap(), OptionId::new(q2).unwrap())
    }

    #[test]
    fn headers_with_and_without_marker() {
        let codec = ResponseCodec::new();
        assert_eq!(codec.output_headers(&survey(false)), "WORKERID,q1,q2\n");
        assert_eq!(
            codec.output_headers(&survey(true)),
            "WORKERID,q1,q2,CORRELATION\n"
        );
    }

    #[test]
    fn marker_lists_satisfied_groups() {
        let codec = ResponseCodec::new();
        let survey = survey(true);
        assert_eq!(
            codec
                .output_response(&survey, &response("w1", "b", "b"))
                .unwrap(),
            "w1,b,b,g\n"
        );
        assert_eq!(
            codec
                .output_response(&survey, &response("w1", "a", "b"))
                .unwrap(),
            "w1,a,b,\n"
        );
    }

    #[test]
    fn worker_with_separator_is_rejected() {
        let codec = ResponseCodec::new();
        let err = codec
            .output_response(&survey(false), &response("w,1", "a", "a"))
            .unwrap_err();
        assert!(matches!(err, EncodingError::SeparatorInField { .. }));
    }

    #[test]
    fn custom_separator() {
        let codec = ResponseCodec::with_separator('\t').unwrap();
        let survey = survey(false);
        let text = format!(
            "{}{}",
            codec.output_headers(&survey),
            codec
                .output_response(&survey, &response("w 1", "a", "b"))
                .unwrap()
        );
        assert_eq!(text, "WORKERID\tq1\tq2\nw 1\ta\tb\n");
        let read = codec.read_responses(&survey, text.as_bytes()).unwrap();
        assert_eq!(read, vec![response("w 1", "a", "b")]);

        assert!(ResponseCodec::with_separator(';').is_err());
        assert!(ResponseCodec::with_separator('x').is_err());
    }

    #[test]
    fn reordered_columns_decode() {
        let text = "WORKERID,q2,q1\nw1,b,a\n";
        let read = ResponseCodec::new()
            .read_responses(&survey(false), text.as_bytes())
            .unwrap();
        assert_eq!(read, vec![response("w1", "a", "b")]);
    }

    #[test]
    fn header_errors() {
        let codec = ResponseCodec::new();
        let s = survey(false);
        assert!(matches!(
            codec.read_responses(&s, "".as_bytes()),
            Err(DecodingError::MissingHeader)
        ));
        for header in [
            "q1,q2\n",
            "WORKERID,q1\n",
            "WORKERID,q1,q1\n",
            "WORKERID,q1,q2,q3\n",
            "WORKERID,q1,q2,CORRELATION\n",
        ] {
            assert!(
                matches!(
                    codec.read_responses(&s, header.as_bytes()),
                    Err(DecodingError::HeaderMismatch { .. })
                ),
                "{header}"
            );
        }
        assert!(matches!(
            codec.read_responses(&survey(true), "WORKERID,q1,q2\n".as_bytes()),
            Err(DecodingError::HeaderMismatch { .. })
        ));
    }

    #[test]
    fn row_errors_carry_line_numbers() {
        let codec = ResponseCodec::new();
        let s = survey(true);
        let cases = [
            ("WORKERID,q1,q2,CORRELATION\nw1,a\n", 2),
            ("WORKERID,q1,q2,CORRELATION\n\nw1,a,a,\n,a,a,\n", 4),
            ("WORKERID,q1,q2,CORRELATION\nw1,a,zz,\n", 2),
            ("WORKERID,q1,q2,CORRELATION\nw1,a,a,g\nw2,a,a,h\n", 3),
        ];
        for (text, line) in cases {
            let err = codec.read_responses(&s, text.as_bytes()).unwrap_err();
            assert_eq!(err.row(), Some(line), "{text}");
        }
    }
}
