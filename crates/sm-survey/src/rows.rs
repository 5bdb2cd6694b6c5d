//! Tabular survey definitions
//!
//! Consumes rows that an external tokenizer has already split into cells. The
//! first row is the header; every following row carries one option of a
//! question. A non-blank `QUESTION` cell that differs from the current question
//! declares a new question, a blank one continues the current question.

use crate::builder::{SurveyBuilder, DEFAULT_BLOCK};
use crate::correlation::CorrelationRelation;
use crate::error::ParseError;
use crate::model::Survey;
use std::collections::HashMap;

/// Recognized header columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Question identifier (required)
    Question,
    /// Option identifier (required)
    Options,
    /// Question display text
    QText,
    /// Option display content
    OText,
    /// Containing block id, dotted for sub-blocks
    Block,
    /// Branch destination for the row's option
    Branch,
    /// Correlation group, `key` or `key:reverse`
    Correlation,
    /// Whether the question's block is randomized
    Randomize,
    /// Whether the question may be shuffled within its block
    Shuffle,
}

impl Column {
    const ALL: [Column; 9] = [
        Column::Question,
        Column::Options,
        Column::QText,
        Column::OText,
        Column::Block,
        Column::Branch,
        Column::Correlation,
        Column::Randomize,
        Column::Shuffle,
    ];

    /// Header spelling
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Question => "QUESTION",
            Self::Options => "OPTIONS",
            Self::QText => "QTEXT",
            Self::OText => "OTEXT",
            Self::Block => "BLOCK",
            Self::Branch => "BRANCH",
            Self::Correlation => "CORRELATION",
            Self::Randomize => "RANDOMIZE",
            Self::Shuffle => "SHUFFLE",
        }
    }

    fn parse(header: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(header.trim()))
    }
}

/// Column layout declared by the header row
#[derive(Debug, Clone)]
pub struct Schema {
    width: usize,
    positions: HashMap<Column, usize>,
}

impl Schema {
    /// Interpret a header row
    ///
    /// # Errors
    /// Unknown, duplicate or missing required columns
    pub fn from_header<C: AsRef<str>>(header: &[C]) -> Result<Self, ParseError> {
        let mut positions = HashMap::new();
        for (i, cell) in header.iter().enumerate() {
            let name = cell.as_ref().trim();
            let column = Column::parse(name).ok_or_else(|| ParseError::UnknownColumn {
                column: name.to_string(),
            })?;
            if positions.insert(column, i).is_some() {
                return Err(ParseError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
        }
        for required in [Column::Question, Column::Options] {
            if !positions.contains_key(&required) {
                return Err(ParseError::MissingColumn {
                    column: required.name(),
                });
            }
        }
        Ok(Self {
            width: header.len(),
            positions,
        })
    }

    /// Number of columns every row must have
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the header declares a column
    #[inline]
    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }

    fn cell<'r, C: AsRef<str>>(&self, row: &'r [C], column: Column) -> &'r str {
        self.positions
            .get(&column)
            .and_then(|&i| row.get(i))
            .map_or("", |c| c.as_ref().trim())
    }
}

/// Build a survey from tokenized rows (header first)
///
/// Rows whose cells are all blank are skipped.
///
/// # Errors
/// The first structural problem found, wrapped with its 1-based line number
/// where it is tied to a row
pub fn build<I, R, C>(rows: I) -> Result<Survey, ParseError>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[C]>,
    C: AsRef<str>,
{
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or(ParseError::EmptyInput)?;
    let schema = Schema::from_header(header.as_ref()).map_err(|e| e.at_line(1))?;

    let mut reader = RowReader {
        schema: &schema,
        builder: SurveyBuilder::new(),
        current: None,
    };
    for (i, row) in rows.enumerate() {
        let row = row.as_ref();
        if row.iter().all(|c| c.as_ref().trim().is_empty()) {
            continue;
        }
        reader.read(row).map_err(|e| e.at_line(i + 2))?;
    }
    reader.builder.build()
}

struct Current {
    question: String,
    block: String,
}

struct RowReader<'s> {
    schema: &'s Schema,
    builder: SurveyBuilder,
    current: Option<Current>,
}

impl RowReader<'_> {
    fn read<C: AsRef<str>>(&mut self, row: &[C]) -> Result<(), ParseError> {
        if row.len() != self.schema.width() {
            return Err(ParseError::ColumnCount {
                expected: self.schema.width(),
                found: row.len(),
            });
        }
        let cell = |column| self.schema.cell(row, column);
        let question = cell(Column::Question);
        let block = cell(Column::Block);

        let declares = !question.is_empty()
            && self
                .current
                .as_ref()
                .map_or(true, |current| current.question != question);

        if declares {
            let block = if block.is_empty() {
                self.current
                    .as_ref()
                    .map_or(DEFAULT_BLOCK, |current| current.block.as_str())
                    .to_string()
            } else {
                block.to_string()
            };
            self.builder
                .add_question(&block, question, cell(Column::QText))?;
            let randomize = cell(Column::Randomize);
            if !randomize.is_empty() {
                self.builder
                    .add_block(&block, parse_flag(Column::Randomize, randomize)?)?;
            }
            let shuffle = cell(Column::Shuffle);
            if !shuffle.is_empty() {
                self.builder
                    .set_shuffle(question, parse_flag(Column::Shuffle, shuffle)?)?;
            }
            self.current = Some(Current {
                question: question.to_string(),
                block,
            });
        } else if let Some(current) = &self.current {
            if !block.is_empty() && block != current.block {
                return Err(ParseError::InvalidCell {
                    column: "BLOCK",
                    value: block.to_string(),
                });
            }
        } else {
            return Err(ParseError::OrphanRow);
        }

        let Some(current) = self.current.as_ref() else {
            return Err(ParseError::OrphanRow);
        };
        let question = current.question.clone();

        let correlation = cell(Column::Correlation);
        if !correlation.is_empty() {
            let (key, relation) = match correlation.split_once(':') {
                Some((key, relation)) => (key.trim(), relation.parse()?),
                None => (correlation, CorrelationRelation::SameIndex),
            };
            self.builder.correlate(key, relation, &[question.as_str()])?;
        }

        let option = cell(Column::Options);
        let branch = cell(Column::Branch);
        if option.is_empty() {
            if !branch.is_empty() || !cell(Column::OText).is_empty() {
                return Err(ParseError::InvalidCell {
                    column: "OPTIONS",
                    value: String::new(),
                });
            }
            return Ok(());
        }
        self.builder
            .add_option(&question, option, cell(Column::OText))?;
        if !branch.is_empty() {
            self.builder
                .add_branch(&question, option, branch.parse()?)?;
        }
        Ok(())
    }
}

fn parse_flag(column: Column, value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(ParseError::InvalidCell {
            column: column.name(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::QuestionId;

    fn table(lines: &[&str]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|l| l.split(',').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn reads_questions_and_options() {
        let survey = build(table(&[
            "QUESTION,OPTIONS,QTEXT,OTEXT",
            "q1,a,Favourite colour?,Red",
            ",b,,Blue",
            "q1,c,,Green",
            "q2,yes,,",
            ",no,,",
        ]))
        .unwrap();

        let q1 = survey.question("q1").unwrap();
        assert_eq!(q1.text(), "Favourite colour?");
        assert_eq!(q1.option_count(), 3);
        assert_eq!(q1.option("b").unwrap().content(), "Blue");
        assert_eq!(survey.question("q2").unwrap().option_at(1).unwrap().content(), "no");
    }

    #[test]
    fn header_is_case_insensitive_and_reorderable() {
        let survey = build(table(&["options,question", "a,q1", "b,"])).unwrap();
        assert_eq!(survey.question("q1").unwrap().option_count(), 2);
    }

    #[test]
    fn missing_required_column() {
        let err = build(table(&["QUESTION,QTEXT", "q1,x"])).unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert_eq!(
            err.root(),
            &ParseError::MissingColumn { column: "OPTIONS" }
        );
    }

    #[test]
    fn unknown_and_duplicate_columns() {
        assert!(matches!(
            build(table(&["QUESTION,OPTIONS,COLOUR"])).unwrap_err().root(),
            ParseError::UnknownColumn { .. }
        ));
        assert!(matches!(
            build(table(&["QUESTION,OPTIONS,question"])).unwrap_err().root(),
            ParseError::DuplicateColumn { .. }
        ));
    }

    #[test]
    fn column_count_mismatch_reports_line() {
        let err = build(table(&["QUESTION,OPTIONS", "q1,a", "q2,b,extra"])).unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert_eq!(
            err.root(),
            &ParseError::ColumnCount {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn repeated_question_is_rejected() {
        let err = build(table(&["QUESTION,OPTIONS", "q1,a", "q2,b", "q1,c"])).unwrap_err();
        assert_eq!(err.line(), Some(4));
        assert_eq!(err.root(), &ParseError::DuplicateQuestion { id: "q1".into() });
    }

    #[test]
    fn continuation_before_declaration() {
        let err = build(table(&["QUESTION,OPTIONS", ",a"])).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.root(), &ParseError::OrphanRow);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let survey = build(table(&["QUESTION,OPTIONS", "q1,a", ",", "q2,b"])).unwrap();
        assert_eq!(survey.len(), 2);
    }

    #[test]
    fn empty_input() {
        let rows: Vec<Vec<String>> = Vec::new();
        assert_eq!(build(rows).unwrap_err(), ParseError::EmptyInput);
        assert_eq!(
            build(table(&["QUESTION,OPTIONS"])).unwrap_err(),
            ParseError::EmptyInput
        );
    }

    #[test]
    fn correlation_column() {
        let survey = build(table(&[
            "QUESTION,OPTIONS,CORRELATION",
            "q1,a,trust",
            ",b,",
            "q2,a,",
            ",b,",
            "q3,a,trust",
            ",b,",
        ]))
        .unwrap();
        let group = survey.correlation_of("q1").unwrap();
        let members: Vec<&str> = group.members().iter().map(QuestionId::as_str).collect();
        assert_eq!(members, vec!["q1", "q3"]);
        assert_eq!(group.relation(), CorrelationRelation::SameIndex);
    }

    #[test]
    fn reverse_correlation_column() {
        let survey = build(table(&[
            "QUESTION,OPTIONS,CORRELATION",
            "q1,a,mood",
            ",b,",
            "q2,a,mood:reverse",
            ",b,",
        ]))
        .unwrap();
        assert_eq!(
            survey.correlation_of("q2").unwrap().relation(),
            CorrelationRelation::ReverseIndex
        );
    }

    #[test]
    fn singleton_correlation_is_malformed() {
        let err = build(table(&[
            "QUESTION,OPTIONS,CORRELATION",
            "q1,a,solo",
            "q2,a,",
        ]))
        .unwrap_err();
        assert!(matches!(err, ParseError::MalformedCorrelation { .. }));
    }

    #[test]
    fn blocks_branches_and_randomize() {
        let survey = build(table(&[
            "QUESTION,OPTIONS,BLOCK,BRANCH,RANDOMIZE",
            "q1,a,1,3,false",
            ",b,,NEXT,",
            "q2,a,2,,true",
            "q3,a,3,,",
        ]))
        .unwrap();
        assert!(survey.question("q1").unwrap().is_branching());
        assert!(survey.block("2").unwrap().randomize());
        assert!(!survey.block("1").unwrap().randomize());
        assert_eq!(survey.question("q3").unwrap().block().as_str(), "3");
    }

    #[test]
    fn blank_block_inherits_current() {
        let survey = build(table(&["QUESTION,OPTIONS,BLOCK", "q1,a,2", "q2,a,"])).unwrap();
        assert_eq!(survey.question("q2").unwrap().block().as_str(), "2");
    }

    #[test]
    fn continuation_cannot_switch_block() {
        let err = build(table(&["QUESTION,OPTIONS,BLOCK", "q1,a,1", ",b,2"])).unwrap_err();
        assert!(matches!(err.root(), ParseError::InvalidCell { column: "BLOCK", .. }));
    }

    #[test]
    fn bad_randomize_flag() {
        let err = build(table(&["QUESTION,OPTIONS,RANDOMIZE", "q1,a,maybe"])).unwrap_err();
        assert!(matches!(
            err.root(),
            ParseError::InvalidCell {
                column: "RANDOMIZE",
                ..
            }
        ));
    }

    #[test]
    fn shuffle_column_fixes_questions() {
        let survey = build(table(&[
            "QUESTION,OPTIONS,SHUFFLE",
            "q1,a,no",
            ",b,",
            "q2,a,",
            "q3,a,true",
        ]))
        .unwrap();
        assert!(!survey.question("q1").unwrap().shuffle());
        assert!(survey.question("q2").unwrap().shuffle());
        assert!(survey.question("q3").unwrap().shuffle());

        let err = build(table(&["QUESTION,OPTIONS,SHUFFLE", "q1,a,sometimes"])).unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(matches!(err.root(), ParseError::InvalidCell { column: "SHUFFLE", .. }));
    }

    #[test]
    fn empty_block_segment_is_rejected() {
        let err = build(table(&["QUESTION,OPTIONS,BLOCK", "q1,a,1", "q2,a,1..2"])).unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert!(matches!(
            err.root(),
            ParseError::InvalidIdentifier { kind: "block", .. }
        ));
    }
}
