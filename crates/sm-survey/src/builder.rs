//! Survey construction
//!
//! [`SurveyBuilder`] accumulates blocks, questions, options, branches and
//! correlation declarations, then validates everything at once in
//! [`SurveyBuilder::build`]. The tabular reader in [`crate::rows`] drives the same
//! builder, so both paths share one set of rules.

use crate::branch::{BranchDestination, BranchMap};
use crate::correlation::{CorrelationGroup, CorrelationRelation};
use crate::error::ParseError;
use crate::ids::{BlockId, CorrelationKey, OptionId, QuestionId};
use crate::model::{Block, Question, Survey, SurveyOption};
use std::collections::{HashMap, HashSet};

/// Block that receives questions when none is named
pub const DEFAULT_BLOCK: &str = "1";

#[derive(Debug)]
struct BlockDraft {
    id: BlockId,
    randomize: bool,
    questions: Vec<QuestionId>,
}

#[derive(Debug)]
struct QuestionDraft {
    id: QuestionId,
    text: String,
    block: BlockId,
    options: Vec<SurveyOption>,
    branches: Vec<(OptionId, BranchDestination)>,
    shuffle: bool,
}

#[derive(Debug)]
struct CorrelationDraft {
    key: CorrelationKey,
    relation: CorrelationRelation,
    members: Vec<QuestionId>,
}

/// Incremental survey builder
#[derive(Debug)]
pub struct SurveyBuilder {
    breakoff: bool,
    blocks: Vec<BlockDraft>,
    questions: Vec<QuestionDraft>,
    index: HashMap<QuestionId, usize>,
    correlations: Vec<CorrelationDraft>,
}

impl Default for SurveyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyBuilder {
    /// Create an empty builder (breakoff allowed)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            breakoff: true,
            blocks: Vec::new(),
            questions: Vec::new(),
            index: HashMap::new(),
            correlations: Vec::new(),
        }
    }

    /// With breakoff flag
    #[inline]
    #[must_use]
    pub fn with_breakoff(mut self, breakoff: bool) -> Self {
        self.breakoff = breakoff;
        self
    }

    /// Set breakoff flag in place
    #[inline]
    pub fn set_breakoff(&mut self, breakoff: bool) {
        self.breakoff = breakoff;
    }

    /// Number of declared questions
    #[inline]
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Whether a question has been declared
    #[inline]
    #[must_use]
    pub fn contains_question(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Declare a block (and any missing ancestors of a dotted id)
    ///
    /// Declaring an existing block again only ever turns `randomize` on.
    ///
    /// # Errors
    /// `ParseError::InvalidIdentifier` for a malformed block id
    pub fn add_block(&mut self, id: &str, randomize: bool) -> Result<BlockId, ParseError> {
        let id = BlockId::new(id)?;
        for ancestor in id.lineage() {
            if !self.blocks.iter().any(|b| b.id == ancestor) {
                self.blocks.push(BlockDraft {
                    id: ancestor,
                    randomize: false,
                    questions: Vec::new(),
                });
            }
        }
        if randomize {
            if let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) {
                block.randomize = true;
            }
        }
        Ok(id)
    }

    /// Declare a question in a block
    ///
    /// # Errors
    /// - `ParseError::InvalidIdentifier` / `ReservedIdentifier` for a bad id
    /// - `ParseError::DuplicateQuestion` if the id is already declared
    pub fn add_question(&mut self, block: &str, id: &str, text: &str) -> Result<(), ParseError> {
        let id = QuestionId::new(id)?;
        if id.is_reserved() {
            return Err(ParseError::ReservedIdentifier { id: id.to_string() });
        }
        if self.index.contains_key(&id) {
            return Err(ParseError::DuplicateQuestion { id: id.to_string() });
        }
        let block = self.add_block(block, false)?;
        if let Some(draft) = self.blocks.iter_mut().find(|b| b.id == block) {
            draft.questions.push(id.clone());
        }
        self.index.insert(id.clone(), self.questions.len());
        self.questions.push(QuestionDraft {
            text: if text.is_empty() {
                id.to_string()
            } else {
                text.to_string()
            },
            id,
            block,
            options: Vec::new(),
            branches: Vec::new(),
            shuffle: true,
        });
        Ok(())
    }

    /// Allow or forbid shuffling a declared question within its block
    ///
    /// # Errors
    /// `ParseError::UndeclaredQuestion` if the question is unknown
    pub fn set_shuffle(&mut self, question: &str, shuffle: bool) -> Result<(), ParseError> {
        self.draft_mut(question)?.shuffle = shuffle;
        Ok(())
    }

    fn draft_mut(&mut self, question: &str) -> Result<&mut QuestionDraft, ParseError> {
        match self.index.get(question) {
            Some(&i) => Ok(&mut self.questions[i]),
            None => Err(ParseError::UndeclaredQuestion {
                id: question.to_string(),
            }),
        }
    }

    /// Append an option to a declared question
    ///
    /// Empty `content` defaults to the option id.
    ///
    /// # Errors
    /// - `ParseError::UndeclaredQuestion` if the question is unknown
    /// - `ParseError::DuplicateOption` if the question already has this option
    pub fn add_option(&mut self, question: &str, id: &str, content: &str) -> Result<(), ParseError> {
        let id = OptionId::new(id)?;
        let draft = self.draft_mut(question)?;
        if draft.options.iter().any(|o| *o.id() == id) {
            return Err(ParseError::DuplicateOption {
                question: draft.id.to_string(),
                option: id.to_string(),
            });
        }
        let content = if content.is_empty() {
            id.to_string()
        } else {
            content.to_string()
        };
        draft.options.push(SurveyOption::new(id, content));
        Ok(())
    }

    /// Route an option of a question to a destination
    ///
    /// Marks the question as branching. Destinations are checked in [`build`](Self::build).
    ///
    /// # Errors
    /// `ParseError::UndeclaredQuestion` / `UnknownOption` for unknown references
    pub fn add_branch(
        &mut self,
        question: &str,
        option: &str,
        destination: BranchDestination,
    ) -> Result<(), ParseError> {
        let draft = self.draft_mut(question)?;
        let Some(option) = draft.options.iter().find(|o| o.id().as_str() == option) else {
            return Err(ParseError::UnknownOption {
                question: question.to_string(),
                option: option.to_string(),
            });
        };
        let option = option.id().clone();
        match draft.branches.iter_mut().find(|(id, _)| *id == option) {
            Some(entry) => entry.1 = destination,
            None => draft.branches.push((option, destination)),
        }
        Ok(())
    }

    /// Add members to a correlation group, creating it on first use
    ///
    /// Members may be declared before the questions exist; unknown members are
    /// reported by [`build`](Self::build).
    ///
    /// # Errors
    /// - `ParseError::InvalidIdentifier` for malformed keys or member ids
    /// - `ParseError::MalformedCorrelation` if the group was declared with a different relation
    pub fn correlate(
        &mut self,
        key: &str,
        relation: CorrelationRelation,
        members: &[&str],
    ) -> Result<(), ParseError> {
        let key = CorrelationKey::new(key)?;
        let members = members
            .iter()
            .map(|m| QuestionId::new(*m))
            .collect::<Result<Vec<_>, _>>()?;

        match self.correlations.iter_mut().find(|c| c.key == key) {
            Some(draft) if draft.relation != relation => Err(ParseError::MalformedCorrelation {
                group: key.to_string(),
                reason: format!("declared as both {} and {relation}", draft.relation),
            }),
            Some(draft) => {
                draft.members.extend(members);
                Ok(())
            }
            None => {
                self.correlations.push(CorrelationDraft {
                    key,
                    relation,
                    members,
                });
                Ok(())
            }
        }
    }

    /// Validate everything and produce the survey
    ///
    /// # Errors
    /// Any structural problem, see [`ParseError`]
    pub fn build(self) -> Result<Survey, ParseError> {
        if self.questions.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        if let Some(empty) = self.questions.iter().find(|q| q.options.is_empty()) {
            return Err(ParseError::EmptyQuestion {
                id: empty.id.to_string(),
            });
        }

        let blocks: Vec<Block> = self
            .blocks
            .iter()
            .filter(|b| b.id.is_top_level())
            .map(|b| assemble_block(b, &self.blocks))
            .collect();

        let mut order = Vec::with_capacity(self.questions.len());
        for block in &blocks {
            flatten(block, &mut order);
        }
        let position: HashMap<&QuestionId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let correlations = self.resolve_correlations(&position)?;

        let mut questions: Vec<Option<Question>> = Vec::new();
        questions.resize_with(self.questions.len(), || None);
        for draft in self.questions {
            let branch_map = (!draft.branches.is_empty()).then(|| {
                let mut map = BranchMap::for_options(draft.options.iter().map(SurveyOption::id));
                for (option, destination) in draft.branches {
                    map.set(option, destination);
                }
                map
            });
            let slot = position[&draft.id];
            questions[slot] = Some(
                Question::new(draft.id, draft.text, draft.options, draft.block, branch_map)
                    .with_shuffle(draft.shuffle),
            );
        }
        let questions: Vec<Question> = questions.into_iter().flatten().collect();

        let survey = Survey::assemble(self.breakoff, blocks, questions, correlations)?;
        tracing::debug!(
            survey = %survey.id(),
            questions = survey.len(),
            correlations = survey.correlations().len(),
            "survey built"
        );
        Ok(survey)
    }

    fn resolve_correlations(
        &self,
        position: &HashMap<&QuestionId, usize>,
    ) -> Result<Vec<CorrelationGroup>, ParseError> {
        let mut claimed: HashMap<&QuestionId, &CorrelationKey> = HashMap::new();
        let mut groups = Vec::with_capacity(self.correlations.len());

        for draft in &self.correlations {
            let malformed = |reason: String| ParseError::MalformedCorrelation {
                group: draft.key.to_string(),
                reason,
            };

            let mut seen = HashSet::new();
            let mut members = Vec::new();
            for member in &draft.members {
                if !position.contains_key(member) {
                    return Err(ParseError::UnknownCorrelationTarget {
                        group: draft.key.to_string(),
                        question: member.to_string(),
                    });
                }
                if seen.insert(member) {
                    members.push(member.clone());
                }
            }
            if members.len() < 2 {
                return Err(malformed(format!(
                    "needs at least two distinct questions, found {}",
                    members.len()
                )));
            }
            members.sort_by_key(|m| position[m]);

            let counts: HashSet<usize> = members
                .iter()
                .map(|m| self.questions[self.index[m]].options.len())
                .collect();
            if counts.len() > 1 {
                return Err(malformed("members have different option counts".to_string()));
            }

            for member in &draft.members {
                if let Some(other) = claimed.insert(member, &draft.key) {
                    if *other != draft.key {
                        return Err(malformed(format!(
                            "question {member} already belongs to group {other}"
                        )));
                    }
                }
            }

            groups.push(CorrelationGroup::new(
                draft.key.clone(),
                draft.relation,
                members,
            ));
        }
        Ok(groups)
    }
}

fn assemble_block(draft: &BlockDraft, all: &[BlockDraft]) -> Block {
    let children = all
        .iter()
        .filter(|b| b.id.parent().as_ref() == Some(&draft.id))
        .map(|b| assemble_block(b, all))
        .collect();
    Block::new(
        draft.id.clone(),
        draft.randomize,
        draft.questions.clone(),
        children,
    )
}

fn flatten<'a>(block: &'a Block, out: &mut Vec<&'a QuestionId>) {
    out.extend(block.questions());
    for sub in block.sub_blocks() {
        flatten(sub, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchPolicy;

    fn with_questions(ids: &[(&str, &str, usize)]) -> SurveyBuilder {
        let mut b = SurveyBuilder::new();
        for (block, id, options) in ids {
            b.add_question(block, id, "").unwrap();
            for o in 0..*options {
                b.add_option(id, &format!("o{o}"), "").unwrap();
            }
        }
        b
    }

    #[test]
    fn builds_simple_survey() {
        let survey = with_questions(&[("1", "q1", 3), ("1", "q2", 2)]).build().unwrap();
        let ids: Vec<&str> = survey.question_ids().map(QuestionId::as_str).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
        assert_eq!(survey.question("q2").unwrap().option_count(), 2);
        assert_eq!(survey.question("q1").unwrap().text(), "q1");
        assert!(!survey.has_correlations());
        assert!(survey.breakoff());
    }

    #[test]
    fn flattens_blocks_depth_first() {
        let survey = with_questions(&[("2", "late", 1), ("1.1", "nested", 1), ("1", "top", 1)])
            .build()
            .unwrap();
        let ids: Vec<&str> = survey.question_ids().map(QuestionId::as_str).collect();
        assert_eq!(ids, vec!["late", "top", "nested"]);
        assert_eq!(survey.blocks().len(), 2);
        assert_eq!(survey.block("1.1").unwrap().questions().len(), 1);
    }

    #[test]
    fn rejects_duplicate_question() {
        let mut b = with_questions(&[("1", "q1", 1)]);
        assert_eq!(
            b.add_question("1", "q1", ""),
            Err(ParseError::DuplicateQuestion { id: "q1".into() })
        );
    }

    #[test]
    fn rejects_reserved_question() {
        let mut b = SurveyBuilder::new();
        assert!(matches!(
            b.add_question("1", "WorkerId", ""),
            Err(ParseError::ReservedIdentifier { .. })
        ));
    }

    #[test]
    fn rejects_option_on_undeclared_question() {
        let mut b = SurveyBuilder::new();
        assert!(matches!(
            b.add_option("ghost", "a", ""),
            Err(ParseError::UndeclaredQuestion { .. })
        ));
    }

    #[test]
    fn rejects_empty_question() {
        let b = with_questions(&[("1", "q1", 0)]);
        assert_eq!(b.build().unwrap_err(), ParseError::EmptyQuestion { id: "q1".into() });
    }

    #[test]
    fn rejects_empty_survey() {
        assert_eq!(SurveyBuilder::new().build().unwrap_err(), ParseError::EmptyInput);
    }

    #[test]
    fn correlation_members_follow_survey_order() {
        let mut b = with_questions(&[("1", "q1", 3), ("1", "q2", 3), ("1", "q3", 3)]);
        b.correlate("g", CorrelationRelation::SameIndex, &["q3", "q1", "q3"])
            .unwrap();
        let survey = b.build().unwrap();
        let group = survey.correlation_of("q3").unwrap();
        let members: Vec<&str> = group.members().iter().map(QuestionId::as_str).collect();
        assert_eq!(members, vec!["q1", "q3"]);
        assert!(survey.correlation_of("q2").is_none());
    }

    #[test]
    fn correlation_of_one_question_is_malformed() {
        let mut b = with_questions(&[("1", "q1", 3)]);
        b.correlate("g", CorrelationRelation::SameIndex, &["q1", "q1"])
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(ParseError::MalformedCorrelation { .. })
        ));
    }

    #[test]
    fn correlation_with_unknown_target() {
        let mut b = with_questions(&[("1", "q1", 3)]);
        b.correlate("g", CorrelationRelation::SameIndex, &["q1", "q9"])
            .unwrap();
        assert_eq!(
            b.build().unwrap_err(),
            ParseError::UnknownCorrelationTarget {
                group: "g".into(),
                question: "q9".into()
            }
        );
    }

    #[test]
    fn correlation_requires_equal_option_counts() {
        let mut b = with_questions(&[("1", "q1", 3), ("1", "q2", 4)]);
        b.correlate("g", CorrelationRelation::SameIndex, &["q1", "q2"])
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(ParseError::MalformedCorrelation { .. })
        ));
    }

    #[test]
    fn question_in_two_groups_is_malformed() {
        let mut b = with_questions(&[("1", "q1", 2), ("1", "q2", 2), ("1", "q3", 2)]);
        b.correlate("a", CorrelationRelation::SameIndex, &["q1", "q2"])
            .unwrap();
        b.correlate("b", CorrelationRelation::SameIndex, &["q2", "q3"])
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(ParseError::MalformedCorrelation { .. })
        ));
    }

    #[test]
    fn conflicting_relation_is_rejected() {
        let mut b = SurveyBuilder::new();
        b.correlate("g", CorrelationRelation::SameIndex, &["q1"]).unwrap();
        assert!(b
            .correlate("g", CorrelationRelation::ReverseIndex, &["q2"])
            .is_err());
    }

    #[test]
    fn branch_forward_is_accepted() {
        let mut b = with_questions(&[("1", "q1", 2), ("2", "q2", 1), ("3", "q3", 1)]);
        b.add_branch("q1", "o1", "3".parse().unwrap()).unwrap();
        let survey = b.build().unwrap();
        let map = survey.question("q1").unwrap().branch_map().unwrap();
        assert_eq!(map.get("o0"), Some(&BranchDestination::Next));
        assert_eq!(
            survey.blocks()[0].branch_policy(&survey).unwrap(),
            BranchPolicy::BranchOne
        );
    }

    #[test]
    fn branch_backward_is_rejected() {
        let mut b = with_questions(&[("1", "q1", 1), ("2", "q2", 1)]);
        b.add_branch("q2", "o0", "1".parse().unwrap()).unwrap();
        assert!(matches!(b.build(), Err(ParseError::BranchNotForward { .. })));
    }

    #[test]
    fn branch_to_sub_block_is_rejected() {
        let mut b = with_questions(&[("1", "q1", 1), ("2.1", "q2", 1)]);
        b.add_branch("q1", "o0", "2.1".parse().unwrap()).unwrap();
        assert!(matches!(
            b.build(),
            Err(ParseError::UnknownBranchTarget { .. })
        ));
    }

    #[test]
    fn branch_all_requires_same_destinations() {
        let mut b = with_questions(&[("1", "q1", 1), ("1", "q2", 1), ("2", "q3", 1), ("3", "q4", 1)]);
        b.add_branch("q1", "o0", "2".parse().unwrap()).unwrap();
        b.add_branch("q2", "o0", "3".parse().unwrap()).unwrap();
        assert!(matches!(
            b.build(),
            Err(ParseError::InvalidBranchPolicy { .. })
        ));
    }

    #[test]
    fn branch_all_with_matching_destinations() {
        let mut b = with_questions(&[("1", "q1", 1), ("1", "q2", 1), ("2", "q3", 1)]);
        b.add_branch("q1", "o0", "2".parse().unwrap()).unwrap();
        b.add_branch("q2", "o0", "2".parse().unwrap()).unwrap();
        let survey = b.build().unwrap();
        assert_eq!(
            survey.blocks()[0].branch_policy(&survey).unwrap(),
            BranchPolicy::BranchAll
        );
    }

    #[test]
    fn too_many_branching_questions() {
        let mut b = with_questions(&[
            ("1", "q1", 1),
            ("1", "q2", 1),
            ("1", "q3", 1),
            ("2", "q4", 1),
        ]);
        b.add_branch("q1", "o0", "2".parse().unwrap()).unwrap();
        b.add_branch("q2", "o0", "2".parse().unwrap()).unwrap();
        assert!(matches!(
            b.build(),
            Err(ParseError::InvalidBranchPolicy { .. })
        ));
    }

    #[test]
    fn branch_to_unknown_option() {
        let mut b = with_questions(&[("1", "q1", 1)]);
        assert!(matches!(
            b.add_branch("q1", "zz", BranchDestination::Next),
            Err(ParseError::UnknownOption { .. })
        ));
    }

    #[test]
    fn randomize_sticks() {
        let mut b = with_questions(&[("1", "q1", 1)]);
        b.add_block("1", true).unwrap();
        b.add_block("1", false).unwrap();
        let survey = b.build().unwrap();
        assert!(survey.block("1").unwrap().randomize());
    }

    #[test]
    fn malformed_block_path_adds_nothing() {
        let mut b = SurveyBuilder::new();
        for bad in [".1", "1..2", "2."] {
            assert!(matches!(
                b.add_block(bad, false),
                Err(ParseError::InvalidIdentifier { kind: "block", .. })
            ));
            assert!(b.add_question(bad, "q1", "").is_err());
        }
        assert!(b.blocks.is_empty());
        assert_eq!(b.question_count(), 0);
    }

    #[test]
    fn questions_shuffle_unless_fixed() {
        let mut b = with_questions(&[("1", "q1", 1), ("1", "q2", 1)]);
        b.set_shuffle("q2", false).unwrap();
        assert!(matches!(
            b.set_shuffle("ghost", false),
            Err(ParseError::UndeclaredQuestion { .. })
        ));
        let survey = b.build().unwrap();
        assert!(survey.question("q1").unwrap().shuffle());
        assert!(!survey.question("q2").unwrap().shuffle());
    }
}
