//! Immutable survey model
//!
//! A [`Survey`] is produced by [`SurveyBuilder`](crate::SurveyBuilder) (directly or
//! from tabular rows) and never changes afterwards. Share it with `Arc<Survey>`.

use crate::branch::{BranchDestination, BranchMap, BranchPolicy};
use crate::correlation::CorrelationGroup;
use crate::error::ParseError;
use crate::ids::{BlockId, CorrelationKey, OptionId, QuestionId, SurveyId};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Answer option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyOption {
    id: OptionId,
    #[serde(rename = "otext")]
    content: String,
}

impl SurveyOption {
    pub(crate) fn new(id: OptionId, content: String) -> Self {
        Self { id, content }
    }

    /// Option identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    /// Opaque display content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Survey question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "qtext")]
    text: String,
    options: Vec<SurveyOption>,
    #[serde(skip)]
    block: BlockId,
    #[serde(rename = "branchMap", skip_serializing_if = "Option::is_none")]
    branch_map: Option<BranchMap>,
    shuffle: bool,
}

impl Question {
    pub(crate) fn new(
        id: QuestionId,
        text: String,
        options: Vec<SurveyOption>,
        block: BlockId,
        branch_map: Option<BranchMap>,
    ) -> Self {
        Self {
            id,
            text,
            options,
            block,
            branch_map,
            shuffle: true,
        }
    }

    pub(crate) fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Question identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// Display text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Options in declaration order
    #[inline]
    #[must_use]
    pub fn options(&self) -> &[SurveyOption] {
        &self.options
    }

    /// Number of options
    #[inline]
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Option by identifier
    #[must_use]
    pub fn option(&self, id: &str) -> Option<&SurveyOption> {
        self.options.iter().find(|o| o.id.as_str() == id)
    }

    /// Position of an option within this question
    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.options.iter().position(|o| o.id.as_str() == id)
    }

    /// Option at a position
    #[inline]
    #[must_use]
    pub fn option_at(&self, position: usize) -> Option<&SurveyOption> {
        self.options.get(position)
    }

    /// Containing block
    #[inline]
    #[must_use]
    pub fn block(&self) -> &BlockId {
        &self.block
    }

    /// Branch map, if this question branches
    #[inline]
    #[must_use]
    pub fn branch_map(&self) -> Option<&BranchMap> {
        self.branch_map.as_ref()
    }

    /// Whether this question branches
    #[inline]
    #[must_use]
    pub fn is_branching(&self) -> bool {
        self.branch_map.is_some()
    }

    /// Whether the question may be shuffled within its block (default true)
    #[inline]
    #[must_use]
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }
}

/// Block of questions with optional nested sub-blocks
///
/// Questions are listed before sub-blocks when the survey is flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    randomize: bool,
    questions: Vec<QuestionId>,
    sub_blocks: Vec<Block>,
}

impl Block {
    pub(crate) fn new(
        id: BlockId,
        randomize: bool,
        questions: Vec<QuestionId>,
        sub_blocks: Vec<Block>,
    ) -> Self {
        Self {
            id,
            randomize,
            questions,
            sub_blocks,
        }
    }

    /// Block identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &BlockId {
        &self.id
    }

    /// Whether presentation order may be shuffled (floating block)
    #[inline]
    #[must_use]
    pub fn randomize(&self) -> bool {
        self.randomize
    }

    /// Questions directly in this block
    #[inline]
    #[must_use]
    pub fn questions(&self) -> &[QuestionId] {
        &self.questions
    }

    /// Nested blocks
    #[inline]
    #[must_use]
    pub fn sub_blocks(&self) -> &[Block] {
        &self.sub_blocks
    }

    fn find(&self, id: &str) -> Option<&Block> {
        if self.id.as_str() == id {
            return Some(self);
        }
        self.sub_blocks.iter().find_map(|b| b.find(id))
    }

    /// Branch policy, validated recursively over sub-blocks
    ///
    /// # Errors
    /// `ParseError::InvalidBranchPolicy` when the block mixes branching questions in
    /// an unsupported way
    pub fn branch_policy(&self, survey: &Survey) -> Result<BranchPolicy, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidBranchPolicy {
            block: self.id.to_string(),
            reason: reason.to_string(),
        };

        let sub_policies = self
            .sub_blocks
            .iter()
            .map(|b| b.branch_policy(survey))
            .collect::<Result<Vec<_>, _>>()?;
        let branch_one_subs = sub_policies
            .iter()
            .filter(|p| **p == BranchPolicy::BranchOne)
            .count();

        let branching: Vec<&BranchMap> = self
            .questions
            .iter()
            .filter_map(|id| survey.question(id.as_str()))
            .filter_map(Question::branch_map)
            .collect();

        match branching.as_slice() {
            [] if branch_one_subs > 1 => Err(invalid("more than one branch-one sub-block")),
            [] => Ok(BranchPolicy::BranchNone),
            [_] if branch_one_subs > 0 => {
                Err(invalid("branch-one block cannot contain a branch-one sub-block"))
            }
            [_] => Ok(BranchPolicy::BranchOne),
            [first, rest @ ..] if branching.len() == self.questions.len() => {
                let expected: Vec<&BranchDestination> = first.destinations().collect();
                if rest
                    .iter()
                    .any(|map| map.destinations().collect::<Vec<_>>() != expected)
                {
                    return Err(invalid("questions branch to different destinations"));
                }
                if !self.sub_blocks.is_empty() {
                    return Err(invalid("branch-all block cannot contain sub-blocks"));
                }
                Ok(BranchPolicy::BranchAll)
            }
            _ => Err(invalid("too many branching questions")),
        }
    }
}

/// Parsed survey
#[derive(Debug)]
pub struct Survey {
    id: SurveyId,
    breakoff: bool,
    blocks: Vec<Block>,
    questions: Vec<Question>,
    index: HashMap<QuestionId, usize>,
    correlations: BTreeMap<CorrelationKey, CorrelationGroup>,
    membership: HashMap<QuestionId, CorrelationKey>,
}

impl Survey {
    /// Assemble a survey and validate its branching structure
    ///
    /// `questions` must already be in flattened block order and correlation groups
    /// resolved against them.
    pub(crate) fn assemble(
        breakoff: bool,
        blocks: Vec<Block>,
        questions: Vec<Question>,
        correlations: Vec<CorrelationGroup>,
    ) -> Result<Self, ParseError> {
        let index = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.id.clone(), i))
            .collect();
        let mut membership = HashMap::new();
        for group in &correlations {
            for member in group.members() {
                membership.insert(member.clone(), group.key().clone());
            }
        }
        let survey = Self {
            id: SurveyId::new(),
            breakoff,
            blocks,
            questions,
            index,
            correlations: correlations
                .into_iter()
                .map(|g| (g.key().clone(), g))
                .collect(),
            membership,
        };
        survey.validate_branching()?;
        Ok(survey)
    }

    fn validate_branching(&self) -> Result<(), ParseError> {
        let top_level: Vec<&BlockId> = self.blocks.iter().map(|b| &b.id).collect();

        for question in &self.questions {
            let Some(map) = question.branch_map() else {
                continue;
            };
            let origin = question.block.top_level();
            let origin_pos = top_level.iter().position(|b| **b == origin);
            for target in map.destinations().filter_map(BranchDestination::block) {
                let Some(target_pos) = top_level.iter().position(|b| *b == target) else {
                    return Err(ParseError::UnknownBranchTarget {
                        question: question.id.to_string(),
                        target: target.to_string(),
                    });
                };
                if origin_pos.map_or(true, |origin| origin >= target_pos) {
                    return Err(ParseError::BranchNotForward {
                        question: question.id.to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }

        for block in &self.blocks {
            block.branch_policy(self)?;
        }
        Ok(())
    }

    /// Survey identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> SurveyId {
        self.id
    }

    /// Whether workers may submit before answering everything
    #[inline]
    #[must_use]
    pub fn breakoff(&self) -> bool {
        self.breakoff
    }

    /// Top-level blocks
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Block by identifier, searching nested blocks
    #[must_use]
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find_map(|b| b.find(id))
    }

    /// All questions in survey order
    #[inline]
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Question identifiers in survey order
    pub fn question_ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.questions.iter().map(|q| &q.id)
    }

    /// Question by identifier
    #[must_use]
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|&i| &self.questions[i])
    }

    /// Whether the survey declares a question
    #[inline]
    #[must_use]
    pub fn contains_question(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of questions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the survey has no questions (never true for a built survey)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Position of an option within a question
    #[must_use]
    pub fn option_position(&self, question: &str, option: &str) -> Option<usize> {
        self.question(question)?.position_of(option)
    }

    /// Correlation groups by key
    #[inline]
    #[must_use]
    pub fn correlations(&self) -> &BTreeMap<CorrelationKey, CorrelationGroup> {
        &self.correlations
    }

    /// Whether any correlation group is declared
    #[inline]
    #[must_use]
    pub fn has_correlations(&self) -> bool {
        !self.correlations.is_empty()
    }

    /// Group a question belongs to
    #[must_use]
    pub fn correlation_of(&self, question: &str) -> Option<&CorrelationGroup> {
        self.membership
            .get(question)
            .and_then(|key| self.correlations.get(key))
    }

    /// JSON document for presentation layers
    ///
    /// # Errors
    /// Propagates serializer failures
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    fn block_document<'a>(&'a self, block: &'a Block) -> BlockDocument<'a> {
        BlockDocument {
            id: &block.id,
            questions: block
                .questions
                .iter()
                .filter_map(|id| self.question(id.as_str()))
                .collect(),
            randomize: block.randomize,
            subblocks: block
                .sub_blocks
                .iter()
                .map(|b| self.block_document(b))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct BlockDocument<'a> {
    id: &'a BlockId,
    questions: Vec<&'a Question>,
    randomize: bool,
    subblocks: Vec<BlockDocument<'a>>,
}

#[derive(Serialize)]
struct SurveyDocument<'a> {
    id: SurveyId,
    breakoff: bool,
    survey: Vec<BlockDocument<'a>>,
    correlation: BTreeMap<&'a CorrelationKey, &'a [QuestionId]>,
}

impl Serialize for Survey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SurveyDocument {
            id: self.id,
            breakoff: self.breakoff,
            survey: self
                .blocks
                .iter()
                .map(|b| self.block_document(b))
                .collect(),
            correlation: self
                .correlations
                .iter()
                .map(|(key, group)| (key, group.members()))
                .collect(),
        }
        .serialize(serializer)
    }
}
