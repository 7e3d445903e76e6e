//! Question supply: the externally assigned set first, the activity's
//! fallback generator otherwise.

use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};
use tracing::warn;

use crate::model::{ActivityConfig, Presentation, Question, QuestionDraft, QuestionError};

//
// ─── GENERATORS ────────────────────────────────────────────────────────────────
//

/// Synthetic question producer used when no external set is available.
pub trait QuestionGenerator: Send + Sync {
    /// Produces a fresh question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the generated operands do not form a valid question.
    fn generate(&self, rng: &mut dyn RngCore) -> Result<Question, QuestionError>;
}

/// Flash-sum generator: `count` random operands in `1..=9`, answer is their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SumGenerator {
    count: usize,
}

impl SumGenerator {
    pub const DEFAULT_COUNT: usize = 10;

    #[must_use]
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Default for SumGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COUNT)
    }
}

impl QuestionGenerator for SumGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Result<Question, QuestionError> {
        let operands = (0..self.count)
            .map(|_| f64::from(rng.random_range(1..=9_u32)))
            .collect();
        Question::new(operands, None)
    }
}

/// Two-term addition drill shown as a single composed prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdditionGenerator {
    max_term: u32,
}

impl AdditionGenerator {
    #[must_use]
    pub fn new(max_term: u32) -> Self {
        Self {
            max_term: max_term.max(1),
        }
    }
}

impl Default for AdditionGenerator {
    fn default() -> Self {
        Self::new(50)
    }
}

impl QuestionGenerator for AdditionGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Result<Question, QuestionError> {
        let a = rng.random_range(1..=self.max_term);
        let b = rng.random_range(1..=self.max_term);
        Question::new(vec![f64::from(a), f64::from(b)], None)
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// Ordered external question set as handed over by a question source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestionSet {
    pub title: Option<String>,
    /// Assignment-level reveal speed in seconds per operand.
    pub speed_secs: Option<f64>,
    pub drafts: Vec<QuestionDraft>,
}

impl QuestionSet {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(drafts: Vec<QuestionDraft>) -> Self {
        Self {
            drafts,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

//
// ─── SUPPLIER ──────────────────────────────────────────────────────────────────
//

/// Where a supplied question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Assigned { index: usize },
    Generated,
}

/// Result of asking the supplier for the question at a run position.
#[derive(Debug, Clone, PartialEq)]
pub enum Supplied {
    Question(Question, Origin),
    EndOfSet,
}

/// Hands out questions by run position. Stateless apart from the injected RNG.
#[derive(Clone)]
pub struct QuestionSupplier {
    set: QuestionSet,
    generator: Option<Arc<dyn QuestionGenerator>>,
    presentation: Presentation,
}

impl QuestionSupplier {
    #[must_use]
    pub fn new(set: QuestionSet) -> Self {
        Self {
            set,
            generator: None,
            presentation: Presentation::Progressive,
        }
    }

    /// Supplier wired to an activity's generator and presentation.
    #[must_use]
    pub fn for_activity(activity: &ActivityConfig, set: QuestionSet) -> Self {
        Self {
            set,
            generator: activity.generator(),
            presentation: activity.presentation(),
        }
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    /// Length of the external set; zero when running purely on the generator.
    #[must_use]
    pub fn set_len(&self) -> usize {
        self.set.len()
    }

    #[must_use]
    pub fn speed_override(&self) -> Option<f64> {
        self.set.speed_secs.filter(|s| s.is_finite() && *s > 0.0)
    }

    #[must_use]
    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// True when operands flash one at a time instead of a composed prompt.
    #[must_use]
    pub fn is_progressive(&self) -> bool {
        matches!(self.presentation, Presentation::Progressive)
    }

    /// Returns the question for run position `index`.
    ///
    /// Positions inside the assigned set come from the set; any other
    /// position goes to the generator. A malformed assigned record, or a
    /// missing or failing generator, surfaces as `EndOfSet`.
    pub fn next<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Supplied {
        if let Some(draft) = self.set.drafts.get(index) {
            return match draft.clone().validate() {
                Ok(question) => Supplied::Question(question, Origin::Assigned { index }),
                Err(err) => {
                    warn!(index, error = %err, "assigned question is unusable");
                    Supplied::EndOfSet
                }
            };
        }

        let Some(generator) = &self.generator else {
            return Supplied::EndOfSet;
        };
        let mut rng = RngAdapter(rng);
        match generator.generate(&mut rng) {
            Ok(question) => Supplied::Question(question, Origin::Generated),
            Err(err) => {
                warn!(index, error = %err, "fallback generator produced an invalid question");
                Supplied::EndOfSet
            }
        }
    }
}

impl fmt::Debug for QuestionSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestionSupplier")
            .field("set_len", &self.set.len())
            .field("has_generator", &self.generator.is_some())
            .field("presentation", &self.presentation)
            .finish_non_exhaustive()
    }
}

/// Lets a possibly unsized caller RNG be handed to `dyn RngCore` generators.
struct RngAdapter<'a, R: ?Sized>(&'a mut R);

impl<R: RngCore + ?Sized> RngCore for RngAdapter<'_, R> {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.0.fill_bytes(dst);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OperandSlots;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn draft(values: &[f64]) -> QuestionDraft {
        QuestionDraft::from_slots(OperandSlots::from_values(values).unwrap())
    }

    #[test]
    fn assigned_questions_are_served_in_order() {
        let set = QuestionSet::new(vec![draft(&[1.0, 2.0]), draft(&[3.0, 5.0, 2.0])]);
        let supplier = QuestionSupplier::new(set).with_generator(Arc::new(SumGenerator::default()));
        let mut rng = StdRng::seed_from_u64(7);

        let Supplied::Question(q, origin) = supplier.next(1, &mut rng) else {
            panic!("expected a question");
        };
        assert_eq!(origin, Origin::Assigned { index: 1 });
        assert_eq!(q.operands(), &[3.0, 5.0, 2.0]);
        assert_eq!(q.answer(), 10.0);
    }

    #[test]
    fn index_past_assigned_set_falls_back_to_generator() {
        let set = QuestionSet::new(vec![draft(&[1.0])]);
        let supplier = QuestionSupplier::new(set).with_generator(Arc::new(SumGenerator::default()));
        let mut rng = StdRng::seed_from_u64(7);

        let Supplied::Question(q, origin) = supplier.next(1, &mut rng) else {
            panic!("expected a generated question past the assigned set");
        };
        assert_eq!(origin, Origin::Generated);
        assert_eq!(q.operands().len(), SumGenerator::DEFAULT_COUNT);
        assert_eq!(supplier.set_len(), 1);
    }

    #[test]
    fn index_past_assigned_set_without_generator_is_end_of_set() {
        let set = QuestionSet::new(vec![draft(&[1.0])]);
        let supplier = QuestionSupplier::new(set);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(supplier.next(1, &mut rng), Supplied::EndOfSet);
    }

    #[test]
    fn malformed_assigned_record_ends_the_set() {
        let set = QuestionSet::new(vec![QuestionDraft::default()]);
        let supplier = QuestionSupplier::new(set).with_generator(Arc::new(SumGenerator::default()));
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(supplier.next(0, &mut rng), Supplied::EndOfSet);
    }

    #[test]
    fn empty_set_falls_back_to_generator() {
        let supplier = QuestionSupplier::new(QuestionSet::empty())
            .with_generator(Arc::new(SumGenerator::default()));
        let mut rng = StdRng::seed_from_u64(42);

        for index in 0..20 {
            let Supplied::Question(q, origin) = supplier.next(index, &mut rng) else {
                panic!("generator should always produce a question");
            };
            assert_eq!(origin, Origin::Generated);
            assert_eq!(q.operands().len(), SumGenerator::DEFAULT_COUNT);
            assert!(q.operands().iter().all(|v| (1.0..=9.0).contains(v)));
            assert_eq!(q.answer(), q.operands().iter().sum::<f64>());
        }
    }

    #[test]
    fn no_set_and_no_generator_is_end_of_set() {
        let supplier = QuestionSupplier::new(QuestionSet::empty());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(supplier.next(0, &mut rng), Supplied::EndOfSet);
    }

    #[test]
    fn zero_count_generator_is_end_of_set() {
        let supplier = QuestionSupplier::new(QuestionSet::empty())
            .with_generator(Arc::new(SumGenerator::new(0)));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(supplier.next(0, &mut rng), Supplied::EndOfSet);
    }

    #[test]
    fn addition_generator_builds_two_terms() {
        let mut rng = StdRng::seed_from_u64(3);
        let q = AdditionGenerator::new(10).generate(&mut rng).unwrap();
        assert_eq!(q.operands().len(), 2);
        assert!(q.operands().iter().all(|v| (1.0..=10.0).contains(v)));
    }

    #[test]
    fn set_speed_override_ignores_degenerate_values() {
        let mut set = QuestionSet::new(vec![draft(&[1.0])]);
        set.speed_secs = Some(0.0);
        assert_eq!(QuestionSupplier::new(set.clone()).speed_override(), None);
        set.speed_secs = Some(1.5);
        assert_eq!(QuestionSupplier::new(set).speed_override(), Some(1.5));
    }
}
