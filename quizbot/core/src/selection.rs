//! Card Selection
//!
//! Picks the next quiz question for a user: one target card and three
//! distractor answers, all drawn from the cards visible to that user.

use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TrainerError;
use crate::events::UserId;
use crate::store::{Card, CardId, CardStore};

/// Answer options shown per question (target plus distractors)
pub const QUIZ_OPTIONS: usize = 4;

/// One multiple-choice question
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    /// Card the question is about
    pub card_id: CardId,
    /// Word to translate
    pub prompt: String,
    /// Correct answer
    pub answer: String,
    /// Wrong answers, distinct from each other and from `answer`
    pub distractors: Vec<String>,
}

impl QuizItem {
    /// Answer plus distractors in random order
    pub fn shuffled_options<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut options = Vec::with_capacity(self.distractors.len() + 1);
        options.push(self.answer.clone());
        options.extend(self.distractors.iter().cloned());
        options.shuffle(rng);
        options
    }

    /// Exact comparison with the correct answer
    #[must_use]
    pub fn is_correct(&self, reply: &str) -> bool {
        reply == self.answer
    }
}

/// Build a question from candidate cards
///
/// Cards repeating an answer already seen are ignored. Fails with
/// [`TrainerError::InsufficientCards`] unless [`QUIZ_OPTIONS`] distinct
/// answers remain.
pub fn pick_quiz_item<R: Rng + ?Sized>(
    cards: &[Card],
    rng: &mut R,
) -> Result<QuizItem, TrainerError> {
    let mut seen = HashSet::new();
    let distinct: Vec<&Card> = cards
        .iter()
        .filter(|card| seen.insert(card.target.as_str()))
        .collect();

    if distinct.len() < QUIZ_OPTIONS {
        return Err(TrainerError::InsufficientCards {
            available: distinct.len(),
        });
    }

    let picked: Vec<&Card> = distinct
        .choose_multiple(rng, QUIZ_OPTIONS)
        .copied()
        .collect();
    let target_index = rng.gen_range(0..picked.len());
    let target = picked[target_index];
    let distractors = picked
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_index)
        .map(|(_, card)| card.target.clone())
        .collect();

    Ok(QuizItem {
        card_id: target.id,
        prompt: target.source.clone(),
        answer: target.target.clone(),
        distractors,
    })
}

/// Draws quiz questions from the card store
pub struct CardSelector<S: ?Sized> {
    store: Arc<S>,
}

impl<S: CardStore + ?Sized> CardSelector<S> {
    /// Create a selector over `store`
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Next question for `user`
    pub async fn select_quiz_item(&self, user: UserId) -> Result<QuizItem, TrainerError> {
        let cards = self.store.random_visible_cards(user, QUIZ_OPTIONS).await?;
        let item = pick_quiz_item(&cards, &mut rand::thread_rng())?;
        tracing::debug!(user_id = %user, card_id = %item.card_id, "Selected quiz card");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChatUser;
    use crate::store::{SqliteStore, SHARED_CARDS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card(id: i64, source: &str, target: &str) -> Card {
        Card {
            id: CardId(id),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn four_cards() -> Vec<Card> {
        vec![
            card(1, "Я", "I"),
            card(2, "Ты", "You"),
            card(3, "Он", "He"),
            card(4, "Она", "She"),
        ]
    }

    #[test]
    fn test_item_has_four_distinct_answers() {
        let cards = four_cards();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let item = pick_quiz_item(&cards, &mut rng).unwrap();
            let options = item.shuffled_options(&mut rng);
            let unique: HashSet<_> = options.iter().collect();
            assert_eq!(options.len(), QUIZ_OPTIONS);
            assert_eq!(unique.len(), QUIZ_OPTIONS);
            assert!(options.contains(&item.answer));
            assert!(!item.distractors.contains(&item.answer));

            let source = cards.iter().find(|c| c.id == item.card_id).unwrap();
            assert_eq!(source.source, item.prompt);
            assert_eq!(source.target, item.answer);
        }
    }

    #[test]
    fn test_every_card_can_be_the_target() {
        let cards = four_cards();
        let mut rng = StdRng::seed_from_u64(1);
        let targets: HashSet<_> = (0..200)
            .map(|_| pick_quiz_item(&cards, &mut rng).unwrap().card_id)
            .collect();
        assert_eq!(targets.len(), 4);
    }

    #[test]
    fn test_too_few_cards() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = pick_quiz_item(&four_cards()[..3], &mut rng);
        assert!(matches!(
            result,
            Err(TrainerError::InsufficientCards { available: 3 })
        ));
        assert!(matches!(
            pick_quiz_item(&[], &mut rng),
            Err(TrainerError::InsufficientCards { available: 0 })
        ));
    }

    #[test]
    fn test_duplicate_answers_do_not_count() {
        let mut cards = four_cards();
        cards[3] = card(4, "Привет", "I");
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            pick_quiz_item(&cards, &mut rng),
            Err(TrainerError::InsufficientCards { available: 3 })
        ));
    }

    #[test]
    fn test_is_correct_is_exact() {
        let item = pick_quiz_item(&four_cards(), &mut StdRng::seed_from_u64(3)).unwrap();
        let answer = item.answer.clone();
        assert!(item.is_correct(&answer));
        assert!(!item.is_correct(&answer.to_lowercase()));
        assert!(!item.is_correct(&format!("{answer} ")));
    }

    #[tokio::test]
    async fn test_selector_against_store() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .register_user(&ChatUser::new(1, None, "One"))
            .await
            .unwrap();
        let selector = CardSelector::new(Arc::clone(&store));

        assert!(matches!(
            selector.select_quiz_item(UserId(1)).await,
            Err(TrainerError::InsufficientCards { available: 0 })
        ));

        store.seed_shared_cards(SHARED_CARDS).await.unwrap();
        let item = selector.select_quiz_item(UserId(1)).await.unwrap();
        assert!(SHARED_CARDS
            .iter()
            .any(|c| c.source == item.prompt && c.target == item.answer));
        assert_eq!(item.distractors.len(), QUIZ_OPTIONS - 1);
    }

    #[tokio::test]
    async fn test_personal_card_with_shared_answer_gets_asked() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .register_user(&ChatUser::new(1, None, "One"))
            .await
            .unwrap();
        store.seed_shared_cards(SHARED_CARDS).await.unwrap();
        store
            .add_personal_card(UserId(1), "Здравствуй", "Hello")
            .await
            .unwrap();
        let selector = CardSelector::new(Arc::clone(&store));

        let mut asked = false;
        for _ in 0..2000 {
            let item = selector.select_quiz_item(UserId(1)).await.unwrap();
            if item.prompt == "Здравствуй" {
                assert_eq!(item.answer, "Hello");
                asked = true;
                break;
            }
        }
        assert!(asked, "personal card never became the question");
    }
}
