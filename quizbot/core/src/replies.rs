//! User-facing texts

use rand::seq::SliceRandom;
use rand::Rng;

use crate::stats::{LifetimeStats, SessionTally};
use crate::store::Card;

const PRAISE: &[&str] = &["✅ Правильно!", "✅ Молодец!", "✅ Так держать!", "✅ Всё верно!"];

const REPROACH: &[&str] = &[
    "❌ Неправильно!",
    "❌ Ошибка!",
    "❌ Близко, но неверно!",
    "❌ Неверно!",
];

/// Prompt for the first add-card step
pub const ASK_SOURCE: &str = "Введите слово на русском:";
/// Prompt for the second add-card step
pub const ASK_TARGET: &str = "Введите перевод:";
/// Quiz cannot start or continue
pub const NO_QUIZ_CARDS: &str = "❌ Нет доступных карточек для тестирования.";
/// Delete requested without personal cards
pub const NO_CARDS_TO_DELETE: &str = "❌ У вас нет карточек для удаления.";
/// Delete input rejected
pub const INVALID_CARD_ID: &str = "❌ Указан некорректный ID. Попробуй ещё.";
/// Card removed
pub const CARD_DELETED: &str = "✅ Карточка удалена.";
/// Card vanished between listing and confirmation
pub const CARD_NOT_FOUND: &str = "❌ Карточка не найдена.";
/// Cancel pressed while idle (alert)
pub const NOTHING_TO_CANCEL: &str = "❌ Нет активного процесса для отмены!";
/// Cancel acknowledged (toast)
pub const CANCEL_TOAST: &str = "Действие отменено";
/// Cancel acknowledged (chat message)
pub const CANCELLED: &str = "❌ Действие отменено.";
/// Stats requested before any answer
pub const NO_STATS: &str = "❌ Пока нет данных для статистики.";
/// Text not understood while idle
pub const UNKNOWN_COMMAND: &str = "❌ Неизвестная команда. \nВоспользутесь меню.";

/// Greeting for `/start`
pub fn greeting(full_name: &str) -> String {
    format!("Привет, {full_name} 👋\n\nРад тебя видеть 😊\n\nВыбери действие из меню.")
}

/// Question text
pub fn question(prompt: &str) -> String {
    format!("Выбери корректный перевод слова: \n'{prompt}'")
}

/// Random affirmation for a correct answer
pub fn praise<R: Rng + ?Sized>(rng: &mut R) -> String {
    PRAISE.choose(rng).copied().unwrap_or(PRAISE[0]).to_string()
}

/// Random rebuke for a wrong answer, revealing the right one
pub fn reproach<R: Rng + ?Sized>(rng: &mut R, answer: &str) -> String {
    let opener = REPROACH.choose(rng).copied().unwrap_or(REPROACH[0]);
    format!("{opener} \n\nВерный ответ: \n'{answer}'")
}

/// Accuracy as shown to users: `50.0`, `66.67`
fn percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Quiz results
pub fn quiz_results(tally: &SessionTally) -> String {
    format!(
        "📊 Результаты теста:\n\n\
         ✅ Правильных ответов: {}\n\
         ❌ Неправильных ответов: {}\n\
         ⏭ Пропущено: {}\n\
         🎯 Точность (без учета пропусков): {}%",
        tally.correct,
        tally.incorrect,
        tally.skipped,
        percent(tally.accuracy())
    )
}

/// Lifetime statistics
pub fn lifetime_stats(stats: &LifetimeStats) -> String {
    format!(
        "📊 Статистика за все время:\n\n\
         ✅ Правильных ответов: {}\n\
         ❌ Неправильных ответов: {}\n\
         🎯 Точность: {}%",
        stats.correct,
        stats.incorrect,
        percent(stats.accuracy())
    )
}

/// Confirmation after adding a card
pub fn card_added(source: &str) -> String {
    format!("✅ Карточка '{source}' добавлена!")
}

/// Personal cards listed for deletion
pub fn delete_listing(cards: &[Card]) -> String {
    let mut text = String::from("ID - Слово");
    for card in cards {
        text.push('\n');
        text.push_str(&format!("{} - {}", card.id, card.source));
    }
    text.push_str("\n\nУкажите ID карточки для удаления: ");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CardId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_praise_and_reproach() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            assert!(PRAISE.contains(&praise(&mut rng).as_str()));
            let text = reproach(&mut rng, "House");
            assert!(text.starts_with("❌"));
            assert!(text.ends_with("Верный ответ: \n'House'"));
        }
    }

    #[test]
    fn test_quiz_results_format() {
        let tally = SessionTally {
            correct: 1,
            incorrect: 1,
            skipped: 0,
        };
        let text = quiz_results(&tally);
        assert!(text.contains("Правильных ответов: 1"));
        assert!(text.contains("Пропущено: 0"));
        assert!(text.contains("Точность (без учета пропусков): 50.0%"));
    }

    #[test]
    fn test_fractional_accuracy_is_shown_with_decimals() {
        let stats = LifetimeStats {
            correct: 1,
            incorrect: 2,
        };
        assert!(lifetime_stats(&stats).contains("Точность: 33.33%"));
    }

    #[test]
    fn test_whole_accuracy_keeps_one_decimal() {
        assert_eq!(percent(0.0), "0.0");
        assert_eq!(percent(100.0), "100.0");
        assert_eq!(percent(66.67), "66.67");
    }

    #[test]
    fn test_delete_listing() {
        let cards = vec![
            Card {
                id: CardId(11),
                source: "Кот".to_string(),
                target: "Cat".to_string(),
            },
            Card {
                id: CardId(12),
                source: "Пёс".to_string(),
                target: "Dog".to_string(),
            },
        ];
        assert_eq!(
            delete_listing(&cards),
            "ID - Слово\n11 - Кот\n12 - Пёс\n\nУкажите ID карточки для удаления: "
        );
    }

    #[test]
    fn test_greeting_uses_full_name() {
        assert!(greeting("Ada Lovelace").starts_with("Привет, Ada Lovelace 👋"));
    }
}
