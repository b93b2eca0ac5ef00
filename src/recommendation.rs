//! Daily advice derived from a completed check-in.

use crate::models::CheckinAnswers;

pub const ALL_GOOD: &str = "✨ Чудові показники сьогодні! Так тримати!";
pub const ADVICE_HEADER: &str = "💡 <b>Ось декілька порад на основі ваших сьогоднішніх записів:</b>";

const HIGH_STRESS: &str = "Високий рівень стресу. Спробуйте знайти 10-15 хвилин для короткої прогулянки або дихальних вправ, щоб розслабитися.";
const LOW_ACTIVITY: &str = "Низька активність сьогодні. Навіть коротка 20-хвилинна прогулянка може значно покращити ваше самопочуття.";
const LOW_MOOD_AND_ACTIVITY: &str = "Іноді фізична активність допомагає покращити настрій. Можливо, невелика прогулянка буде корисною.";
const POOR_SLEEP: &str = "Поганий сон впливає на весь день. Спробуйте провітрити кімнату перед сном і відкласти телефон за годину до засинання.";
const LOW_WATER: &str = "Не забувайте пити достатньо води протягом дня. Це важливо для енергії та концентрації.";

/// Advice items triggered by the answers, in display order.
pub fn advice(answers: &CheckinAnswers) -> Vec<&'static str> {
    let mut items = Vec::new();
    let low_activity = answers.activity_level == "Низька";

    if answers.stress_level == "Високий" {
        items.push(HIGH_STRESS);
    }
    if low_activity {
        items.push(LOW_ACTIVITY);
    }
    if answers.mood == "😞 Поганий" && low_activity {
        items.push(LOW_MOOD_AND_ACTIVITY);
    }
    let sleep = answers.sleep_quality.to_lowercase();
    if sleep.contains("погано") || sleep.contains("мало") {
        items.push(POOR_SLEEP);
    }
    if answers.water_intake == "Менше 1 літра" {
        items.push(LOW_WATER);
    }
    items
}

/// Message shown after the check-in is saved.
pub fn daily_recommendation(answers: &CheckinAnswers) -> String {
    let items = advice(answers);
    if items.is_empty() {
        return ALL_GOOD.to_string();
    }
    format!("{ADVICE_HEADER}\n\n- {}", items.join("\n- "))
}
