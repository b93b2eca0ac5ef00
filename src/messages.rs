//! User-facing texts and keyboards (Ukrainian, HTML parse mode).

use crate::config::PRIVACY_POLICY_URL;
use crate::dialog::input::{
    CallbackAction, CycleAction, MenuAction, SymptomChoice, CANCEL_BUTTON,
};
use crate::dialog::machine::Question;
use crate::dialog::validation::{ValidationError, GENDER_FEMALE, GENDER_MALE};
use crate::insights::{CyclePrediction, MoodTrend, WeeklyDigest};
use crate::models::{
    Achievement, HealthEntry, Medication, MedicationLogStatus, NewMedication, ProfileField,
    UserProfile,
};
use crate::transport::{InlineButton, Keyboard};
use crate::triage::TriageOutcome;

const NOT_SET: &str = "Не вказано";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn or_not_set(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| escape_html(&v))
        .unwrap_or_else(|| NOT_SET.to_string())
}

fn reply_rows(rows: &[&[&str]]) -> Keyboard {
    let mut rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect();
    rows.push(vec![CANCEL_BUTTON.to_string()]);
    Keyboard::Reply(rows)
}

fn inline(action: CallbackAction, text: &str) -> InlineButton {
    InlineButton::new(text, action.encode())
}

// ── Menus ───────────────────────────────────────────────

pub fn main_menu(is_female: bool) -> Keyboard {
    let label = |a: MenuAction| a.label().to_string();
    let mut rows = vec![
        vec![label(MenuAction::SymptomChecker)],
        vec![label(MenuAction::Checkin), label(MenuAction::QuickNote)],
        vec![label(MenuAction::Profile), label(MenuAction::Medications)],
        vec![label(MenuAction::History), label(MenuAction::Report)],
    ];
    if is_female {
        rows.insert(2, vec![label(MenuAction::WomensHealth)]);
    }
    Keyboard::Reply(rows)
}

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::Reply(vec![vec![CANCEL_BUTTON.to_string()]])
}

pub fn cancelled() -> &'static str {
    "Дію скасовано. Ви повернулися в головне меню."
}

pub fn choose_action() -> &'static str {
    "Оберіть дію:"
}

pub fn idle_hint() -> &'static str {
    "Я не зовсім зрозумів повідомлення. Оберіть дію з меню нижче 👇"
}

// ── Onboarding ──────────────────────────────────────────

pub fn welcome() -> (String, Keyboard) {
    let text = format!(
        "👋 <b>Вітаю!</b>\n\nПеред початком роботи, будь ласка, ознайомтеся з політикою конфіденційності.\n➡️ <b>Прочитати:</b> {PRIVACY_POLICY_URL}"
    );
    let keyboard = Keyboard::Inline(vec![vec![
        inline(CallbackAction::Privacy { accepted: true }, "✅ Приймаю умови"),
        inline(CallbackAction::Privacy { accepted: false }, "➡️ Пропустити"),
    ]]);
    (text, keyboard)
}

pub fn privacy_choice(accepted: bool) -> &'static str {
    if accepted {
        "Дякуємо за згоду!"
    } else {
        "Ви можете ознайомитися з політикою конфіденційності командою /privacy."
    }
}

pub fn privacy_link() -> String {
    format!("🔒 Політика конфіденційності: {PRIVACY_POLICY_URL}")
}

// ── Questions ───────────────────────────────────────────

pub fn question(q: Question) -> (String, Keyboard) {
    match q {
        Question::CheckinMood => (
            "Як ваш настрій сьогодні?".into(),
            reply_rows(&[&["😊 Чудовий", "😐 Нормальний", "😞 Поганий"]]),
        ),
        Question::CheckinSleep => (
            "Як ви спали? (напр., '8 годин, добре' або 'погано')".into(),
            cancel_keyboard(),
        ),
        Question::CheckinActivity => (
            "Яким був ваш рівень фізичної активності сьогодні?".into(),
            reply_rows(&[&["Низька", "Середня", "Висока"]]),
        ),
        Question::CheckinStress => (
            "Оцініть ваш середній рівень стресу за сьогодні:".into(),
            reply_rows(&[&["Низький", "Середній", "Високий"]]),
        ),
        Question::CheckinWater => (
            "Скільки води ви випили сьогодні?".into(),
            reply_rows(&[&["Менше 1 літра", "1-2 літри", "Більше 2 літрів"]]),
        ),
        Question::Note => (
            "Введіть вашу нотатку. Вона буде збережена з поточною датою і часом.".into(),
            cancel_keyboard(),
        ),
        Question::ProfileField(field) => profile_question(field),
        Question::MedName => ("Введіть назву ліків:".into(), cancel_keyboard()),
        Question::MedDosage => (
            "Введіть дозування (напр., '1 таблетка' або '500 мг'):".into(),
            cancel_keyboard(),
        ),
        Question::MedSchedule => (
            "Введіть час прийому у форматі ГГ:ХХ через кому (напр., 09:00, 21:00):".into(),
            cancel_keyboard(),
        ),
        Question::SymptomChoice => (
            "Оберіть основний симптом або опишіть його:".into(),
            Keyboard::Inline(vec![
                vec![inline(CallbackAction::Symptom(SymptomChoice::Headache), "🤯 Головний біль")],
                vec![inline(CallbackAction::Symptom(SymptomChoice::SoreThroat), "🤒 Біль у горлі")],
                vec![inline(
                    CallbackAction::Symptom(SymptomChoice::Other),
                    "📝 Інше (описати текстом)",
                )],
            ]),
        ),
        Question::SymptomDescription => (
            "Опишіть ваші симптоми якомога детальніше:".into(),
            cancel_keyboard(),
        ),
        Question::HeadacheType => (
            "Який характер болю?".into(),
            reply_rows(&[&["Пульсуючий", "Тиснучий", "Гострий"]]),
        ),
        Question::HeadacheLocation => (
            "Де саме болить?".into(),
            reply_rows(&[&["Лоб", "Скроні"], &["Потилиця", "Вся голова"]]),
        ),
        Question::HeadacheAdditional => (
            "Чи є супутні симптоми? (нудота, світлочутливість, запаморочення...)".into(),
            reply_rows(&[&["Нудота", "Світлочутливість", "Немає"]]),
        ),
    }
}

fn profile_question(field: ProfileField) -> (String, Keyboard) {
    let text = format!("Введіть нове значення для поля «{}»:", field.label());
    match field {
        ProfileField::Gender => (text, reply_rows(&[&[GENDER_MALE, GENDER_FEMALE]])),
        ProfileField::Age | ProfileField::WeightKg | ProfileField::HeightCm => {
            (format!("{text}\n(лише число)"), cancel_keyboard())
        }
        _ => (text, cancel_keyboard()),
    }
}

pub fn rejected(err: &ValidationError, q: Question) -> (String, Keyboard) {
    let (text, keyboard) = question(q);
    (format!("⚠️ {}\n\n{text}", err.hint()), keyboard)
}

// ── Profile and emergency card ──────────────────────────

pub fn profile_card(p: &UserProfile) -> (String, Keyboard) {
    let value = |field: ProfileField| -> String {
        match field {
            ProfileField::Age => or_not_set(p.age.map(|v| v.to_string())),
            ProfileField::Gender => or_not_set(p.gender.clone()),
            ProfileField::WeightKg => or_not_set(p.weight_kg.map(|v| v.to_string())),
            ProfileField::HeightCm => or_not_set(p.height_cm.map(|v| v.to_string())),
            ProfileField::BloodGroup => or_not_set(p.blood_group.clone()),
            ProfileField::Allergies => or_not_set(p.allergies.clone()),
            ProfileField::ChronicDiseases => or_not_set(p.chronic_diseases.clone()),
            ProfileField::EmergencyContact => or_not_set(p.emergency_contact.clone()),
        }
    };

    let mut text = format!("👤 <b>Профіль: {}</b>\n\n", escape_html(&p.first_name));
    for field in ProfileField::ALL {
        text.push_str(&format!("<b>{}:</b> {}\n", field.label(), value(field)));
    }
    if p.checkin_streak > 0 {
        text.push_str(&format!("\n🔥 Серія check-in: {}", p.checkin_streak));
    }

    let buttons: Vec<InlineButton> = ProfileField::ALL
        .into_iter()
        .map(|f| inline(CallbackAction::EditProfile(f), &format!("✏️ {}", f.label())))
        .collect();
    let rows = buttons.chunks(2).map(<[InlineButton]>::to_vec).collect();
    (text.trim_end().to_string(), Keyboard::Inline(rows))
}

pub fn emergency_card(p: &UserProfile) -> String {
    format!(
        "<b>🚑 Ваша Екстрена картка:</b>\n\n<b>Група крові:</b> {}\n<b>Алергії:</b> {}\n<b>Хронічні захворювання:</b> {}\n<b>Екстрений контакт:</b> {}",
        or_not_set(p.blood_group.clone()),
        or_not_set(p.allergies.clone()),
        or_not_set(p.chronic_diseases.clone()),
        or_not_set(p.emergency_contact.clone()),
    )
}

pub fn profile_saved(field: ProfileField) -> String {
    format!("✅ Поле «{}» оновлено.", field.label())
}

// ── Journal ─────────────────────────────────────────────

pub fn history(entries: &[HealthEntry]) -> String {
    if entries.is_empty() {
        return "Ваша історія записів порожня.".into();
    }
    let mut text = String::from("<b>Останні записи про здоров'я:</b>\n\n");
    for e in entries {
        text.push_str(&format!("🗓️ <b>{}</b>\n", e.timestamp.format("%d-%m-%y %H:%M")));
        let fields = [
            ("📝 Нотатка", &e.note),
            ("Настрій", &e.mood),
            ("Сон", &e.sleep_quality),
            ("Активність", &e.activity_level),
            ("Стрес", &e.stress_level),
            ("Вода", &e.water_intake),
        ];
        for (label, value) in fields {
            if let Some(v) = value {
                text.push_str(&format!("   - {label}: {}\n", escape_html(v)));
            }
        }
        text.push_str("---\n");
    }
    text
}

pub fn checkin_saved() -> &'static str {
    "✅ Дякую! Ваш щоденний запис збережено."
}

pub fn note_saved() -> &'static str {
    "✅ Нотатку збережено."
}

pub fn streak(days: u32) -> String {
    format!("🔥 Ви ведете щоденник вже <b>{days}</b> днів поспіль!")
}

pub fn achievement_unlocked(a: &Achievement) -> String {
    format!("{} Досягнення отримано: <b>{}</b>!", a.icon, escape_html(&a.name))
}

// ── Medications ─────────────────────────────────────────

pub fn medications(meds: &[Medication]) -> (String, Keyboard) {
    let mut rows: Vec<Vec<InlineButton>> = Vec::new();
    let text = if meds.is_empty() {
        "💊 У вас ще немає доданих ліків.".to_string()
    } else {
        let mut text = String::from("💊 <b>Ваші ліки:</b>\n\n");
        for m in meds {
            text.push_str(&format!(
                "• <b>{}</b> ({}) - {}\n",
                escape_html(&m.name),
                escape_html(&m.dosage),
                escape_html(&m.schedule)
            ));
            rows.push(vec![inline(
                CallbackAction::DeactivateMedication(m.med_id),
                &format!("🗑 Прибрати {}", m.name),
            )]);
        }
        text.trim_end().to_string()
    };
    rows.push(vec![inline(CallbackAction::AddMedication, "➕ Додати ліки")]);
    (text, Keyboard::Inline(rows))
}

pub fn medication_saved(m: &NewMedication) -> String {
    format!(
        "✅ Ліки <b>{}</b> додано. Нагадування: {}",
        escape_html(&m.name),
        escape_html(&m.schedule)
    )
}

pub fn medication_deactivated() -> &'static str {
    "🗑 Ліки прибрано зі списку. Нагадування більше не надходитимуть."
}

pub fn medication_not_found() -> &'static str {
    "Ці ліки не знайдено або їх уже прибрано."
}

pub fn reminder(med_id: i64, name: &str, dosage: &str) -> (String, Keyboard) {
    let text = format!(
        "⏰ <b>Нагадування!</b>\n\nЧас прийняти ліки: <b>{}</b>\nДозування: {}",
        escape_html(name),
        escape_html(dosage)
    );
    let keyboard = Keyboard::Inline(vec![vec![
        inline(
            CallbackAction::MedicationLog { med_id, status: MedicationLogStatus::Taken },
            "✅ Прийнято",
        ),
        inline(
            CallbackAction::MedicationLog { med_id, status: MedicationLogStatus::Skipped },
            "❌ Пропущено",
        ),
    ]]);
    (text, keyboard)
}

pub fn medication_logged(status: MedicationLogStatus) -> &'static str {
    match status {
        MedicationLogStatus::Taken => "✅ Відмічено: прийнято.",
        MedicationLogStatus::Skipped => "❌ Відмічено: пропущено.",
    }
}

// ── Reports ─────────────────────────────────────────────

pub fn report_caption() -> &'static str {
    "📄 Ваш звіт для лікаря"
}

pub fn report_no_data() -> &'static str {
    "Немає записів для звіту. Зробіть Check-in або швидкий запис."
}

pub fn weekly_digest(digest: &WeeklyDigest) -> String {
    let summary = match digest {
        WeeklyDigest::NoRecentEntries => {
            return "На минулому тижні не було записів. Намагайтеся робити Check-in щодня, щоб отримувати аналітику.".into();
        }
        WeeklyDigest::Summary(s) => s,
    };

    let mut lines = vec!["<b>📊 Ваш звіт за минулий тиждень:</b>\n".to_string()];
    if let Some(avg) = summary.average_mood {
        let face = if avg > 2.5 {
            "😊"
        } else if avg > 1.5 {
            "😐"
        } else {
            "😞"
        };
        lines.push(format!("• Середній настрій: {face}"));
    }
    lines.push(format!("• Check-in за тиждень: {}", summary.checkins));
    if summary.notes > 0 {
        lines.push(format!("• Швидких записів: {}", summary.notes));
    }
    match summary.trend {
        Some(MoodTrend::Improved) => {
            lines.push("• Ваш настрій <b>покращився</b> порівняно з позаминулим тижнем.".into())
        }
        Some(MoodTrend::Declined) => {
            lines.push("• Ваш настрій <b>погіршився</b> порівняно з позаминулим тижнем.".into())
        }
        Some(MoodTrend::Stable) | None => {}
    }
    lines.join("\n")
}

// ── Women's health ──────────────────────────────────────

pub fn womens_health_menu() -> (String, Keyboard) {
    (
        "🌸 <b>Жіноче здоров'я</b>\n\nОберіть дію:".into(),
        Keyboard::Inline(vec![
            vec![
                inline(CallbackAction::Cycle(CycleAction::Start), "🩸 Початок циклу"),
                inline(CallbackAction::Cycle(CycleAction::End), "✅ Кінець циклу"),
            ],
            vec![inline(CallbackAction::Cycle(CycleAction::Predict), "📅 Прогноз")],
        ]),
    )
}

pub fn womens_health_unavailable() -> &'static str {
    "Цей розділ доступний, якщо у профілі вказано стать «Жіноча»."
}

pub fn cycle_started(started: bool) -> &'static str {
    if started {
        "🩸 Новий цикл розпочато сьогодні."
    } else {
        "Цикл уже розпочато сьогодні."
    }
}

pub fn cycle_ended(ended: bool) -> &'static str {
    if ended {
        "✅ Цикл завершено."
    } else {
        "Немає активного циклу."
    }
}

pub fn cycle_prediction(prediction: Option<CyclePrediction>) -> String {
    match prediction {
        Some(p) => format!(
            "📅 Середня тривалість циклу: <b>{}</b> днів.\nНаступний цикл очікується приблизно <b>{}</b>.",
            p.average_length_days,
            p.next_start.format("%d-%m-%Y")
        ),
        None => "Недостатньо даних для прогнозу. Потрібно щонайменше два завершені цикли.".into(),
    }
}

// ── Triage ──────────────────────────────────────────────

pub fn triage_thinking() -> &'static str {
    "⏳ Аналізую ваші симптоми..."
}

pub fn triage_response(outcome: &TriageOutcome) -> String {
    match outcome {
        TriageOutcome::Clarify(q) => format!("❓ {}", escape_html(q)),
        TriageOutcome::Final(text) => format!("🩺 {}", escape_html(text)),
    }
}
