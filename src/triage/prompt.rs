use crate::models::UserProfile;

/// Closing sentence every final answer carries.
pub const DISCLAIMER: &str =
    "⚠️ Ця інформація не є медичним діагнозом. Для встановлення діагнозу та лікування зверніться до лікаря.";

const PERSONA: &str = "Ти — уважний асистент для первинного аналізу симптомів. \
Пояснюй простою, зрозумілою мовою, без складних медичних термінів. \
Назви можливі причини, що можна зробити вдома, і тривожні ознаки, за яких потрібно негайно звернутися по медичну допомогу. \
Якщо інформації замало, постав одне коротке уточнювальне запитання і більше нічого не пиши. \
Відповідай українською.";

/// System instruction with the user's allergy and chronic-condition context.
pub fn system_prompt(profile: Option<&UserProfile>) -> String {
    let mut prompt = String::from(PERSONA);

    if let Some(p) = profile {
        if let Some(allergies) = filled(&p.allergies) {
            prompt.push_str(&format!(
                "\nУ користувача алергія: {allergies}. Не радь засобів, що можуть її спричинити."
            ));
        }
        if let Some(chronic) = filled(&p.chronic_diseases) {
            prompt.push_str(&format!(
                "\nУ користувача хронічні захворювання: {chronic}. Враховуй їх у порадах."
            ));
        }
    }

    prompt.push_str(&format!(
        "\nКожну повну відповідь завершуй реченням: \"{DISCLAIMER}\""
    ));
    prompt
}

/// User instruction: profile summary followed by the symptom text.
pub fn user_prompt(profile: Option<&UserProfile>, symptoms: &str) -> String {
    let summary = profile.map(profile_summary).unwrap_or_default();
    if summary.is_empty() {
        format!("Симптоми: {symptoms}")
    } else {
        format!("Профіль: {summary}\nСимптоми: {symptoms}")
    }
}

fn profile_summary(p: &UserProfile) -> String {
    let mut parts = Vec::new();
    if let Some(age) = p.age {
        parts.push(format!("вік {age}"));
    }
    if let Some(gender) = filled(&p.gender) {
        parts.push(format!("стать {}", gender.to_lowercase()));
    }
    if let Some(w) = p.weight_kg {
        parts.push(format!("вага {w} кг"));
    }
    if let Some(h) = p.height_cm {
        parts.push(format!("зріст {h} см"));
    }
    parts.join(", ")
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Appends the disclaimer unless the model already ended with it.
pub fn ensure_disclaimer(response: &str) -> String {
    let trimmed = response.trim_end();
    if trimmed.ends_with(DISCLAIMER) {
        trimmed.to_string()
    } else {
        format!("{trimmed}\n\n{DISCLAIMER}")
    }
}
