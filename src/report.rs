//! Doctor report as a PDF.
//!
//! A top-down `use_text` cursor: a title block, the profile, then recent
//! entries wrapped to the page width. Cyrillic needs an embedded TTF; without one the text is
//! transliterated so the builtin Helvetica can draw it.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use printpdf::*;
use thiserror::Error;

use crate::models::{HealthEntry, UserProfile};

pub const FONT_ENV: &str = "REPORT_FONT_PATH";
const FONT_FILE: &str = "DejaVuSans.ttf";
const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const WRAP_CHARS: usize = 90;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No entries to include in the report")]
    InsufficientData,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Font to embed: explicit path, then the data dir, then the system DejaVu.
pub fn locate_font(explicit: Option<PathBuf>, data_dir: &Path) -> Option<PathBuf> {
    explicit
        .into_iter()
        .chain([data_dir.join(FONT_FILE), PathBuf::from(SYSTEM_FONT)])
        .find(|p| p.is_file())
}

/// Where the report for `user_id` is written.
pub fn report_path(out_dir: &Path, user_id: i64) -> PathBuf {
    out_dir.join(format!("report_{user_id}.pdf"))
}

/// Renders the report to `out_dir` and returns the file path.
pub fn render(
    profile: &UserProfile,
    history: &[HealthEntry],
    out_dir: &Path,
    font_path: Option<&Path>,
    today: NaiveDate,
) -> Result<PathBuf, ReportError> {
    if history.is_empty() {
        return Err(ReportError::InsufficientData);
    }

    let bytes = render_bytes(profile, history, font_path, today)?;
    std::fs::create_dir_all(out_dir)?;
    let path = report_path(out_dir, profile.user_id);
    std::fs::write(&path, bytes)?;
    tracing::info!(user_id = profile.user_id, entries = history.len(), "Doctor report rendered");
    Ok(path)
}

struct Cursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
    font: IndirectFontRef,
    unicode: bool,
}

impl Cursor {
    fn text(&mut self, text: &str, size: f32, x: f32, advance: f32) {
        if self.y.0 < BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = Mm(TOP);
        }
        let prepared = prepare_text(text, self.unicode);
        self.layer.use_text(prepared, size, Mm(x), self.y, &self.font);
        self.y -= Mm(advance);
    }

    fn wrapped(&mut self, text: &str, size: f32, x: f32, advance: f32) {
        for line in wrap_text(text, WRAP_CHARS) {
            self.text(&line, size, x, advance);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= Mm(mm);
    }
}

fn render_bytes(
    profile: &UserProfile,
    history: &[HealthEntry],
    font_path: Option<&Path>,
    today: NaiveDate,
) -> Result<Vec<u8>, ReportError> {
    let title = "Звіт про стан здоров'я";
    let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);

    let external = font_path.and_then(|p| match File::open(p) {
        Ok(file) => match doc.add_external_font(file) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!(path = %p.display(), error = %e, "Report font rejected, using builtin");
                None
            }
        },
        Err(e) => {
            tracing::warn!(path = %p.display(), error = %e, "Report font unreadable, using builtin");
            None
        }
    });
    let unicode = external.is_some();
    let font = match external {
        Some(font) => font,
        None => doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?,
    };

    let mut c = Cursor { doc, layer, y: Mm(TOP), font, unicode };

    c.text(title, 16.0, 20.0, 9.0);
    c.text(&format!("Пацієнт: {}", profile.first_name), 12.0, 20.0, 6.0);
    c.text(&format!("Дата генерації: {}", today.format("%d-%m-%Y")), 12.0, 20.0, 10.0);

    c.text("Профіль:", 13.0, 20.0, 7.0);
    for line in profile_lines(profile) {
        c.wrapped(&line, 10.0, 25.0, 5.0);
    }
    c.gap(6.0);

    c.text("Останні записи:", 13.0, 20.0, 7.0);
    for entry in history {
        c.wrapped(&entry_line(entry), 10.0, 25.0, 5.0);
        c.gap(1.5);
    }

    let mut buf = BufWriter::new(Vec::new());
    c.doc
        .save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
}

fn profile_lines(p: &UserProfile) -> Vec<String> {
    let or_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| "Не вказано".into());
    vec![
        format!("Вік: {}", or_blank(p.age.map(|a| a.to_string()))),
        format!("Стать: {}", or_blank(p.gender.clone())),
        format!("Вага (кг): {}", or_blank(p.weight_kg.map(|w| w.to_string()))),
        format!("Зріст (см): {}", or_blank(p.height_cm.map(|h| h.to_string()))),
        format!("Група крові: {}", or_blank(p.blood_group.clone())),
        format!("Алергії: {}", or_blank(p.allergies.clone())),
        format!("Хронічні захворювання: {}", or_blank(p.chronic_diseases.clone())),
    ]
}

/// One entry as a single line, fields in check-in order after the note.
pub fn entry_line(e: &HealthEntry) -> String {
    let mut line = format!("{}: ", e.timestamp.format("%d-%m-%y %H:%M"));
    let fields = [
        ("Нотатка", &e.note),
        ("Настрій", &e.mood),
        ("Сон", &e.sleep_quality),
        ("Активність", &e.activity_level),
        ("Стрес", &e.stress_level),
        ("Вода", &e.water_intake),
    ];
    for (label, value) in fields {
        if let Some(v) = value {
            line.push_str(&format!("{label} - {v}. "));
        }
    }
    line.trim_end().to_string()
}

/// Drops glyphs no text font carries (emoji, variation selectors) and
/// transliterates when only the builtin font is available.
fn prepare_text(text: &str, unicode: bool) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.len_utf8() < 4 && !('\u{FE00}'..='\u{FE0F}').contains(c))
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if unicode {
        cleaned
    } else {
        transliterate(&cleaned)
    }
}

fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let lower = ch.to_lowercase().next().unwrap_or(ch);
        let mapped = match lower {
            'а' => "a", 'б' => "b", 'в' => "v", 'г' => "h", 'ґ' => "g", 'д' => "d",
            'е' => "e", 'є' => "ie", 'ж' => "zh", 'з' => "z", 'и' => "y", 'і' => "i",
            'ї' => "i", 'й' => "i", 'к' => "k", 'л' => "l", 'м' => "m", 'н' => "n",
            'о' => "o", 'п' => "p", 'р' => "r", 'с' => "s", 'т' => "t", 'у' => "u",
            'ф' => "f", 'х' => "kh", 'ц' => "ts", 'ч' => "ch", 'ш' => "sh", 'щ' => "shch",
            'ь' => "", 'ю' => "iu", 'я' => "ia", '\'' | 'ʼ' | '’' => "",
            _ if ch.is_ascii() => {
                out.push(ch);
                continue;
            }
            _ => "?",
        };
        if ch != lower && !mapped.is_empty() {
            let mut chars = mapped.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(mapped);
        }
    }
    out
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let current_len = current.chars().count();
        if current_len + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
