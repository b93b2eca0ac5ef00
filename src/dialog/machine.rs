//! Transition table of the conversation state machine.
//!
//! `transition` is pure: it looks at the current state and one classified
//! input and returns the next state plus the side effect the engine must
//! run. It never touches storage, so every path is testable without I/O.

use super::input::{CallbackAction, Command, Input, MenuAction, SymptomChoice};
use super::state::DialogState;
use super::validation::{self, ValidationError};
use crate::models::{CheckinAnswers, NewMedication, ProfileField, ProfileValue};
use crate::triage::TriageRequest;

pub const SORE_THROAT_PRESET: &str = "Біль у горлі";

/// What the bot asks for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    CheckinMood,
    CheckinSleep,
    CheckinActivity,
    CheckinStress,
    CheckinWater,
    Note,
    ProfileField(ProfileField),
    MedName,
    MedDosage,
    MedSchedule,
    SymptomChoice,
    SymptomDescription,
    HeadacheType,
    HeadacheLocation,
    HeadacheAdditional,
}

/// Read-only screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Profile,
    Medications,
    History,
    EmergencyCard,
    Privacy,
    WomensHealth,
    IdleHint,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Nothing to do (stateless callbacks are handled outside the machine).
    None,
    Ask(Question),
    /// Input rejected; same question again.
    Reject(ValidationError, Question),
    Cancelled,
    Welcome,
    Show(View),
    GenerateReport,
    CommitCheckin(CheckinAnswers),
    SaveNote(String),
    SaveProfileField(ProfileField, ProfileValue),
    SaveMedication(NewMedication),
    /// Hand the symptom text to the AI. The engine picks the final state.
    Delegate(TriageRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: DialogState,
    pub effect: Effect,
}

impl Transition {
    fn to(next: DialogState, effect: Effect) -> Self {
        Self { next, effect }
    }

    fn stay(state: &DialogState, effect: Effect) -> Self {
        Self { next: state.clone(), effect }
    }
}

pub fn transition(state: &DialogState, input: &Input) -> Transition {
    match input {
        Input::Cancel => Transition::to(DialogState::Idle, Effect::Cancelled),
        Input::Command(Command::Start) => Transition::to(DialogState::Idle, Effect::Welcome),
        Input::Command(Command::Sos) => Transition::stay(state, Effect::Show(View::EmergencyCard)),
        Input::Command(Command::Privacy) => Transition::stay(state, Effect::Show(View::Privacy)),
        Input::Menu(action) => enter(*action),
        Input::Callback(action) => on_callback(state, *action),
        Input::Text(text) => on_text(state, text),
    }
}

/// Menu buttons start over regardless of where the user was.
fn enter(action: MenuAction) -> Transition {
    use DialogState as S;
    match action {
        MenuAction::SymptomChecker => Transition::to(S::SymptomCheckerStart, Effect::Ask(Question::SymptomChoice)),
        MenuAction::Checkin => Transition::to(S::CheckinMood, Effect::Ask(Question::CheckinMood)),
        MenuAction::QuickNote => Transition::to(S::WaitingForNote, Effect::Ask(Question::Note)),
        MenuAction::Profile => Transition::to(S::Idle, Effect::Show(View::Profile)),
        MenuAction::Medications => Transition::to(S::Idle, Effect::Show(View::Medications)),
        MenuAction::History => Transition::to(S::Idle, Effect::Show(View::History)),
        MenuAction::Report => Transition::to(S::Idle, Effect::GenerateReport),
        MenuAction::WomensHealth => Transition::to(S::Idle, Effect::Show(View::WomensHealth)),
    }
}

fn on_callback(state: &DialogState, action: CallbackAction) -> Transition {
    use DialogState as S;
    match action {
        CallbackAction::EditProfile(field) => {
            Transition::to(S::EditField(field), Effect::Ask(Question::ProfileField(field)))
        }
        CallbackAction::AddMedication => Transition::to(S::AddMedName, Effect::Ask(Question::MedName)),
        CallbackAction::Symptom(SymptomChoice::Headache) => {
            Transition::to(S::HeadacheType, Effect::Ask(Question::HeadacheType))
        }
        CallbackAction::Symptom(SymptomChoice::SoreThroat) => Transition::to(
            S::Idle,
            Effect::Delegate(TriageRequest::new(SORE_THROAT_PRESET)),
        ),
        CallbackAction::Symptom(SymptomChoice::Other) => {
            Transition::to(S::SymptomCheckerStart, Effect::Ask(Question::SymptomDescription))
        }
        CallbackAction::Privacy { .. }
        | CallbackAction::DeactivateMedication(_)
        | CallbackAction::MedicationLog { .. }
        | CallbackAction::Cycle(_) => Transition::stay(state, Effect::None),
    }
}

fn on_text(state: &DialogState, text: &str) -> Transition {
    use DialogState as S;

    // Advance with a validated answer, or stay and re-ask.
    fn step<T>(
        state: &DialogState,
        parsed: Result<T, ValidationError>,
        retry: Question,
        next: impl FnOnce(T) -> Transition,
    ) -> Transition {
        match parsed {
            Ok(value) => next(value),
            Err(err) => Transition::stay(state, Effect::Reject(err, retry)),
        }
    }

    let answer = validation::non_empty(text);

    match state {
        S::Idle => Transition::stay(state, Effect::Show(View::IdleHint)),

        S::CheckinMood => step(state, answer, Question::CheckinMood, |mood| {
            Transition::to(S::CheckinSleep { mood }, Effect::Ask(Question::CheckinSleep))
        }),
        S::CheckinSleep { mood } => step(state, answer, Question::CheckinSleep, |sleep| {
            Transition::to(
                S::CheckinActivity { mood: mood.clone(), sleep },
                Effect::Ask(Question::CheckinActivity),
            )
        }),
        S::CheckinActivity { mood, sleep } => step(state, answer, Question::CheckinActivity, |activity| {
            Transition::to(
                S::CheckinStress { mood: mood.clone(), sleep: sleep.clone(), activity },
                Effect::Ask(Question::CheckinStress),
            )
        }),
        S::CheckinStress { mood, sleep, activity } => {
            step(state, answer, Question::CheckinStress, |stress| {
                Transition::to(
                    S::CheckinWater {
                        mood: mood.clone(),
                        sleep: sleep.clone(),
                        activity: activity.clone(),
                        stress,
                    },
                    Effect::Ask(Question::CheckinWater),
                )
            })
        }
        S::CheckinWater { mood, sleep, activity, stress } => {
            step(state, answer, Question::CheckinWater, |water| {
                Transition::to(
                    S::Idle,
                    Effect::CommitCheckin(CheckinAnswers {
                        mood: mood.clone(),
                        sleep_quality: sleep.clone(),
                        activity_level: activity.clone(),
                        stress_level: stress.clone(),
                        water_intake: water,
                    }),
                )
            })
        }

        S::WaitingForNote => step(state, answer, Question::Note, |note| {
            Transition::to(S::Idle, Effect::SaveNote(note))
        }),

        S::EditField(field) => step(
            state,
            validation::validate_profile_value(*field, text),
            Question::ProfileField(*field),
            |value| Transition::to(S::Idle, Effect::SaveProfileField(*field, value)),
        ),

        S::AddMedName => step(state, answer, Question::MedName, |name| {
            Transition::to(S::AddMedDosage { name }, Effect::Ask(Question::MedDosage))
        }),
        S::AddMedDosage { name } => step(state, answer, Question::MedDosage, |dosage| {
            Transition::to(
                S::AddMedSchedule { name: name.clone(), dosage },
                Effect::Ask(Question::MedSchedule),
            )
        }),
        S::AddMedSchedule { name, dosage } => step(
            state,
            validation::validate_schedule(text),
            Question::MedSchedule,
            |schedule| {
                Transition::to(
                    S::Idle,
                    Effect::SaveMedication(NewMedication {
                        name: name.clone(),
                        dosage: dosage.clone(),
                        schedule,
                    }),
                )
            },
        ),

        S::SymptomCheckerStart => step(state, answer, Question::SymptomDescription, |symptoms| {
            Transition::to(S::Idle, Effect::Delegate(TriageRequest::new(&symptoms)))
        }),
        S::HeadacheType => step(state, answer, Question::HeadacheType, |kind| {
            Transition::to(S::HeadacheLocation { kind }, Effect::Ask(Question::HeadacheLocation))
        }),
        S::HeadacheLocation { kind } => step(state, answer, Question::HeadacheLocation, |location| {
            Transition::to(
                S::HeadacheAdditional { kind: kind.clone(), location },
                Effect::Ask(Question::HeadacheAdditional),
            )
        }),
        S::HeadacheAdditional { kind, location } => {
            step(state, answer, Question::HeadacheAdditional, |additional| {
                Transition::to(
                    S::Idle,
                    Effect::Delegate(TriageRequest::new(&headache_description(
                        kind, location, &additional,
                    ))),
                )
            })
        }

        S::AwaitingClarification { symptoms, round } => {
            step(state, answer, Question::SymptomDescription, |reply| {
                Transition::to(
                    S::Idle,
                    Effect::Delegate(TriageRequest {
                        symptoms: format!("{symptoms}\nУточнення: {reply}"),
                        round: round.saturating_add(1),
                    }),
                )
            })
        }
    }
}

/// One-line description assembled from the headache branch.
pub fn headache_description(kind: &str, location: &str, additional: &str) -> String {
    format!(
        "Головний біль. Характер болю: {kind}. Локалізація: {location}. Супутні симптоми: {additional}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileField;

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    fn run(mut state: DialogState, inputs: &[Input]) -> (DialogState, Vec<Effect>) {
        let mut effects = Vec::new();
        for input in inputs {
            let t = transition(&state, input);
            state = t.next;
            effects.push(t.effect);
        }
        (state, effects)
    }

    /// One representative of every non-idle state.
    fn non_idle_states() -> Vec<DialogState> {
        let s = |v: &str| v.to_string();
        let mut states = vec![
            DialogState::CheckinMood,
            DialogState::CheckinSleep { mood: s("m") },
            DialogState::CheckinActivity { mood: s("m"), sleep: s("s") },
            DialogState::CheckinStress { mood: s("m"), sleep: s("s"), activity: s("a") },
            DialogState::CheckinWater {
                mood: s("m"),
                sleep: s("s"),
                activity: s("a"),
                stress: s("st"),
            },
            DialogState::WaitingForNote,
            DialogState::AddMedName,
            DialogState::AddMedDosage { name: s("n") },
            DialogState::AddMedSchedule { name: s("n"), dosage: s("d") },
            DialogState::SymptomCheckerStart,
            DialogState::HeadacheType,
            DialogState::HeadacheLocation { kind: s("k") },
            DialogState::HeadacheAdditional { kind: s("k"), location: s("l") },
            DialogState::AwaitingClarification { symptoms: s("x"), round: 1 },
        ];
        states.extend(ProfileField::ALL.into_iter().map(DialogState::EditField));
        states
    }

    #[test]
    fn full_checkin_commits_five_answers() {
        let (state, effects) = run(
            DialogState::Idle,
            &[
                Input::Menu(MenuAction::Checkin),
                text("😊 Чудовий"),
                text("8 hours"),
                text("Висока"),
                text("Низький"),
                text("1-2 літри"),
            ],
        );
        assert!(state.is_idle());
        assert_eq!(
            effects.last().unwrap(),
            &Effect::CommitCheckin(CheckinAnswers {
                mood: "😊 Чудовий".into(),
                sleep_quality: "8 hours".into(),
                activity_level: "Висока".into(),
                stress_level: "Низький".into(),
                water_intake: "1-2 літри".into(),
            })
        );
        let commits = effects.iter().filter(|e| matches!(e, Effect::CommitCheckin(_))).count();
        assert_eq!(commits, 1);
    }

    #[test]
    fn cancel_from_any_state_returns_idle_without_commit() {
        for state in non_idle_states() {
            let t = transition(&state, &Input::Cancel);
            assert!(t.next.is_idle(), "{} did not reset", state.tag());
            assert_eq!(t.effect, Effect::Cancelled);
        }
    }

    #[test]
    fn menu_entry_discards_scratch() {
        let state = DialogState::CheckinWater {
            mood: "m".into(),
            sleep: "s".into(),
            activity: "a".into(),
            stress: "st".into(),
        };
        let t = transition(&state, &Input::Menu(MenuAction::Checkin));
        assert_eq!(t.next, DialogState::CheckinMood);

        let t = transition(&state, &Input::Menu(MenuAction::QuickNote));
        assert_eq!(t.next, DialogState::WaitingForNote);
    }

    #[test]
    fn invalid_numeric_profile_input_stays() {
        for field in [ProfileField::Age, ProfileField::WeightKg, ProfileField::HeightCm] {
            let state = DialogState::EditField(field);
            for bad in ["abc", "-5", ""] {
                let t = transition(&state, &text(bad));
                assert_eq!(t.next, state);
                assert!(matches!(t.effect, Effect::Reject(_, Question::ProfileField(f)) if f == field));
            }
        }
    }

    #[test]
    fn valid_profile_input_saves_and_returns_idle() {
        let t = transition(&DialogState::EditField(ProfileField::Gender), &text("жіноча"));
        assert!(t.next.is_idle());
        assert_eq!(
            t.effect,
            Effect::SaveProfileField(ProfileField::Gender, ProfileValue::Text("Жіноча".into()))
        );
    }

    #[test]
    fn medication_dialog_validates_schedule() {
        let (state, effects) = run(
            DialogState::Idle,
            &[
                Input::Callback(CallbackAction::AddMedication),
                text("Аспірин"),
                text("100 мг"),
                text("вранці"),
            ],
        );
        assert_eq!(
            state,
            DialogState::AddMedSchedule { name: "Аспірин".into(), dosage: "100 мг".into() }
        );
        assert!(matches!(
            effects.last(),
            Some(Effect::Reject(ValidationError::MalformedSchedule(_), Question::MedSchedule))
        ));

        let t = transition(&state, &text("09:00,21:00"));
        assert!(t.next.is_idle());
        assert_eq!(
            t.effect,
            Effect::SaveMedication(NewMedication {
                name: "Аспірин".into(),
                dosage: "100 мг".into(),
                schedule: "09:00, 21:00".into(),
            })
        );
    }

    #[test]
    fn empty_answer_is_rejected_in_checkin() {
        let state = DialogState::CheckinSleep { mood: "m".into() };
        let t = transition(&state, &text("   "));
        assert_eq!(t.next, state);
        assert_eq!(t.effect, Effect::Reject(ValidationError::Empty, Question::CheckinSleep));
    }

    #[test]
    fn headache_branch_composes_prompt() {
        let (state, effects) = run(
            DialogState::SymptomCheckerStart,
            &[
                Input::Callback(CallbackAction::Symptom(SymptomChoice::Headache)),
                text("Пульсуючий"),
                text("Скроні"),
                text("Нудота"),
            ],
        );
        assert!(state.is_idle());
        let Some(Effect::Delegate(req)) = effects.last() else {
            panic!("expected delegation, got {effects:?}");
        };
        assert_eq!(req.round, 0);
        assert!(req.symptoms.contains("Пульсуючий"));
        assert!(req.symptoms.contains("Скроні"));
        assert!(req.symptoms.contains("Нудота"));
    }

    #[test]
    fn free_text_symptoms_delegate_directly() {
        let t = transition(&DialogState::SymptomCheckerStart, &text("persistent headache for 3 days"));
        assert!(t.next.is_idle());
        assert_eq!(
            t.effect,
            Effect::Delegate(TriageRequest::new("persistent headache for 3 days"))
        );
    }

    #[test]
    fn sore_throat_delegates_preset() {
        let t = transition(
            &DialogState::Idle,
            &Input::Callback(CallbackAction::Symptom(SymptomChoice::SoreThroat)),
        );
        assert_eq!(t.effect, Effect::Delegate(TriageRequest::new(SORE_THROAT_PRESET)));
    }

    #[test]
    fn clarification_reply_concatenates_and_counts_round() {
        let state = DialogState::AwaitingClarification {
            symptoms: "persistent headache for 3 days".into(),
            round: 0,
        };
        let t = transition(&state, &text("так, зранку"));
        let Effect::Delegate(req) = t.effect else {
            panic!("expected delegation");
        };
        assert_eq!(req.round, 1);
        assert!(req.symptoms.starts_with("persistent headache for 3 days"));
        assert!(req.symptoms.ends_with("так, зранку"));
    }

    #[test]
    fn sos_keeps_dialog_position() {
        let state = DialogState::AddMedDosage { name: "n".into() };
        let t = transition(&state, &Input::Command(Command::Sos));
        assert_eq!(t.next, state);
        assert_eq!(t.effect, Effect::Show(View::EmergencyCard));
    }

    #[test]
    fn start_resets() {
        let t = transition(&DialogState::WaitingForNote, &Input::Command(Command::Start));
        assert!(t.next.is_idle());
        assert_eq!(t.effect, Effect::Welcome);
    }

    #[test]
    fn idle_text_gets_hint() {
        let t = transition(&DialogState::Idle, &text("привіт"));
        assert!(t.next.is_idle());
        assert_eq!(t.effect, Effect::Show(View::IdleHint));
    }
}
