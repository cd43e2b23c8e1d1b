//! Huntington's disease assessment forms.
//!
//! Each form is a fixed list of items scored as integers. A form's total is
//! the plain sum of whatever item scores were recorded; there is no
//! weighting and no server-side range validation. Free-entry items are
//! clamped into their range the same way the entry screen clamps them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Item key to recorded score.
pub type ScoreSet = BTreeMap<String, i32>;

/// Sum of all recorded item scores; an empty set totals 0. Saturates at the
/// `i32` bounds since fixed-choice scores are stored unchecked.
pub fn score_total(scores: &ScoreSet) -> i32 {
    scores.values().fold(0i32, |total, score| total.saturating_add(*score))
}

/// How an item's score is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// One of `0..=max`, picked from labelled options.
    FixedChoice,
    /// Typed number, clamped to `0..=max`.
    FreeEntry,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormItem {
    pub key: &'static str,
    pub label: &'static str,
    pub max: i32,
    /// Option labels for fixed-choice items, indexed by score.
    pub options: &'static [&'static str],
}

const fn item(key: &'static str, label: &'static str, options: &'static [&'static str]) -> FormItem {
    FormItem {
        key,
        label,
        max: options.len() as i32 - 1,
        options,
    }
}

const fn free(key: &'static str, label: &'static str, max: i32) -> FormItem {
    FormItem {
        key,
        label,
        max,
        options: &[],
    }
}

const SEVERITY: &[&str] = &["Normal", "Mild/doubtful", "Mild/clear", "Moderate", "Severe"];
const INVOLUNTARY: &[&str] = &[
    "Absent",
    "Slight/intermittent",
    "Mild/common",
    "Moderate/common",
    "Marked/prolonged",
];
const PURSUIT: &[&str] = &["Complete", "Jerky", "Interrupted", "Incomplete range", "Cannot"];
const SACCADE_INIT: &[&str] = &["Normal", "Increased latency", "Blinks", "Head movement", "Cannot"];
const SACCADE_VEL: &[&str] = &["Normal", "Mild slowing", "Moderate slowing", "Severe slowing", "Incomplete"];
const FINGER_TAPS: &[&str] = &[">=15", "11-14", "7-10", "3-6", "0-2"];
const RIGIDITY: &[&str] = &["Absent", "Slight/activation", "Mild to moderate", "Severe", "Limited range"];
const PBA_SCALE: &[&str] = &["Absent", "Slight", "Mild", "Moderate", "Severe"];

const MOTOR_ITEMS: &[FormItem] = &[
    item("ocular_pursuit_h", "Ocular pursuit, horizontal", PURSUIT),
    item("ocular_pursuit_v", "Ocular pursuit, vertical", PURSUIT),
    item("saccade_init_h", "Saccade initiation, horizontal", SACCADE_INIT),
    item("saccade_init_v", "Saccade initiation, vertical", SACCADE_INIT),
    item("saccade_vel_h", "Saccade velocity, horizontal", SACCADE_VEL),
    item("saccade_vel_v", "Saccade velocity, vertical", SACCADE_VEL),
    item(
        "dysarthria",
        "Dysarthria",
        &["Normal", "Unclear", "Must repeat", "Mostly incomprehensible", "Mute"],
    ),
    item(
        "tongue_protrusion",
        "Tongue protrusion",
        &["10s", "<10s", "<5s", "Partial", "Cannot protrude"],
    ),
    item("dystonia_trunk", "Maximal dystonia, trunk", INVOLUNTARY),
    item("dystonia_rue", "Maximal dystonia, right arm", INVOLUNTARY),
    item("dystonia_lue", "Maximal dystonia, left arm", INVOLUNTARY),
    item("dystonia_rle", "Maximal dystonia, right leg", INVOLUNTARY),
    item("dystonia_lle", "Maximal dystonia, left leg", INVOLUNTARY),
    item("chorea_face", "Maximal chorea, face", INVOLUNTARY),
    item("chorea_bol", "Maximal chorea, mouth and tongue", INVOLUNTARY),
    item("chorea_trunk", "Maximal chorea, trunk", INVOLUNTARY),
    item("chorea_rue", "Maximal chorea, right arm", INVOLUNTARY),
    item("chorea_lue", "Maximal chorea, left arm", INVOLUNTARY),
    item("chorea_rle", "Maximal chorea, right leg", INVOLUNTARY),
    item("chorea_lle", "Maximal chorea, left leg", INVOLUNTARY),
    item(
        "gait",
        "Gait",
        &["Normal", "Wide base", "Difficulty", "Needs assistance", "Cannot walk"],
    ),
    item(
        "tandem",
        "Tandem walking (10 steps)",
        &["Normal", "1-3 deviations", ">3 deviations", "Cannot complete", "Cannot attempt"],
    ),
    item(
        "retropulsion",
        "Retropulsion pull test",
        &["Normal", "Recovers", "Would fall", "Falls", "Cannot stand"],
    ),
    item("finger_taps_r", "Finger taps, right", FINGER_TAPS),
    item("finger_taps_l", "Finger taps, left", FINGER_TAPS),
    item("pro_sup_r", "Pronate/supinate hands, right", SEVERITY),
    item("pro_sup_l", "Pronate/supinate hands, left", SEVERITY),
    item(
        "luria",
        "Luria fist-hand-palm",
        &[">=4 in 10s", "<4 in 10s", ">=4 with cues", "<4 with cues", "Cannot"],
    ),
    item("rigidity_r", "Rigidity, right arm", RIGIDITY),
    item("rigidity_l", "Rigidity, left arm", RIGIDITY),
    item(
        "bradykinesia",
        "Body bradykinesia",
        &["Normal", "Minimal", "Mild", "Moderate", "Marked"],
    ),
];

const MMSE_ITEMS: &[FormItem] = &[
    free("ori_time", "Orientation to time", 5),
    free("ori_space", "Orientation to place", 5),
    free("registration", "Registration of three words", 3),
    free("recall", "Delayed recall of three words", 3),
    free("serial7", "Serial subtractions", 5),
    free("digits_back", "Digits backwards", 3),
    free("naming", "Naming", 2),
    free("repetition", "Sentence repetition", 1),
    free("abstraction", "Abstraction", 2),
    free("command3", "Three-stage command", 3),
    free("reading", "Reading and obeying", 1),
    free("writing", "Writing a sentence", 1),
    free("copying", "Copying a drawing", 1),
];

const PBA_ITEMS: &[FormItem] = &[
    item("sad_mood", "Depressed mood", PBA_SCALE),
    item("guilt", "Low self-esteem / guilt", PBA_SCALE),
    item("anxiety", "Anxiety", PBA_SCALE),
    item("suicidal", "Suicidal ideation", PBA_SCALE),
    item("aggressive", "Aggressive behaviour", PBA_SCALE),
    item("irritable", "Irritable behaviour", PBA_SCALE),
    item("obsessions", "Obsessions", PBA_SCALE),
    item("compulsions", "Compulsions", PBA_SCALE),
    item("delusions", "Delusions", PBA_SCALE),
    item("hallucinations", "Hallucinations", PBA_SCALE),
];

const TFC_ITEMS: &[FormItem] = &[
    item("occupation", "Occupation", &["Unable", "Marginal work only", "Reduced capacity", "Normal"]),
    item(
        "finances",
        "Finances",
        &["Unable", "Major assistance", "Slight assistance", "Normal"],
    ),
    item("chores", "Domestic chores", &["Unable", "Impaired", "Normal"]),
    item(
        "adl",
        "Activities of daily living",
        &["Total care", "Gross tasks only", "Minimal impairment", "Normal"],
    ),
    item(
        "care_level",
        "Care level",
        &["Full-time skilled nursing", "Home or chronic care", "Home"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentForm {
    Motor,
    Cognitive,
    Behavioral,
    Functional,
}

impl AssessmentForm {
    pub const ALL: [AssessmentForm; 4] = [
        AssessmentForm::Motor,
        AssessmentForm::Cognitive,
        AssessmentForm::Behavioral,
        AssessmentForm::Functional,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|form| form.slug() == slug)
    }

    pub fn slug(self) -> &'static str {
        match self {
            AssessmentForm::Motor => "motor",
            AssessmentForm::Cognitive => "cognitive",
            AssessmentForm::Behavioral => "behavioral",
            AssessmentForm::Functional => "functional",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AssessmentForm::Motor => "UHDRS Motor Assessment",
            AssessmentForm::Cognitive => "MMSE Cognitive Assessment",
            AssessmentForm::Behavioral => "PBA Behavioral Assessment",
            AssessmentForm::Functional => "Total Functional Capacity",
        }
    }

    pub fn items(self) -> &'static [FormItem] {
        match self {
            AssessmentForm::Motor => MOTOR_ITEMS,
            AssessmentForm::Cognitive => MMSE_ITEMS,
            AssessmentForm::Behavioral => PBA_ITEMS,
            AssessmentForm::Functional => TFC_ITEMS,
        }
    }

    pub fn entry(self) -> EntryKind {
        match self {
            AssessmentForm::Cognitive => EntryKind::FreeEntry,
            _ => EntryKind::FixedChoice,
        }
    }

    /// Maximum shown next to the running total. The behavioural form shows none.
    pub fn display_max(self) -> Option<i32> {
        match self {
            AssessmentForm::Motor => Some(124),
            AssessmentForm::Cognitive => Some(35),
            AssessmentForm::Behavioral => None,
            AssessmentForm::Functional => Some(13),
        }
    }

    /// `neurology_assessments` column holding the item scores.
    pub fn info_column(self) -> &'static str {
        match self {
            AssessmentForm::Motor => "uhdrs_motor_info",
            AssessmentForm::Cognitive => "mmse_info",
            AssessmentForm::Behavioral => "pba_info",
            AssessmentForm::Functional => "fc_info",
        }
    }

    /// `neurology_assessments` column holding the total.
    pub fn score_column(self) -> &'static str {
        match self {
            AssessmentForm::Motor => "uhdrs_motor_score",
            AssessmentForm::Cognitive => "mmse_score",
            AssessmentForm::Behavioral => "pba_score",
            AssessmentForm::Functional => "fc_score",
        }
    }

    /// Applies the entry rules to submitted scores. Free-entry items are
    /// clamped to their range; everything else, including keys the form
    /// does not define, is kept as submitted.
    pub fn normalize(self, scores: ScoreSet) -> ScoreSet {
        if self.entry() != EntryKind::FreeEntry {
            return scores;
        }

        scores
            .into_iter()
            .map(|(key, value)| {
                let value = match self.items().iter().find(|i| i.key == key) {
                    Some(item) => value.clamp(0, item.max),
                    None => value,
                };
                (key, value)
            })
            .collect()
    }

    pub fn definition(self) -> FormDefinition {
        FormDefinition {
            form: self,
            title: self.title(),
            entry: self.entry(),
            display_max: self.display_max(),
            items: self.items(),
        }
    }
}

impl fmt::Display for AssessmentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormDefinition {
    pub form: AssessmentForm,
    pub title: &'static str,
    pub entry: EntryKind,
    pub display_max: Option<i32>,
    pub items: &'static [FormItem],
}

/// Shoulson-Fahn stage derived from the Total Functional Capacity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionalStage {
    I,
    II,
    III,
    IV,
    V,
}

impl FunctionalStage {
    pub fn from_tfc(total: i32) -> Self {
        match total {
            t if t >= 11 => FunctionalStage::I,
            7..=10 => FunctionalStage::II,
            3..=6 => FunctionalStage::III,
            1..=2 => FunctionalStage::IV,
            _ => FunctionalStage::V,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FunctionalStage::I => "Marginal decline",
            FunctionalStage::II => "Loses work capacity, needs light help",
            FunctionalStage::III => "Unable to work, needs major help",
            FunctionalStage::IV => "Needs major financial and domestic assistance",
            FunctionalStage::V => "Full-time nursing care",
        }
    }
}

impl fmt::Display for FunctionalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numeral = match self {
            FunctionalStage::I => "I",
            FunctionalStage::II => "II",
            FunctionalStage::III => "III",
            FunctionalStage::IV => "IV",
            FunctionalStage::V => "V",
        };
        write!(f, "Stage {}", numeral)
    }
}

/// MMSE at or below 20 indicates cognitive degeneration.
pub fn cognitive_decline(mmse: i32) -> bool {
    mmse <= 20
}
