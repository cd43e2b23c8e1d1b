//! Prompts sent to the model providers.

use serde_json::{json, Value};

use crate::models::{CaseData, NarrativeInput};

pub const OPENAI_SYSTEM_PROMPT: &str = "You are a medical assistant expert in neurodegenerative \
diseases (Huntington's disease). Always answer in strict JSON with the structure: \
{ \"diagnosis\": string, \"reasoning\": string, \"confidence\": string, \"recommendations\": string[] }";

const NOT_PERFORMED: &str = "Not performed";

/// Removes markdown code fences some models wrap around JSON.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn openai_user_prompt(data: &CaseData) -> String {
    format!(
        "Analyze this case:\n\
         - History: {}\n\
         - Triage: {}\n\
         - Labs: {}\n\
         - Neuro: {}",
        data.history, data.triage, data.labs, data.neuro
    )
}

pub fn gemini_prompt(data: &CaseData) -> String {
    format!(
        r#"Act as a specialist physician expert in neurology and genetics.
Analyze the following clinical case and provide a differential diagnosis, treatment suggestions and prognosis.

PATIENT DATA:
- Age/Sex: see profile.
- Clinical history: {}
- Triage: {}
- Laboratory tests: {}
- Neurological evaluation (UHDRS/MMSE): {}

Answer in valid JSON with the following structure (no markdown code blocks, only the raw JSON):
{{
  "diagnosis": "Main suggested diagnosis",
  "reasoning": "Brief explanation of how this conclusion is reached (max 50 words)",
  "confidence": "High/Medium/Low",
  "recommendations": ["Recommendation 1", "Recommendation 2"]
}}"#,
        data.history, data.triage, data.labs, data.neuro
    )
}

/// A recorded score, or "Not performed". The evaluation form stores a blank
/// score as 0, so 0 reads as not performed too.
fn score_text(score: Option<i32>) -> String {
    match score {
        Some(value) if value != 0 => value.to_string(),
        _ => NOT_PERFORMED.to_string(),
    }
}

fn details(info: &Option<Value>) -> String {
    info.clone().unwrap_or_else(|| json!({})).to_string()
}

fn genetic_section(input: &NarrativeInput) -> String {
    let Some(lab) = input.labs.iter().find(|lab| lab.is_genetic()) else {
        return "No genetic test available.".to_string();
    };

    format!(
        "Genetic test (Molecular Biology):
- Result: {}
- Laboratory note: {}
- Reference ranges (CAG repeats):
  < 27: Normal.
  27-35: 0% probability of disease, risk for offspring.
  36-39: Reduced penetrance (may develop in old age).
  40-55: High penetrance (disease will develop).
  >= 56: Juvenile HD (severe and progressive).",
        details(&lab.results_json),
        lab.result_text.as_deref().unwrap_or("Not specified"),
    )
}

/// Free-text prompt asking for a suggested diagnosis of a Huntington's case.
pub fn narrative_prompt(input: &NarrativeInput) -> String {
    let neuro = &input.neuro;
    let age = match input.age {
        Some(years) => format!("{} years", years),
        None => "age unknown".to_string(),
    };

    format!(
        "Act as a neurologist expert in Huntington's disease. Analyze the following clinical case and produce a detailed diagnostic suggestion.

PATIENT: {name} ({age})

CLINICAL DATA:
{genetic}

NEUROLOGICAL EVALUATION (UHDRS):
- Motor Score (0-124): {motor}
- Cognitive (MMSE, 0-35): {mmse}
  * Rule: MMSE <= 20 indicates cognitive degeneration.
  * Details: {mmse_info}
- Behavioral (PBA): {pba} points (cumulative severity).
  * Details: {pba_info}
- Functional Capacity (TFC): {tfc} points.
  * Stage scale:
    11-13: Stage I (marginal decline).
    7-10: Stage II (loses work capacity, needs light help).
    3-6: Stage III (unable to work, needs major help).
    1-2: Stage IV (major financial and domestic assistance).
    0: Stage V (full-time nursing care).

INSTRUCTIONS:
1. Assess the genetic risk from the CAG repeats (if available).
2. Correlate it with the motor, cognitive and functional status.
3. Determine the patient's functional stage.
4. Write a brief, professional \"Suggested Diagnosis\" (max 3 lines), taking the role of an expert Huntington's physician.",
        name = input.patient_name,
        age = age,
        genetic = genetic_section(input),
        motor = score_text(neuro.uhdrs_motor_score),
        mmse = score_text(neuro.mmse_score),
        mmse_info = details(&neuro.mmse_info),
        pba = score_text(neuro.pba_score),
        pba_info = details(&neuro.pba_info),
        tfc = score_text(neuro.fc_score),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinical_case_cell::models::{LabResult, NeurologyAssessment};

    fn lab(lab_type: &str, results: Value) -> LabResult {
        LabResult {
            id: None,
            case_id: "case-1".into(),
            lab_type: lab_type.into(),
            description: String::new(),
            results_json: Some(results),
            result_text: Some("Expanded allele".into()),
            analyzed_at: None,
            status: true,
            created_at: None,
        }
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn narrative_uses_the_first_genetic_lab() {
        let input = NarrativeInput {
            patient_name: "Luis Rojas".into(),
            age: Some(41),
            labs: vec![
                lab("Bioquímica y Hematología", json!({ "glucose": 90 })),
                lab("Genética y Biología Molecular", json!({ "cag_repeats": 43 })),
            ],
            neuro: NeurologyAssessment {
                uhdrs_motor_score: Some(38),
                mmse_score: Some(19),
                ..Default::default()
            },
        };

        let prompt = narrative_prompt(&input);
        assert!(prompt.contains("PATIENT: Luis Rojas (41 years)"));
        assert!(prompt.contains(r#"- Result: {"cag_repeats":43}"#));
        assert!(prompt.contains("- Laboratory note: Expanded allele"));
        assert!(!prompt.contains("glucose"));
        assert!(prompt.contains("Motor Score (0-124): 38"));
        assert!(prompt.contains("Cognitive (MMSE, 0-35): 19"));
        assert!(prompt.contains("Behavioral (PBA): Not performed points"));
    }

    #[test]
    fn narrative_without_genetics_says_so() {
        let prompt = narrative_prompt(&NarrativeInput {
            patient_name: "Ana Quispe".into(),
            ..Default::default()
        });

        assert!(prompt.contains("No genetic test available."));
        assert!(prompt.contains("(age unknown)"));
        assert!(prompt.contains("Functional Capacity (TFC): Not performed points"));
    }

    #[test]
    fn consult_prompts_embed_the_case_as_json() {
        let data = CaseData {
            history: json!({ "family_history": "Father with chorea" }),
            ..Default::default()
        };

        assert!(openai_user_prompt(&data)
            .contains(r#"- History: {"family_history":"Father with chorea"}"#));
        assert!(gemini_prompt(&data).contains("- Triage: null"));
    }
}
